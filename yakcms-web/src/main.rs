// YakCMS - A content management backend built with Rust
// Copyright (C) 2025 YakCMS Project Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use anyhow::Result;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yakcms_db::init_database;
use yakcms_web::{routes, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yakcms_web=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!("Starting YakCMS server");

    info!("Initializing database: {}", config.database_url);
    let db = init_database(&config.database_url).await?;

    for dir in [
        &config.content_dir,
        &config.media_dir,
        &config.config_dir,
        &config.backup_dir,
    ] {
        std::fs::create_dir_all(dir)?;
    }
    info!("Content directory: {}", config.content_dir);
    info!("Media directory: {}", config.media_dir);

    let state = AppState::new(db, config.clone());
    // Detached; flushes the audit buffer for the life of the process
    let _audit_flush = state
        .audit
        .spawn_flush_task(config.audit_flush_interval_secs);

    let app = routes::create_router(state);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
