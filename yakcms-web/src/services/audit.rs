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

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::Mutex;
use yakcms_core::error::CmsError;
use yakcms_core::models::audit::AuditLogEntry;
use yakcms_db::AuditLogRepository;

/// Buffered audit writer. Entries accumulate in memory and are written to
/// the database in batches, either when the buffer reaches its threshold
/// or on the periodic flush tick.
///
/// Delivery is at-least-once: a failed batch is pushed back into the
/// buffer and retried on the next flush.
pub struct AuditLogger {
    repository: AuditLogRepository,
    buffer: Mutex<Vec<AuditLogEntry>>,
    flush_threshold: usize,
}

impl AuditLogger {
    pub fn new(pool: SqlitePool, flush_threshold: usize) -> Self {
        Self {
            repository: AuditLogRepository::new(pool),
            buffer: Mutex::new(Vec::new()),
            flush_threshold: flush_threshold.max(1),
        }
    }

    /// Validate and buffer one entry, flushing if the threshold is reached.
    /// A failed flush is logged and retried later, never surfaced to the
    /// request that tipped the buffer over.
    pub async fn record(&self, entry: AuditLogEntry) -> Result<()> {
        entry.validate().map_err(CmsError::validation)?;

        let should_flush = {
            let mut buffer = self.buffer.lock().await;
            buffer.push(entry);
            buffer.len() >= self.flush_threshold
        };

        if should_flush {
            if let Err(e) = self.flush().await {
                tracing::warn!("Threshold audit flush failed, will retry: {:?}", e);
            }
        }
        Ok(())
    }

    /// Write all buffered entries in one transaction. Returns the number
    /// of entries written.
    pub async fn flush(&self) -> Result<usize> {
        let batch: Vec<AuditLogEntry> = {
            let mut buffer = self.buffer.lock().await;
            buffer.drain(..).collect()
        };
        if batch.is_empty() {
            return Ok(0);
        }

        let count = batch.len();
        if let Err(e) = self
            .repository
            .insert_batch(&batch)
            .await
            .context("Failed to flush audit log buffer")
        {
            // Put the batch back ahead of anything recorded meanwhile
            let mut buffer = self.buffer.lock().await;
            let newer = std::mem::replace(&mut *buffer, batch);
            buffer.extend(newer);
            return Err(e);
        }

        tracing::debug!(count, "Flushed audit log entries");
        Ok(count)
    }

    pub async fn pending(&self) -> usize {
        self.buffer.lock().await.len()
    }

    /// Spawn the periodic flush task. Runs until the process exits.
    pub fn spawn_flush_task(self: &Arc<Self>, interval_secs: u64) -> tokio::task::JoinHandle<()> {
        let logger = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval(std::time::Duration::from_secs(interval_secs.max(1)));
            // The first tick fires immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = logger.flush().await {
                    tracing::warn!("Periodic audit flush failed: {:?}", e);
                }
            }
        })
    }
}
