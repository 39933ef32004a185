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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One administrative action. Append-only, never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditLogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub actor_id: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub details: serde_json::Value,
    pub ip_address: String,
}

impl AuditLogEntry {
    pub fn new(
        action: impl Into<String>,
        actor_id: impl Into<String>,
        resource_type: impl Into<String>,
        resource_id: Option<String>,
        details: serde_json::Value,
        ip_address: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            action: action.into(),
            actor_id: actor_id.into(),
            resource_type: resource_type.into(),
            resource_id,
            details,
            ip_address: ip_address.into(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut missing = Vec::new();
        if self.action.is_empty() {
            missing.push("action");
        }
        if self.resource_type.is_empty() {
            missing.push("resourceType");
        }
        if !missing.is_empty() {
            return Err(format!("Missing required fields: {}", missing.join(", ")));
        }
        Ok(())
    }
}
