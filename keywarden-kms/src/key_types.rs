//! Key and backup type definitions
// Copyright 2025 Francisco F. Pinochet
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Unique identifier for a key (key id, alias or ARN)
pub type KeyId = String;

/// Resource type the backup service uses for KMS keys
pub const KMS_RESOURCE_TYPE: &str = "KMS";

/// Lifecycle state of a key as reported by the key-management service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum KeyState {
    Enabled,
    Disabled,
    PendingDeletion,
    /// Any other state (`PendingImport`, `Unavailable`, `Creating`, ...)
    Other(String),
}

impl KeyState {
    pub fn as_str(&self) -> &str {
        match self {
            KeyState::Enabled => "Enabled",
            KeyState::Disabled => "Disabled",
            KeyState::PendingDeletion => "PendingDeletion",
            KeyState::Other(state) => state,
        }
    }

    /// Whether this state can be brought back to `Enabled` by this function
    pub fn requires_recovery(&self) -> bool {
        matches!(self, KeyState::Disabled | KeyState::PendingDeletion)
    }
}

impl From<&str> for KeyState {
    fn from(value: &str) -> Self {
        match value {
            "Enabled" => KeyState::Enabled,
            "Disabled" => KeyState::Disabled,
            "PendingDeletion" => KeyState::PendingDeletion,
            other => KeyState::Other(other.to_string()),
        }
    }
}

impl From<String> for KeyState {
    fn from(value: String) -> Self {
        KeyState::from(value.as_str())
    }
}

impl From<KeyState> for String {
    fn from(value: KeyState) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for KeyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current status of a key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyStatus {
    pub key_id: KeyId,
    pub state: KeyState,
}

impl KeyStatus {
    pub fn new(key_id: impl Into<KeyId>, state: KeyState) -> Self {
        Self {
            key_id: key_id.into(),
            state,
        }
    }
}

/// Filter for looking up backup jobs of a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupJobQuery {
    pub resource_type: String,
    pub resource_id: String,
    pub vault_name: String,
    pub max_results: i32,
}

impl BackupJobQuery {
    /// Most recent backup job of a KMS key in a vault
    pub fn latest_for_key(key_id: &str, vault_name: &str) -> Self {
        Self {
            resource_type: KMS_RESOURCE_TYPE.to_string(),
            resource_id: key_id.to_string(),
            vault_name: vault_name.to_string(),
            max_results: 1,
        }
    }
}

/// Summary of a backup job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupJobSummary {
    pub job_id: String,
    /// Absent while the job has not produced a recovery point yet
    pub recovery_point_arn: Option<String>,
}

/// Request to restore a resource from a recovery point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreRequest {
    pub vault_name: String,
    pub recovery_point_arn: String,
    pub resource_type: String,
    pub iam_role_arn: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl RestoreRequest {
    pub fn for_key(vault_name: &str, recovery_point_arn: &str) -> Self {
        Self {
            vault_name: vault_name.to_string(),
            recovery_point_arn: recovery_point_arn.to_string(),
            resource_type: KMS_RESOURCE_TYPE.to_string(),
            iam_role_arn: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_iam_role(mut self, iam_role_arn: Option<String>) -> Self {
        self.iam_role_arn = iam_role_arn;
        self
    }
}

/// Acknowledgement of a submitted restore job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreJobReceipt {
    pub restore_job_id: String,
}
