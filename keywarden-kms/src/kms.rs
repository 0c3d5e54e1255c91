//! Service interfaces consumed by key recovery
//!
//! Two collaborators are modelled as traits so the recovery procedure can be
//! driven by different backends:
//! - AWS KMS and AWS Backup (see [`crate::aws`])
//! - In-memory services for tests and local runs (see [`crate::memory`])
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


use crate::error::KeyResult;
use crate::key_types::{
    BackupJobQuery, BackupJobSummary, KeyStatus, RestoreJobReceipt, RestoreRequest,
};
use async_trait::async_trait;

/// Trait for Key Management Service backends
#[async_trait]
pub trait KeyManagementService: Send + Sync {
    /// Get the current lifecycle state of a key
    async fn describe_key(&self, key_id: &str) -> KeyResult<KeyStatus>;

    /// Enable a disabled key
    async fn enable_key(&self, key_id: &str) -> KeyResult<()>;

    /// Cancel a scheduled key deletion
    ///
    /// The key is left `Disabled`, not `Enabled`.
    async fn cancel_key_deletion(&self, key_id: &str) -> KeyResult<()>;
}

/// Trait for backup/restore service backends
#[async_trait]
pub trait BackupService: Send + Sync {
    /// List backup jobs matching a query, most recent first
    async fn list_recent_backup_jobs(
        &self,
        query: &BackupJobQuery,
    ) -> KeyResult<Vec<BackupJobSummary>>;

    /// Submit a restore job; completion is not awaited
    async fn start_restore_job(&self, request: &RestoreRequest) -> KeyResult<RestoreJobReceipt>;
}
