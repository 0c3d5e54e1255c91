//! Key recovery decision procedure
//!
//! Reads the key state once, then either reports it, stops at the
//! production gate, or attempts a best-effort backup restore followed by
//! re-enabling the key.
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


use crate::schemas::ResultRecord;
use keywarden_config::{RecoveryConfig, PRODUCTION_ENVIRONMENT};
use keywarden_kms::{
    BackupJobQuery, BackupService, KeyManagementService, KeyResult, KeyState, RestoreRequest,
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// The key to watch and the context it lives in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryTarget {
    pub key_id: String,
    pub backup_vault_name: Option<String>,
    pub environment: String,
    pub restore_iam_role_arn: Option<String>,
}

impl RecoveryTarget {
    pub fn new(
        key_id: impl Into<String>,
        backup_vault_name: Option<&str>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            key_id: key_id.into(),
            backup_vault_name: backup_vault_name.map(str::to_string),
            environment: environment.into(),
            restore_iam_role_arn: None,
        }
    }

    pub fn from_config(config: &RecoveryConfig) -> Self {
        Self {
            key_id: config.kms_key_id.clone(),
            backup_vault_name: config.backup_vault_name.clone(),
            environment: config.environment.clone(),
            restore_iam_role_arn: config.restore_iam_role_arn.clone(),
        }
    }

    pub fn with_restore_role(mut self, iam_role_arn: impl Into<String>) -> Self {
        self.restore_iam_role_arn = Some(iam_role_arn.into());
        self
    }

    pub fn is_production(&self) -> bool {
        self.environment == PRODUCTION_ENVIRONMENT
    }

    /// Vault name, if backup integration is configured; blank means none
    pub fn backup_vault(&self) -> Option<&str> {
        self.backup_vault_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }
}

/// What happened on the backup side of a recovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupRestoreOutcome {
    /// No vault configured
    NotConfigured,
    /// Vault configured, but no job with a recovery point
    NoBackupAvailable,
    /// Restore submitted; completion is not awaited
    Started {
        restore_job_id: String,
        recovery_point_arn: String,
    },
    /// Lookup or submission failed
    Failed(String),
}

/// Runs the recovery procedure against injected services
pub struct KeyRecovery {
    kms: Arc<dyn KeyManagementService>,
    backup: Arc<dyn BackupService>,
}

impl KeyRecovery {
    pub fn new(kms: Arc<dyn KeyManagementService>, backup: Arc<dyn BackupService>) -> Self {
        Self { kms, backup }
    }

    /// Check the key and recover it if needed
    ///
    /// Always produces exactly one result record; service faults become a
    /// 500 record instead of an error.
    pub async fn recover(&self, target: &RecoveryTarget) -> ResultRecord {
        let key_id = target.key_id.as_str();

        let status = match self.kms.describe_key(key_id).await {
            Ok(status) => status,
            Err(e) => {
                error!(key_id = key_id, error = %e, "Failed to describe key");
                return ResultRecord::failure(key_id, &e);
            }
        };

        info!(key_id = key_id, key_state = %status.state, "Key state");

        if !status.state.requires_recovery() {
            return ResultRecord::healthy(key_id, &status.state);
        }

        if target.is_production() {
            info!(
                key_id = key_id,
                key_state = %status.state,
                "Production environment: manual approval required"
            );
            return ResultRecord::approval_required(key_id, &status.state);
        }

        match self.remediate(target, &status.state).await {
            Ok(backup) => {
                info!(
                    key_id = key_id,
                    original_state = %status.state,
                    backup = ?backup,
                    "Key recovery completed"
                );
                ResultRecord::recovered(key_id, &status.state)
            }
            Err(e) => {
                error!(key_id = key_id, error = %e, "Key recovery failed");
                ResultRecord::failure(key_id, &e)
            }
        }
    }

    async fn remediate(
        &self,
        target: &RecoveryTarget,
        state: &KeyState,
    ) -> KeyResult<BackupRestoreOutcome> {
        let key_id = target.key_id.as_str();
        let backup = self.restore_from_backup(target).await;

        match state {
            KeyState::Disabled => {
                self.kms.enable_key(key_id).await?;
                info!(key_id = key_id, "Key re-enabled");
            }
            KeyState::PendingDeletion => {
                // Cancelling leaves the key Disabled
                self.kms.cancel_key_deletion(key_id).await?;
                self.kms.enable_key(key_id).await?;
                info!(key_id = key_id, "Key deletion cancelled and key re-enabled");
            }
            // Unreachable: recover() only remediates states that require recovery
            _ => {}
        }

        Ok(backup)
    }

    /// Submit a restore of the latest backup of the key, if there is one
    ///
    /// Never fails: problems are logged and reported in the outcome.
    pub async fn restore_from_backup(&self, target: &RecoveryTarget) -> BackupRestoreOutcome {
        let Some(vault_name) = target.backup_vault() else {
            return BackupRestoreOutcome::NotConfigured;
        };
        let key_id = target.key_id.as_str();

        let query = BackupJobQuery::latest_for_key(key_id, vault_name);
        let jobs = match self.backup.list_recent_backup_jobs(&query).await {
            Ok(jobs) => jobs,
            Err(e) => {
                error!(key_id = key_id, vault_name = vault_name, error = %e, "Backup lookup failed");
                return BackupRestoreOutcome::Failed(e.to_string());
            }
        };

        let Some(recovery_point_arn) = jobs.into_iter().next().and_then(|job| job.recovery_point_arn)
        else {
            warn!(key_id = key_id, vault_name = vault_name, "No usable backup found");
            return BackupRestoreOutcome::NoBackupAvailable;
        };

        let request = RestoreRequest::for_key(vault_name, &recovery_point_arn)
            .with_iam_role(target.restore_iam_role_arn.clone());

        match self.backup.start_restore_job(&request).await {
            Ok(receipt) => {
                info!(
                    key_id = key_id,
                    restore_job_id = %receipt.restore_job_id,
                    recovery_point_arn = %recovery_point_arn,
                    "Restore job started"
                );
                BackupRestoreOutcome::Started {
                    restore_job_id: receipt.restore_job_id,
                    recovery_point_arn,
                }
            }
            Err(e) => {
                error!(key_id = key_id, error = %e, "Failed to start restore job");
                BackupRestoreOutcome::Failed(e.to_string())
            }
        }
    }
}
