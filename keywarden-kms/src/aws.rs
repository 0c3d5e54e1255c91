//! AWS KMS and AWS Backup implementations of the service traits
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


use crate::error::{KeyError, KeyResult};
use crate::key_types::{
    BackupJobQuery, BackupJobSummary, KeyState, KeyStatus, RestoreJobReceipt, RestoreRequest,
};
use crate::kms::{BackupService, KeyManagementService};
use async_trait::async_trait;
use aws_sdk_kms::error::DisplayErrorContext;
use tracing::debug;

/// Key management backed by AWS KMS
#[derive(Clone, Debug)]
pub struct AwsKeyManagement {
    client: aws_sdk_kms::Client,
}

impl AwsKeyManagement {
    pub fn new(client: aws_sdk_kms::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl KeyManagementService for AwsKeyManagement {
    async fn describe_key(&self, key_id: &str) -> KeyResult<KeyStatus> {
        let output = self
            .client
            .describe_key()
            .key_id(key_id)
            .send()
            .await
            .map_err(|e| KeyError::Kms(format!("DescribeKey failed: {}", DisplayErrorContext(&e))))?;

        let state = output
            .key_metadata()
            .and_then(|metadata| metadata.key_state())
            .map(|state| KeyState::from(state.as_str()))
            .ok_or_else(|| {
                KeyError::InvalidResponse(format!("DescribeKey returned no key state for {}", key_id))
            })?;

        debug!(key_id = key_id, key_state = %state, "Described key");
        Ok(KeyStatus::new(key_id, state))
    }

    async fn enable_key(&self, key_id: &str) -> KeyResult<()> {
        self.client
            .enable_key()
            .key_id(key_id)
            .send()
            .await
            .map_err(|e| KeyError::Kms(format!("EnableKey failed: {}", DisplayErrorContext(&e))))?;
        Ok(())
    }

    async fn cancel_key_deletion(&self, key_id: &str) -> KeyResult<()> {
        self.client
            .cancel_key_deletion()
            .key_id(key_id)
            .send()
            .await
            .map_err(|e| {
                KeyError::Kms(format!("CancelKeyDeletion failed: {}", DisplayErrorContext(&e)))
            })?;
        Ok(())
    }
}

/// Backup and restore backed by AWS Backup
#[derive(Clone, Debug)]
pub struct AwsBackupService {
    client: aws_sdk_backup::Client,
}

impl AwsBackupService {
    pub fn new(client: aws_sdk_backup::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BackupService for AwsBackupService {
    async fn list_recent_backup_jobs(
        &self,
        query: &BackupJobQuery,
    ) -> KeyResult<Vec<BackupJobSummary>> {
        // ListBackupJobs filters by resource ARN; key ids are passed through as-is
        let output = self
            .client
            .list_backup_jobs()
            .by_resource_type(&query.resource_type)
            .by_resource_arn(&query.resource_id)
            .by_backup_vault_name(&query.vault_name)
            .max_results(query.max_results)
            .send()
            .await
            .map_err(|e| {
                KeyError::Backup(format!("ListBackupJobs failed: {}", DisplayErrorContext(&e)))
            })?;

        Ok(output
            .backup_jobs()
            .iter()
            .map(|job| BackupJobSummary {
                job_id: job.backup_job_id().unwrap_or_default().to_string(),
                recovery_point_arn: job.recovery_point_arn().map(str::to_string),
            })
            .collect())
    }

    async fn start_restore_job(&self, request: &RestoreRequest) -> KeyResult<RestoreJobReceipt> {
        // The vault is implied by the recovery point ARN
        debug!(
            vault_name = %request.vault_name,
            recovery_point_arn = %request.recovery_point_arn,
            "Submitting restore job"
        );

        let output = self
            .client
            .start_restore_job()
            .recovery_point_arn(&request.recovery_point_arn)
            .resource_type(&request.resource_type)
            .set_iam_role_arn(request.iam_role_arn.clone())
            .set_metadata(Some(request.metadata.clone()))
            .send()
            .await
            .map_err(|e| {
                KeyError::Backup(format!("StartRestoreJob failed: {}", DisplayErrorContext(&e)))
            })?;

        let restore_job_id = output
            .restore_job_id()
            .ok_or_else(|| {
                KeyError::InvalidResponse("StartRestoreJob returned no restore job id".to_string())
            })?
            .to_string();

        Ok(RestoreJobReceipt { restore_job_id })
    }
}
