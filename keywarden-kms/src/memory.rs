//! In-memory key management and backup services
//!
//! Both services can share a [`CallJournal`] so callers can assert on the
//! exact order of calls across services. Individual operations can be made
//! to fail with [`FailPoint`].
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
    BackupJobQuery, BackupJobSummary, KeyId, KeyState, KeyStatus, RestoreJobReceipt,
    RestoreRequest,
};
use crate::kms::{BackupService, KeyManagementService};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// A call made against one of the in-memory services
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCall {
    DescribeKey(KeyId),
    EnableKey(KeyId),
    CancelKeyDeletion(KeyId),
    ListBackupJobs(BackupJobQuery),
    StartRestoreJob(RestoreRequest),
}

impl ServiceCall {
    /// Whether the call changes state on the remote side
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            ServiceCall::EnableKey(_)
                | ServiceCall::CancelKeyDeletion(_)
                | ServiceCall::StartRestoreJob(_)
        )
    }
}

/// Operation that can be forced to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    DescribeKey,
    EnableKey,
    CancelKeyDeletion,
    ListBackupJobs,
    StartRestoreJob,
}

/// Ordered record of calls, shareable between services
#[derive(Debug, Clone, Default)]
pub struct CallJournal {
    calls: Arc<Mutex<Vec<ServiceCall>>>,
}

impl CallJournal {
    pub fn new() -> Self {
        Self::default()
    }

    async fn record(&self, call: ServiceCall) {
        self.calls.lock().await.push(call);
    }

    /// All calls in the order they were made
    pub async fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().await.clone()
    }

    /// Only the state-changing calls
    pub async fn mutations(&self) -> Vec<ServiceCall> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| call.is_mutation())
            .cloned()
            .collect()
    }

    pub async fn clear(&self) {
        self.calls.lock().await.clear();
    }
}

fn injected(point: FailPoint) -> String {
    format!("injected failure: {:?}", point)
}

/// In-memory key management service
///
/// State transitions follow KMS: enabling only works on `Disabled` or
/// `Enabled` keys, and cancelling a deletion leaves the key `Disabled`.
#[derive(Debug, Default)]
pub struct InMemoryKeyManagement {
    keys: RwLock<HashMap<KeyId, KeyState>>,
    failures: RwLock<HashSet<FailPoint>>,
    journal: CallJournal,
}

impl InMemoryKeyManagement {
    pub fn new(journal: CallJournal) -> Self {
        Self {
            journal,
            ..Self::default()
        }
    }

    /// Register a key in the given state
    pub fn with_key(mut self, key_id: impl Into<KeyId>, state: KeyState) -> Self {
        self.keys.get_mut().insert(key_id.into(), state);
        self
    }

    /// Make an operation fail until cleared
    pub fn failing(mut self, point: FailPoint) -> Self {
        self.failures.get_mut().insert(point);
        self
    }

    pub async fn set_failure(&self, point: FailPoint, enabled: bool) {
        let mut failures = self.failures.write().await;
        if enabled {
            failures.insert(point);
        } else {
            failures.remove(&point);
        }
    }

    /// Current state of a key
    pub async fn state(&self, key_id: &str) -> Option<KeyState> {
        self.keys.read().await.get(key_id).cloned()
    }

    pub fn journal(&self) -> &CallJournal {
        &self.journal
    }

    async fn check(&self, point: FailPoint) -> KeyResult<()> {
        if self.failures.read().await.contains(&point) {
            return Err(KeyError::Kms(injected(point)));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyManagementService for InMemoryKeyManagement {
    async fn describe_key(&self, key_id: &str) -> KeyResult<KeyStatus> {
        self.journal.record(ServiceCall::DescribeKey(key_id.to_string())).await;
        self.check(FailPoint::DescribeKey).await?;

        let state = self
            .state(key_id)
            .await
            .ok_or_else(|| KeyError::NotFound(key_id.to_string()))?;
        Ok(KeyStatus::new(key_id, state))
    }

    async fn enable_key(&self, key_id: &str) -> KeyResult<()> {
        self.journal.record(ServiceCall::EnableKey(key_id.to_string())).await;
        self.check(FailPoint::EnableKey).await?;

        let mut keys = self.keys.write().await;
        let state = keys
            .get_mut(key_id)
            .ok_or_else(|| KeyError::NotFound(key_id.to_string()))?;

        if !matches!(state, KeyState::Enabled | KeyState::Disabled) {
            return Err(KeyError::Kms(format!(
                "KMSInvalidStateException: {} is {}",
                key_id, state
            )));
        }

        *state = KeyState::Enabled;
        debug!(key_id = key_id, "Key enabled");
        Ok(())
    }

    async fn cancel_key_deletion(&self, key_id: &str) -> KeyResult<()> {
        self.journal
            .record(ServiceCall::CancelKeyDeletion(key_id.to_string()))
            .await;
        self.check(FailPoint::CancelKeyDeletion).await?;

        let mut keys = self.keys.write().await;
        let state = keys
            .get_mut(key_id)
            .ok_or_else(|| KeyError::NotFound(key_id.to_string()))?;

        if *state != KeyState::PendingDeletion {
            return Err(KeyError::Kms(format!(
                "KMSInvalidStateException: {} is {}",
                key_id, state
            )));
        }

        *state = KeyState::Disabled;
        debug!(key_id = key_id, "Key deletion cancelled");
        Ok(())
    }
}

/// In-memory backup service
#[derive(Debug, Default)]
pub struct InMemoryBackupService {
    /// Jobs per (vault, resource id), oldest first
    jobs: RwLock<HashMap<(String, String), Vec<BackupJobSummary>>>,
    failures: RwLock<HashSet<FailPoint>>,
    restore_counter: AtomicU64,
    journal: CallJournal,
}

impl InMemoryBackupService {
    pub fn new(journal: CallJournal) -> Self {
        Self {
            journal,
            ..Self::default()
        }
    }

    /// Record a completed backup job for a resource
    pub fn with_backup_job(
        mut self,
        vault_name: &str,
        resource_id: &str,
        job: BackupJobSummary,
    ) -> Self {
        self.jobs
            .get_mut()
            .entry((vault_name.to_string(), resource_id.to_string()))
            .or_default()
            .push(job);
        self
    }

    pub fn failing(mut self, point: FailPoint) -> Self {
        self.failures.get_mut().insert(point);
        self
    }

    pub fn journal(&self) -> &CallJournal {
        &self.journal
    }

    async fn check(&self, point: FailPoint) -> KeyResult<()> {
        if self.failures.read().await.contains(&point) {
            return Err(KeyError::Backup(injected(point)));
        }
        Ok(())
    }
}

#[async_trait]
impl BackupService for InMemoryBackupService {
    async fn list_recent_backup_jobs(
        &self,
        query: &BackupJobQuery,
    ) -> KeyResult<Vec<BackupJobSummary>> {
        self.journal.record(ServiceCall::ListBackupJobs(query.clone())).await;
        self.check(FailPoint::ListBackupJobs).await?;

        let limit = usize::try_from(query.max_results).unwrap_or(0);
        let jobs = self.jobs.read().await;

        Ok(jobs
            .get(&(query.vault_name.clone(), query.resource_id.clone()))
            .map(|jobs| jobs.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn start_restore_job(&self, request: &RestoreRequest) -> KeyResult<RestoreJobReceipt> {
        self.journal.record(ServiceCall::StartRestoreJob(request.clone())).await;
        self.check(FailPoint::StartRestoreJob).await?;

        let n = self.restore_counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(RestoreJobReceipt {
            restore_job_id: format!("restore-{:04}", n),
        })
    }
}
