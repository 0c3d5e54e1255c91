//! Key Recovery Procedure Tests

use keywarden_kms::memory::{
    CallJournal, FailPoint, InMemoryBackupService, InMemoryKeyManagement, ServiceCall,
};
use keywarden_kms::{BackupJobQuery, BackupJobSummary, KeyState};
use kms_auto_recovery::schemas::{MESSAGE_APPROVAL_REQUIRED, MESSAGE_HEALTHY, MESSAGE_RECOVERED};
use kms_auto_recovery::{KeyRecovery, RecoveryAction, RecoveryTarget};
use std::sync::Arc;

const KEY: &str = "1234abcd-12ab-34cd-56ef-1234567890ab";
const VAULT: &str = "kms-backup-vault";
const RECOVERY_POINT: &str = "arn:aws:backup:us-east-1:123456789012:recovery-point:rp-1";

struct Harness {
    kms: Arc<InMemoryKeyManagement>,
    journal: CallJournal,
    recovery: KeyRecovery,
}

fn harness(kms: InMemoryKeyManagement, backup: InMemoryBackupService) -> Harness {
    let journal = kms.journal().clone();
    let kms = Arc::new(kms);
    let recovery = KeyRecovery::new(kms.clone(), Arc::new(backup));
    Harness {
        kms,
        journal,
        recovery,
    }
}

fn key_in(state: KeyState, journal: &CallJournal) -> InMemoryKeyManagement {
    InMemoryKeyManagement::new(journal.clone()).with_key(KEY, state)
}

fn vault_with_backup(journal: &CallJournal) -> InMemoryBackupService {
    InMemoryBackupService::new(journal.clone()).with_backup_job(
        VAULT,
        KEY,
        BackupJobSummary {
            job_id: "job-1".to_string(),
            recovery_point_arn: Some(RECOVERY_POINT.to_string()),
        },
    )
}

fn describe() -> ServiceCall {
    ServiceCall::DescribeKey(KEY.to_string())
}

fn enable() -> ServiceCall {
    ServiceCall::EnableKey(KEY.to_string())
}

fn cancel() -> ServiceCall {
    ServiceCall::CancelKeyDeletion(KEY.to_string())
}

fn list() -> ServiceCall {
    ServiceCall::ListBackupJobs(BackupJobQuery::latest_for_key(KEY, VAULT))
}

#[tokio::test]
async fn test_enabled_key_is_healthy() {
    let journal = CallJournal::new();
    let h = harness(
        key_in(KeyState::Enabled, &journal),
        vault_with_backup(&journal),
    );

    let record = h
        .recovery
        .recover(&RecoveryTarget::new(KEY, Some(VAULT), "dev"))
        .await;

    assert_eq!(record.status_code, 200);
    assert_eq!(record.message, MESSAGE_HEALTHY);
    assert_eq!(record.key_state.as_deref(), Some("Enabled"));
    assert_eq!(record.action, None);
    assert_eq!(journal.calls().await, vec![describe()]);
}

#[tokio::test]
async fn test_other_states_need_no_action() {
    for state in ["PendingImport", "Unavailable", "Creating"] {
        let journal = CallJournal::new();
        let h = harness(
            key_in(KeyState::from(state), &journal),
            vault_with_backup(&journal),
        );

        let record = h
            .recovery
            .recover(&RecoveryTarget::new(KEY, Some(VAULT), "dev"))
            .await;

        assert_eq!(record.status_code, 200);
        assert_eq!(record.key_state.as_deref(), Some(state));
        assert_eq!(record.action, None);
        assert!(journal.mutations().await.is_empty());
    }
}

#[tokio::test]
async fn test_production_requires_manual_approval() {
    for state in [KeyState::Disabled, KeyState::PendingDeletion] {
        let journal = CallJournal::new();
        let h = harness(key_in(state.clone(), &journal), vault_with_backup(&journal));

        let record = h
            .recovery
            .recover(&RecoveryTarget::new(KEY, Some(VAULT), "prod"))
            .await;

        assert_eq!(record.status_code, 200);
        assert_eq!(record.message, MESSAGE_APPROVAL_REQUIRED);
        assert_eq!(record.key_state.as_deref(), Some(state.as_str()));
        assert_eq!(record.action, None);
        // Backup service is not contacted either
        assert_eq!(journal.calls().await, vec![describe()]);
        assert_eq!(h.kms.state(KEY).await, Some(state));
    }
}

#[tokio::test]
async fn test_disabled_key_is_enabled() {
    let journal = CallJournal::new();
    let h = harness(
        key_in(KeyState::Disabled, &journal),
        InMemoryBackupService::new(journal.clone()),
    );

    let record = h
        .recovery
        .recover(&RecoveryTarget::new(KEY, None, "dev"))
        .await;

    assert_eq!(record.status_code, 200);
    assert_eq!(record.message, MESSAGE_RECOVERED);
    assert_eq!(record.action, Some(RecoveryAction::Recovered));
    assert_eq!(record.original_state.as_deref(), Some("Disabled"));
    assert_eq!(record.key_id, KEY);
    assert_eq!(journal.calls().await, vec![describe(), enable()]);
    assert_eq!(h.kms.state(KEY).await, Some(KeyState::Enabled));
}

#[tokio::test]
async fn test_pending_deletion_is_cancelled_then_enabled() {
    let journal = CallJournal::new();
    let h = harness(
        key_in(KeyState::PendingDeletion, &journal),
        InMemoryBackupService::new(journal.clone()),
    );

    let record = h
        .recovery
        .recover(&RecoveryTarget::new(KEY, None, "staging"))
        .await;

    assert_eq!(record.status_code, 200);
    assert_eq!(record.action, Some(RecoveryAction::Recovered));
    assert_eq!(record.original_state.as_deref(), Some("PendingDeletion"));
    assert_eq!(journal.calls().await, vec![describe(), cancel(), enable()]);
    assert_eq!(h.kms.state(KEY).await, Some(KeyState::Enabled));
}

#[tokio::test]
async fn test_restore_is_submitted_before_enable() {
    let journal = CallJournal::new();
    let h = harness(
        key_in(KeyState::PendingDeletion, &journal),
        vault_with_backup(&journal),
    );

    let record = h
        .recovery
        .recover(&RecoveryTarget::new(KEY, Some(VAULT), "dev"))
        .await;

    assert_eq!(record.status_code, 200);
    let calls = journal.calls().await;
    assert_eq!(calls.len(), 5);
    assert_eq!(calls[0], describe());
    assert_eq!(calls[1], list());
    match &calls[2] {
        ServiceCall::StartRestoreJob(request) => {
            assert_eq!(request.recovery_point_arn, RECOVERY_POINT);
            assert_eq!(request.vault_name, VAULT);
            assert_eq!(request.resource_type, "KMS");
        }
        other => panic!("expected restore request, got {:?}", other),
    }
    assert_eq!(calls[3], cancel());
    assert_eq!(calls[4], enable());
}

#[tokio::test]
async fn test_no_backup_available_still_recovers() {
    let journal = CallJournal::new();
    let h = harness(
        key_in(KeyState::Disabled, &journal),
        InMemoryBackupService::new(journal.clone()),
    );

    let record = h
        .recovery
        .recover(&RecoveryTarget::new(KEY, Some(VAULT), "dev"))
        .await;

    assert_eq!(record.status_code, 200);
    assert_eq!(record.action, Some(RecoveryAction::Recovered));
    assert_eq!(journal.calls().await, vec![describe(), list(), enable()]);
}

#[tokio::test]
async fn test_blank_vault_skips_backup_lookup() {
    let journal = CallJournal::new();
    let h = harness(
        key_in(KeyState::Disabled, &journal),
        vault_with_backup(&journal),
    );

    let record = h
        .recovery
        .recover(&RecoveryTarget::new(KEY, Some("   "), "dev"))
        .await;

    assert_eq!(record.status_code, 200);
    assert_eq!(record.action, Some(RecoveryAction::Recovered));
    assert_eq!(journal.calls().await, vec![describe(), enable()]);
}

#[tokio::test]
async fn test_backup_lookup_failure_is_not_fatal() {
    let journal = CallJournal::new();
    let h = harness(
        key_in(KeyState::Disabled, &journal),
        vault_with_backup(&journal).failing(FailPoint::ListBackupJobs),
    );

    let record = h
        .recovery
        .recover(&RecoveryTarget::new(KEY, Some(VAULT), "dev"))
        .await;

    assert_eq!(record.status_code, 200);
    assert_eq!(record.action, Some(RecoveryAction::Recovered));
    assert_eq!(record.error, None);
    assert_eq!(journal.calls().await, vec![describe(), list(), enable()]);
}

#[tokio::test]
async fn test_restore_failure_is_not_fatal() {
    let journal = CallJournal::new();
    let h = harness(
        key_in(KeyState::PendingDeletion, &journal),
        vault_with_backup(&journal).failing(FailPoint::StartRestoreJob),
    );

    let record = h
        .recovery
        .recover(&RecoveryTarget::new(KEY, Some(VAULT), "dev"))
        .await;

    assert_eq!(record.status_code, 200);
    assert_eq!(record.action, Some(RecoveryAction::Recovered));
    assert_eq!(h.kms.state(KEY).await, Some(KeyState::Enabled));

    let mutations = journal.mutations().await;
    assert_eq!(mutations.len(), 3);
    assert!(matches!(mutations[0], ServiceCall::StartRestoreJob(_)));
    assert_eq!(mutations[1], cancel());
    assert_eq!(mutations[2], enable());
}

#[tokio::test]
async fn test_describe_failure_returns_error_record() {
    let journal = CallJournal::new();
    let h = harness(
        key_in(KeyState::Disabled, &journal).failing(FailPoint::DescribeKey),
        vault_with_backup(&journal),
    );

    let record = h
        .recovery
        .recover(&RecoveryTarget::new(KEY, Some(VAULT), "dev"))
        .await;

    assert_eq!(record.status_code, 500);
    assert_eq!(record.key_id, KEY);
    assert!(record.error.is_some());
    assert_eq!(record.key_state, None);
    assert_eq!(journal.calls().await, vec![describe()]);
}

#[tokio::test]
async fn test_unknown_key_returns_error_record() {
    let journal = CallJournal::new();
    let h = harness(
        InMemoryKeyManagement::new(journal.clone()),
        InMemoryBackupService::new(journal.clone()),
    );

    let record = h
        .recovery
        .recover(&RecoveryTarget::new(KEY, None, "dev"))
        .await;

    assert_eq!(record.status_code, 500);
    assert_eq!(record.error, Some(format!("Key not found: {}", KEY)));
}

#[tokio::test]
async fn test_enable_failure_returns_error_record() {
    let journal = CallJournal::new();
    let h = harness(
        key_in(KeyState::Disabled, &journal).failing(FailPoint::EnableKey),
        InMemoryBackupService::new(journal.clone()),
    );

    let record = h
        .recovery
        .recover(&RecoveryTarget::new(KEY, None, "dev"))
        .await;

    assert_eq!(record.status_code, 500);
    assert_eq!(record.key_id, KEY);
    assert_eq!(record.action, None);
    assert!(record.error.unwrap().contains("EnableKey"));
}

#[tokio::test]
async fn test_cancel_failure_skips_enable() {
    let journal = CallJournal::new();
    let h = harness(
        key_in(KeyState::PendingDeletion, &journal).failing(FailPoint::CancelKeyDeletion),
        InMemoryBackupService::new(journal.clone()),
    );

    let record = h
        .recovery
        .recover(&RecoveryTarget::new(KEY, None, "dev"))
        .await;

    assert_eq!(record.status_code, 500);
    assert_eq!(journal.calls().await, vec![describe(), cancel()]);
    assert_eq!(h.kms.state(KEY).await, Some(KeyState::PendingDeletion));
}

#[tokio::test]
async fn test_repeated_invocations_on_healthy_key() {
    let journal = CallJournal::new();
    let h = harness(
        key_in(KeyState::Enabled, &journal),
        vault_with_backup(&journal),
    );
    let target = RecoveryTarget::new(KEY, Some(VAULT), "dev");

    let first = h.recovery.recover(&target).await;
    let second = h.recovery.recover(&target).await;

    assert_eq!(first, second);
    assert_eq!(first.status_code, 200);
    assert_eq!(journal.calls().await, vec![describe(), describe()]);
}

#[tokio::test]
async fn test_recovered_key_is_healthy_on_next_run() {
    let journal = CallJournal::new();
    let h = harness(
        key_in(KeyState::Disabled, &journal),
        InMemoryBackupService::new(journal.clone()),
    );
    let target = RecoveryTarget::new(KEY, None, "dev");

    let first = h.recovery.recover(&target).await;
    assert_eq!(first.action, Some(RecoveryAction::Recovered));

    journal.clear().await;
    let second = h.recovery.recover(&target).await;
    assert_eq!(second.message, MESSAGE_HEALTHY);
    assert!(journal.mutations().await.is_empty());
}
