//! KMS Key Auto-Recovery
//!
//! Lambda function triggered by a schedule or an alarm. Checks the configured
//! KMS key and brings it back to `Enabled` outside production.

use anyhow::Result;
use aws_config::BehaviorVersion;
use keywarden_config::{LogFormat, RecoveryConfig};
use keywarden_kms::{AwsBackupService, AwsKeyManagement};
use keywarden_logging::{init_console_logging, init_logging};
use kms_auto_recovery::{handle, KeyRecovery, RecoveryTarget};
use lambda_runtime::{service_fn, LambdaEvent};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

const SERVICE_NAME: &str = "kms-auto-recovery";

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = RecoveryConfig::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    match config.log_format {
        LogFormat::Json => init_logging(SERVICE_NAME, config.log_level()),
        LogFormat::Console => init_console_logging(SERVICE_NAME, config.log_level()),
    }

    info!(
        key_id = %config.kms_key_id,
        environment = %config.environment,
        backup_vault = ?config.backup_vault(),
        "Configuration loaded"
    );

    // AWS clients from the default credential chain
    let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let kms = AwsKeyManagement::new(aws_sdk_kms::Client::new(&sdk_config));
    let backup = AwsBackupService::new(aws_sdk_backup::Client::new(&sdk_config));

    let recovery = KeyRecovery::new(Arc::new(kms), Arc::new(backup));
    let target = RecoveryTarget::from_config(&config);

    let recovery = &recovery;
    let target = &target;

    info!("Waiting for invocations");
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle(recovery, target, event).await
    }))
    .await
    .map_err(|e| anyhow::anyhow!("Lambda runtime error: {}", e))?;

    Ok(())
}
