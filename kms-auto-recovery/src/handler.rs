//! Lambda invocation handler
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


use crate::recovery::{KeyRecovery, RecoveryTarget};
use crate::schemas::InvocationResponse;
use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use tracing::info;

/// Handle one trigger event
///
/// The event payload is logged but not interpreted; the key to check comes
/// from configuration.
pub async fn handle(
    recovery: &KeyRecovery,
    target: &RecoveryTarget,
    event: LambdaEvent<Value>,
) -> Result<InvocationResponse, Error> {
    let (payload, context) = event.into_parts();

    info!(
        request_id = %context.request_id,
        event = %payload,
        "Event received"
    );

    let record = recovery.recover(target).await;

    info!(
        request_id = %context.request_id,
        status_code = record.status_code,
        key_id = %record.key_id,
        "Invocation finished"
    );

    Ok(record.to_response()?)
}
