//! Result record and invocation response payloads
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


use keywarden_kms::{KeyError, KeyState};
use serde::{Deserialize, Serialize};

/// Status code for every handled outcome, manual approval included
pub const STATUS_OK: u16 = 200;
/// Status code for faults raised by the key-management service
pub const STATUS_ERROR: u16 = 500;

pub const MESSAGE_HEALTHY: &str = "Key is healthy";
pub const MESSAGE_APPROVAL_REQUIRED: &str =
    "Manual approval is required in the production environment";
pub const MESSAGE_RECOVERED: &str = "Key recovery completed";
pub const MESSAGE_FAILED: &str = "Error occurred during key recovery";

/// Action taken on the key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    Recovered,
}

/// Outcome of one recovery invocation
///
/// `status_code` travels in the response envelope, never inside the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    #[serde(skip)]
    pub status_code: u16,
    pub message: String,
    pub key_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<RecoveryAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResultRecord {
    fn new(status_code: u16, message: &str, key_id: &str) -> Self {
        Self {
            status_code,
            message: message.to_string(),
            key_id: key_id.to_string(),
            key_state: None,
            original_state: None,
            action: None,
            error: None,
        }
    }

    /// No action needed
    pub fn healthy(key_id: &str, state: &KeyState) -> Self {
        Self {
            key_state: Some(state.to_string()),
            ..Self::new(STATUS_OK, MESSAGE_HEALTHY, key_id)
        }
    }

    /// Action needed, but blocked by the production gate
    pub fn approval_required(key_id: &str, state: &KeyState) -> Self {
        Self {
            key_state: Some(state.to_string()),
            ..Self::new(STATUS_OK, MESSAGE_APPROVAL_REQUIRED, key_id)
        }
    }

    pub fn recovered(key_id: &str, original_state: &KeyState) -> Self {
        Self {
            original_state: Some(original_state.to_string()),
            action: Some(RecoveryAction::Recovered),
            ..Self::new(STATUS_OK, MESSAGE_RECOVERED, key_id)
        }
    }

    pub fn failure(key_id: &str, error: &KeyError) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new(STATUS_ERROR, MESSAGE_FAILED, key_id)
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == STATUS_OK
    }

    /// Wrap the record in the function response envelope
    pub fn to_response(&self) -> Result<InvocationResponse, serde_json::Error> {
        Ok(InvocationResponse {
            status_code: self.status_code,
            body: serde_json::to_string(self)?,
        })
    }
}

/// Response returned to the invoking infrastructure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// JSON-encoded [`ResultRecord`]
    pub body: String,
}
