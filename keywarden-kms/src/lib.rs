//! Key management and backup service access for keywarden
//!
//! Provides the key lifecycle model, the service traits used by key recovery,
//! AWS-backed implementations and in-memory implementations.
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


pub mod aws;
pub mod error;
pub mod key_types;
pub mod kms;
pub mod memory;

pub use aws::{AwsBackupService, AwsKeyManagement};
pub use error::{KeyError, KeyResult};
pub use key_types::{
    BackupJobQuery, BackupJobSummary, KeyId, KeyState, KeyStatus, RestoreJobReceipt,
    RestoreRequest, KMS_RESOURCE_TYPE,
};
pub use kms::{BackupService, KeyManagementService};
