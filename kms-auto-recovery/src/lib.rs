//! KMS Key Auto-Recovery Library
//!
//! This library provides the key recovery function including:
//! - Key state inspection through the key-management service
//! - Production gate (no automatic changes to `prod` keys)
//! - Best-effort restore of the latest backup
//! - Re-enabling disabled keys and cancelling pending deletions
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


pub mod handler;
pub mod recovery;
pub mod schemas;

pub use handler::handle;
pub use recovery::{BackupRestoreOutcome, KeyRecovery, RecoveryTarget};
pub use schemas::{InvocationResponse, RecoveryAction, ResultRecord};
