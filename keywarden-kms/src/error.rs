//! Error types for key management and backup calls
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


use thiserror::Error;

/// Key management errors
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Key not found: {0}")]
    NotFound(String),

    #[error("KMS error: {0}")]
    Kms(String),

    #[error("Backup error: {0}")]
    Backup(String),

    #[error("Invalid service response: {0}")]
    InvalidResponse(String),
}

/// Result type for key operations
pub type KeyResult<T> = Result<T, KeyError>;
