// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::llm::LLMError;

/// Failure taxonomy shared by the application services.
///
/// Every variant maps to one HTTP status at the presentation boundary; none
/// of them abort the process.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Required input missing or malformed (400)
    #[error("{0}")]
    Validation(String),

    /// Unknown id (404)
    #[error("{0}")]
    NotFound(String),

    /// AI collaborator call failed or returned an unusable reply (500)
    #[error("AI collaborator failed: {0}")]
    Upstream(String),

    /// Anything else (500)
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl ServiceError {
    pub fn agent_not_found() -> Self {
        ServiceError::NotFound("Agent not found".to_string())
    }
}

impl From<LLMError> for ServiceError {
    fn from(err: LLMError) -> Self {
        ServiceError::Upstream(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Upstream(format!("Failed to parse AI response: {}", err))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
