//! FitPal Tools module
//!
//! Tool implementations behind the MCP server. Each function does the work
//! for one tool and returns a serializable response.

pub mod calculators;
pub mod calorie_log;
pub mod lookup;
pub mod profile;
pub mod status;

use serde_json::{json, Value};

use crate::db::DbError;
use crate::metabolic::CalcError;
use crate::upstream::UpstreamError;

/// Why a tool call failed
#[derive(Debug)]
pub enum ToolError {
    /// The caller's request was refused; the body is returned to the caller
    Rejected(Value),
    /// Server-side failure
    Internal(String),
}

pub type ToolResult<T> = Result<T, ToolError>;

impl ToolError {
    pub fn rejected(kind: &str, message: impl Into<String>) -> Self {
        ToolError::Rejected(json!({ "error": kind, "message": message.into() }))
    }
}

/// Trimmed `user_id`; a blank one is refused
pub(crate) fn require_user_id(user_id: &str) -> ToolResult<&str> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(ToolError::rejected("invalid_input", "user_id is required"));
    }
    Ok(user_id)
}

impl From<CalcError> for ToolError {
    fn from(err: CalcError) -> Self {
        match err.validation_errors() {
            Some(errors) => ToolError::Rejected(json!({
                "error": "validation_failed",
                "message": errors.to_string(),
                "fields": errors.fields,
            })),
            None => {
                tracing::error!(error = %err, "Calculator configuration error");
                ToolError::Internal(err.to_string())
            }
        }
    }
}

impl From<DbError> for ToolError {
    fn from(err: DbError) -> Self {
        tracing::error!(error = %err, "Database failure");
        ToolError::Internal(format!("Database error: {}", err))
    }
}

impl From<UpstreamError> for ToolError {
    fn from(err: UpstreamError) -> Self {
        let kind = match &err {
            UpstreamError::NotConfigured(_) => "not_configured",
            UpstreamError::Unavailable { .. } => "upstream_unavailable",
            UpstreamError::EmptyResult(_) => "no_result",
            UpstreamError::InvalidInput(_) => "invalid_input",
        };
        ToolError::rejected(kind, err.user_message())
    }
}
