use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use super::{
    metrics::{record_auth_failure, record_guard_outcome, record_upstream_failure},
    services::ServiceError,
};

/// Named failure conditions this service reports to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCondition {
    Unauthorized,
    GuildNotFound,
    NotManager,
    Internal,
}

impl ErrorCondition {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::GuildNotFound => "guild_not_found",
            Self::NotManager => "not_a_manager",
            Self::Internal => "internal_error",
        }
    }

    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::GuildNotFound => StatusCode::NOT_FOUND,
            Self::NotManager => StatusCode::FORBIDDEN,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// Turns a failure condition into the body clients receive.
pub trait ErrorFormatter: Send + Sync {
    fn format_error(&self, condition: ErrorCondition) -> ErrorBody;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonErrorFormatter;

impl ErrorFormatter for JsonErrorFormatter {
    fn format_error(&self, condition: ErrorCondition) -> ErrorBody {
        let message = match condition {
            ErrorCondition::Unauthorized => "Authentication is required",
            ErrorCondition::GuildNotFound => "Guild not found",
            ErrorCondition::NotManager => "You are not a manager of this guild",
            ErrorCondition::Internal => "An internal error occurred",
        };
        ErrorBody {
            error: condition.code().to_owned(),
            message: message.to_owned(),
        }
    }
}

#[derive(Debug)]
pub(crate) enum GuardError {
    /// The caller has no usable identity. Counted as an auth failure.
    Unauthenticated {
        reason: &'static str,
        body: ErrorBody,
    },
    Rejected {
        condition: ErrorCondition,
        body: ErrorBody,
    },
    Upstream {
        error: ServiceError,
        body: ErrorBody,
    },
}

impl GuardError {
    pub(crate) fn unauthenticated(formatter: &dyn ErrorFormatter, reason: &'static str) -> Self {
        Self::Unauthenticated {
            reason,
            body: formatter.format_error(ErrorCondition::Unauthorized),
        }
    }

    pub(crate) fn rejected(formatter: &dyn ErrorFormatter, condition: ErrorCondition) -> Self {
        Self::Rejected {
            condition,
            body: formatter.format_error(condition),
        }
    }

    pub(crate) fn upstream(formatter: &dyn ErrorFormatter, error: ServiceError) -> Self {
        Self::Upstream {
            error,
            body: formatter.format_error(ErrorCondition::Internal),
        }
    }
}

// Central handler for collaborator failures: the cause is logged, never sent.
impl IntoResponse for GuardError {
    fn into_response(self) -> axum::response::Response {
        match self {
            Self::Unauthenticated { reason, body } => {
                record_auth_failure(reason);
                (ErrorCondition::Unauthorized.status(), Json(body)).into_response()
            }
            Self::Rejected { condition, body } => {
                record_guard_outcome(condition.code());
                (condition.status(), Json(body)).into_response()
            }
            Self::Upstream { error, body } => {
                record_upstream_failure(&error);
                tracing::error!(event = "guild.guard", outcome = "upstream_failure", error = %error);
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(true)
        .with_span_list(true)
        .init();
}
