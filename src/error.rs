use std::time::Duration;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::model::leave_request::LeaveType;

/// Coarse classification of a [`LeaveError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    ExternalCapability,
    Unauthorized,
}

/// Every failure the leave service can report.
///
/// `Display` output is user-facing: it is what the employee (or the model,
/// as a tool result) gets to read.
#[derive(Debug, Error)]
pub enum LeaveError {
    #[error("Employee ID {0} not found.")]
    EmployeeNotFound(String),

    #[error("No leave request with ID {request_id} found for employee {employee_id}.")]
    RequestNotFound {
        employee_id: String,
        request_id: String,
    },

    #[error("Invalid leave type '{0}'. Available types: {types}.", types = LeaveType::names().join(", "))]
    InvalidLeaveType(String),

    #[error("Invalid date format '{0}'. Please use YYYY-MM-DD format.")]
    InvalidDate(String),

    #[error("End date must be after start date (got {start} to {end}).")]
    EndBeforeStart { start: String, end: String },

    #[error("I need more information to process your leave request. Please provide: {}.", .0.join(", "))]
    MissingDetails(Vec<&'static str>),

    #[error("Unknown tool '{0}'.")]
    UnknownTool(String),

    #[error("Invalid arguments for tool '{tool}': {reason}")]
    InvalidToolArguments { tool: String, reason: String },

    #[error("language model call failed: {0}")]
    Model(String),

    #[error("language model did not answer within {0:?}")]
    ModelTimeout(Duration),

    #[error("dialogue exceeded its budget of {0} model steps")]
    StepBudgetExhausted(usize),

    #[error("{0}")]
    Unauthorized(String),
}

impl LeaveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LeaveError::EmployeeNotFound(_) | LeaveError::RequestNotFound { .. } => {
                ErrorKind::NotFound
            }
            LeaveError::InvalidLeaveType(_)
            | LeaveError::InvalidDate(_)
            | LeaveError::EndBeforeStart { .. }
            | LeaveError::MissingDetails(_)
            | LeaveError::UnknownTool(_)
            | LeaveError::InvalidToolArguments { .. } => ErrorKind::Validation,
            LeaveError::Model(_)
            | LeaveError::ModelTimeout(_)
            | LeaveError::StepBudgetExhausted(_) => ErrorKind::ExternalCapability,
            LeaveError::Unauthorized(_) => ErrorKind::Unauthorized,
        }
    }
}

impl ResponseError for LeaveError {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::ExternalCapability => StatusCode::BAD_GATEWAY,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string()
        }))
    }
}
