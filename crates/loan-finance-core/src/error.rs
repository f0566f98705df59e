use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::Money;

#[derive(Debug, Error)]
pub enum LoanFinanceError {
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Domain error: {0}")]
    DomainError(String),

    #[error("Non-convergence: {function} did not converge after {iterations} iterations (delta: {last_delta})")]
    NonConvergence {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("Schedule overrun: balance of {remaining_balance} remains after {periods} periods")]
    ScheduleOverrun {
        periods: u32,
        remaining_balance: Money,
    },

    #[error("Date error: {0}")]
    DateError(String),
}

impl LoanFinanceError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        LoanFinanceError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
