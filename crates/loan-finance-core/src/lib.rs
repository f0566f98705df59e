pub mod error;
pub mod solvers;
pub mod time_value;
pub mod types;

#[cfg(feature = "amortization")]
pub mod amortization;

#[cfg(feature = "apr")]
pub mod apr;

#[cfg(feature = "tvm")]
pub mod tvm;

pub use error::LoanFinanceError;
pub use types::*;

/// Standard result type for all loan-finance operations
pub type LoanFinanceResult<T> = Result<T, LoanFinanceError>;
