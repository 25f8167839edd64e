use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalcError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Payment too low to amortize: payment {payment} does not cover period interest {interest}")]
    NonAmortizing { payment: Decimal, interest: Decimal },

    #[error("Cannot reach target within reasonable time: loan not repaid within {max_periods} periods")]
    IterationBound { max_periods: u32 },

    #[error("Convergence failure: {function} did not converge after {iterations} iterations (delta: {last_delta})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Unknown unit or currency: {0}")]
    UnknownUnit(String),

    #[error("Incompatible units: cannot convert {from} to {to}")]
    IncompatibleUnits { from: String, to: String },

    #[error("Exchange rates unavailable: {0}")]
    RateUnavailable(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for CalcError {
    fn from(e: serde_json::Error) -> Self {
        CalcError::SerializationError(e.to_string())
    }
}
