pub mod error;
pub mod types;

#[cfg(feature = "time_value")]
pub mod time_value;

#[cfg(feature = "loans")]
pub mod loans;

#[cfg(feature = "fx")]
pub mod fx;

#[cfg(feature = "units")]
pub mod units;

#[cfg(feature = "health")]
pub mod health;

pub use error::CalcError;
pub use types::*;

/// Standard result type for all calcpad operations
pub type CalcResult<T> = Result<T, CalcError>;
