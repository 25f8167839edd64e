pub mod fx;
pub mod health;
pub mod loan;
pub mod time_value;
pub mod units;
