//! Financial computations: runway, what-if scenarios and spreadsheet import.
//!
//! Everything here is pure; persistence is left to the callers.

pub mod import;
pub mod runway;
pub mod scenario;

pub use runway::*;
pub use scenario::*;

/// Round to cents / hundredths for display.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
