//! # ncmon-core - Core Domain Types
//!
//! Foundation crate for ncmon. Provides error handling, logging setup, the
//! log-line classifier, the rolling sample store and the derived statistics
//! computed from it.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, thiserror, regex, tracing).
//!
//! ## Public API
//!
//! ### Classification (`pattern`)
//! - [`MessagePattern`] - A recognised substring plus the fields to extract
//! - [`FieldSpec`] - Anchor token, offset and numeric coercion for one field
//! - [`classify()`] - First-match classification of a line against a pattern table
//! - [`Classification`] - `Matched`, `NoMatch` or `Malformed`
//!
//! ### Sample Store (`store`)
//! - [`SampleBuffer`] - Fixed-capacity FIFO buffer of samples
//! - [`SampleStore`] - Per-peer named buffers and counters
//! - [`Quantity`], [`Counter`] - Names of the measured quantities
//!
//! ### Statistics (`stats`)
//! - [`mean()`], [`ratio_series()`], [`ideal_coding_gain()`], [`linear_trend()`], [`histogram()`]
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use ncmon_core::prelude::*;
//! ```

pub mod ansi;
pub mod error;
pub mod logging;
pub mod pattern;
pub mod stats;
pub mod store;

/// Prelude for common imports used throughout all ncmon crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use ansi::{clean_line, strip_ansi_codes};
pub use error::{Error, Result, ResultExt};
pub use pattern::{
    classify, Classification, Coercion, FieldError, FieldSpec, LineEvent, Locator, MessagePattern,
};
pub use stats::{
    histogram, ideal_coding_gain, indexed, linear_trend, mean, ratio_series, HistogramBin,
    StatsError, Trend,
};
pub use store::{Counter, Quantity, SampleBuffer, SampleStore};
