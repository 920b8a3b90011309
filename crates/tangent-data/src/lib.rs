#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tangent/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod memory;
pub mod portfolio;
pub mod series;
pub mod source;
#[cfg(feature = "yahoo")]
pub mod yahoo;

pub use error::{DataError, Result};
pub use memory::InMemoryPriceSource;
pub use portfolio::{Holdings, Portfolio};
pub use series::{PricePoint, PriceSeries};
pub use source::{HistoryWindow, Lookback, PriceSource};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
