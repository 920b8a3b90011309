//! Yahoo Finance price source.

pub mod prices;

pub use prices::YahooPriceSource;
