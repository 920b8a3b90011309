#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tangent/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod bounds;
pub mod clean;
pub mod error;
pub mod frontier;
pub mod optimizer;
mod solver;

pub use bounds::WeightBounds;
pub use clean::clean_weights;
pub use error::OptimizeError;
pub use frontier::FrontierPoint;
pub use optimizer::{OptimizationResult, Optimizer, OptimizerConfig};
