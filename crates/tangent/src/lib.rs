#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tangent/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;

// Re-export the component crates
pub use tangent_data as data;
pub use tangent_optimize as optimize;
pub use tangent_risk as risk;
pub use tangent_sim as sim;

pub use config::{
    CovarianceSection, DataSection, OptimizerSection, SimulationMode, SimulationSection,
    TangentConfig,
};
pub use error::{Error, ErrorKind, Result};
pub use pipeline::{Analysis, Estimates, Optimization, ProjectionInput};
pub use report::{Report, ReportBuilder};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
