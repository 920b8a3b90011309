#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tangent/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod sampler;
pub mod simulator;

pub use error::SimulationError;
pub use sampler::{BootstrapSampler, ParametricSampler, ReturnSampler};
pub use simulator::{MonteCarloSimulator, SimulationConfig, SimulationResult, horizon_days};
