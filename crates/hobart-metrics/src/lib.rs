#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cash;
pub mod growth;
pub mod leverage;
pub mod returns;
pub mod yearly;

pub use growth::{cagr, windowed_cagr};
pub use yearly::{MetricsCalculator, MetricsConfig, MetricsSeries, MetricsYearly, latest_eps};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
