#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod management;
pub mod moat;
pub mod policy;
pub mod scorer;
pub mod stats;

pub use management::{ManagementScore, score_management};
pub use moat::{MoatScore, score_moat};
pub use policy::{
    Curve, MoatWeights, QualityPolicy, SafetyMarginPolicy, SafetyMarginStep, TargetBand,
};
pub use scorer::{QualityScore, QualityScorer};

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
