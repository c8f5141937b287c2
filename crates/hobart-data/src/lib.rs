#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod edgar;
pub mod error;
pub mod extract;
pub mod fields;
pub mod normalize;
pub mod statements;

pub use error::{DataError, Result};
pub use extract::{AliasTable, FactExtractor, FormType, RawObservation};
pub use fields::{FieldName, StatementKind, UnitKind};
pub use normalize::{NormalizerConfig, StatementNormalizer};
pub use statements::{BalanceSheet, CashFlowStatement, IncomeStatement, StatementSet};

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
