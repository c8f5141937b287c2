#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod params;
pub mod payback;
pub mod scenario;
pub mod sticker;

pub use params::ValuationParams;
pub use payback::{payback_years, ten_cap_price};
pub use scenario::{
    GrowthSource, OwnerEarningsSource, PaybackBasis, ScenarioInputs, ScenarioOutputs,
    ValuationCalculator, ValuationInputs, ValuationScenario,
};
pub use sticker::{StickerPrice, sticker_price, terminal_pe};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
