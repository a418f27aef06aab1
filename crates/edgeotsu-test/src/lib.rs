//! edgeotsu-test - Regression test framework for edgeotsu
//!
//! This crate provides the regression test harness used by the `tests/*_reg.rs`
//! files of every workspace crate, together with deterministic synthetic
//! scenes so that no test depends on image files.
//!
//! # Usage
//!
//! ```ignore
//! use edgeotsu_test::{RegParams, scene::SplitScene};
//!
//! let mut rp = RegParams::new("otsu");
//! let raster = SplitScene::default().build().unwrap();
//! rp.compare_values(-12.5, threshold, 1.0);
//! assert!(rp.cleanup());
//! ```
//!
//! # Environment Variables
//!
//! - `REGTEST_MODE`: Set to "compare" (default) or "display"
//! - `RUST_LOG`: Log filter for [`init_logging`]

mod error;
mod params;
pub mod scene;

pub use error::{TestError, TestResult};
pub use params::{RegParams, RegTestMode};

/// Install `env_logger` for test output.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
