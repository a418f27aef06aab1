//! Regression test parameters and operations

use edgeotsu_core::{BinaryMask, Raster};

/// Regression test mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegTestMode {
    /// Compare computed values against expectations (default)
    #[default]
    Compare,
    /// Also print intermediate results for inspection
    Display,
}

impl RegTestMode {
    /// Parse mode from the `REGTEST_MODE` environment variable
    pub fn from_env() -> Self {
        match std::env::var("REGTEST_MODE")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "display" => Self::Display,
            _ => Self::Compare,
        }
    }
}

/// Regression test parameters
///
/// Tracks the state of a regression test: the test name, the index of the
/// current check, the mode, and every recorded failure. Checks never panic;
/// the test asserts on [`cleanup`](Self::cleanup) at the end so that every
/// failure is reported in one run.
pub struct RegParams {
    /// Name of the test (e.g., "otsu")
    pub test_name: String,
    /// Current check index (incremented before each check)
    index: usize,
    /// Test mode
    pub mode: RegTestMode,
    success: bool,
    failures: Vec<String>,
}

impl RegParams {
    /// Create new regression test parameters
    ///
    /// # Arguments
    ///
    /// * `test_name` - Name of the test (e.g., "otsu")
    pub fn new(test_name: &str) -> Self {
        crate::init_logging();
        let mode = RegTestMode::from_env();

        eprintln!();
        eprintln!("////////////////////////////////////////////////");
        eprintln!("////////////////   {}_reg   ///////////////", test_name);
        eprintln!("////////////////////////////////////////////////");
        eprintln!("Mode: {:?}", mode);
        log::debug!("{}_reg: started in {:?} mode", test_name, mode);

        Self {
            test_name: test_name.to_string(),
            index: 0,
            mode,
            success: true,
            failures: Vec::new(),
        }
    }

    /// Get the current check index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Check if in display mode
    pub fn display(&self) -> bool {
        self.mode == RegTestMode::Display
    }

    /// Compare two floating-point values
    ///
    /// # Arguments
    ///
    /// * `expected` - Expected value
    /// * `actual` - Actual computed value
    /// * `delta` - Maximum allowed difference
    ///
    /// # Returns
    ///
    /// `true` if values match within delta, `false` otherwise.
    pub fn compare_values(&mut self, expected: f64, actual: f64, delta: f64) -> bool {
        self.index += 1;
        let diff = (expected - actual).abs();

        if diff > delta || diff.is_nan() {
            let msg = format!(
                "Failure in {}_reg: value comparison for index {}\n\
                 difference = {} but allowed delta = {}\n\
                 expected = {}, actual = {}",
                self.test_name, self.index, diff, delta, expected, actual
            );
            self.fail(msg);
            false
        } else {
            true
        }
    }

    /// Record a boolean check
    pub fn check(&mut self, condition: bool, what: &str) -> bool {
        self.index += 1;
        if !condition {
            let msg = format!(
                "Failure in {}_reg: check for index {} - {}",
                self.test_name, self.index, what
            );
            self.fail(msg);
        }
        condition
    }

    /// Compare two masks cell by cell
    ///
    /// Geometry and every cell value (including no-data) must match.
    pub fn compare_masks(&mut self, mask1: &BinaryMask, mask2: &BinaryMask) -> bool {
        self.index += 1;

        if !mask1.same_geometry(mask2) {
            let msg = format!(
                "Failure in {}_reg: mask comparison for index {} - geometry mismatch",
                self.test_name, self.index
            );
            self.fail(msg);
            return false;
        }

        let width = mask1.width() as usize;
        let mismatch = mask1
            .data()
            .iter()
            .zip(mask2.data())
            .position(|(a, b)| a != b);
        if let Some(i) = mismatch {
            let msg = format!(
                "Failure in {}_reg: mask comparison for index {} - cell mismatch at ({}, {})",
                self.test_name,
                self.index,
                i % width,
                i / width
            );
            self.fail(msg);
            return false;
        }

        true
    }

    /// Compare two rasters cell by cell within `delta`
    ///
    /// No-data cells must coincide.
    pub fn compare_rasters(&mut self, raster1: &Raster, raster2: &Raster, delta: f32) -> bool {
        self.index += 1;

        if !raster1.same_geometry(raster2) {
            let msg = format!(
                "Failure in {}_reg: raster comparison for index {} - geometry mismatch",
                self.test_name, self.index
            );
            self.fail(msg);
            return false;
        }

        for y in 0..raster1.height() {
            for x in 0..raster1.width() {
                let same = match (raster1.get(x, y), raster2.get(x, y)) {
                    (Some(a), Some(b)) => (a - b).abs() <= delta,
                    (None, None) => true,
                    _ => false,
                };
                if !same {
                    let msg = format!(
                        "Failure in {}_reg: raster comparison for index {} - value mismatch at ({}, {})",
                        self.test_name, self.index, x, y
                    );
                    self.fail(msg);
                    return false;
                }
            }
        }

        true
    }

    /// Clean up and report results
    ///
    /// # Returns
    ///
    /// `true` if all checks passed, `false` if any failed.
    pub fn cleanup(self) -> bool {
        if self.success {
            eprintln!("SUCCESS: {}_reg", self.test_name);
        } else {
            eprintln!("FAILURE: {}_reg", self.test_name);
            for failure in &self.failures {
                eprintln!("  {}", failure);
            }
        }
        eprintln!();

        self.success
    }

    /// Check if all checks have passed so far
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Get list of failures
    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    fn fail(&mut self, msg: String) {
        log::error!("{}", msg);
        self.failures.push(msg);
        self.success = false;
    }
}
