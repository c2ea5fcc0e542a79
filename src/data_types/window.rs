
use serde::Serialize;

/// Default first trusted reference position, tuned for a ~29.9kb viral reference
pub const DEFAULT_WINDOW_START: u64 = 256;
/// Default last trusted reference position, tuned for a ~29.9kb viral reference
pub const DEFAULT_WINDOW_END: u64 = 29675;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum WindowError {
    #[error("window start must be >= 1 (coordinates are 1-based)")]
    ZeroStart,
    #[error("window start ({start}) must be <= window end ({end})")]
    Inverted { start: u64, end: u64 },
    #[error("window end ({end}) is past the end of the reference (length = {reference_len})")]
    PastReference { end: u64, reference_len: u64 },
}

/// The trusted region of the reference, 1-based and inclusive on both ends.
/// Variant emission outside of this window is restricted to deletions.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct AnalysisWindow {
    /// First trusted position, 1-based
    start: u64,
    /// Last trusted position, 1-based and inclusive
    end: u64,
}

impl Default for AnalysisWindow {
    fn default() -> Self {
        Self {
            start: DEFAULT_WINDOW_START,
            end: DEFAULT_WINDOW_END,
        }
    }
}

impl AnalysisWindow {
    /// Constructor with bounds checks
    /// # Arguments
    /// * `start` - first trusted position, 1-based
    /// * `end` - last trusted position, 1-based and inclusive
    /// # Errors
    /// * if `start` is 0
    /// * if `start` > `end`
    pub fn new(start: u64, end: u64) -> Result<Self, WindowError> {
        if start == 0 {
            return Err(WindowError::ZeroStart);
        }
        if start > end {
            return Err(WindowError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// Verifies that the window fits entirely on a reference of the given length.
    /// # Arguments
    /// * `reference_len` - the length of the loaded reference sequence
    /// # Errors
    /// * if the window end extends past the reference
    pub fn validate(&self, reference_len: usize) -> Result<(), WindowError> {
        let reference_len = reference_len as u64;
        if self.end > reference_len {
            return Err(WindowError::PastReference { end: self.end, reference_len });
        }
        Ok(())
    }

    /// Returns true if the 1-based `position` is inside the window
    pub fn contains(&self, position: u64) -> bool {
        self.start <= position && position <= self.end
    }

    // getters
    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }
}

impl std::fmt::Display for AnalysisWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}
