use ccc_common::text::{CharWidthMeasurer, TextMeasurer};
use std::sync::Arc;

/// Per-build configuration and collaborators, threaded through the
/// pipeline instead of living in process-wide state.
#[derive(Clone)]
pub struct BuildContext {
    pub debug_level: u8,
    measurer: Arc<dyn TextMeasurer>,
}

impl std::fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildContext")
            .field("debug_level", &self.debug_level)
            .field("measurer", &"<dyn TextMeasurer>")
            .finish()
    }
}

impl Default for BuildContext {
    fn default() -> Self {
        Self {
            debug_level: 0,
            measurer: Arc::new(CharWidthMeasurer::default()),
        }
    }
}

impl BuildContext {
    pub fn with_debug_level(mut self, level: u8) -> Self {
        self.debug_level = level;
        self
    }

    pub fn with_measurer(mut self, measurer: Arc<dyn TextMeasurer>) -> Self {
        self.measurer = measurer;
        self
    }

    pub fn measurer(&self) -> &dyn TextMeasurer {
        self.measurer.as_ref()
    }

    /// Tolerance warnings are only emitted at debug level 2 and above,
    /// matching the legacy verbosity behavior.
    pub fn warn_enabled(&self) -> bool {
        self.debug_level >= 2
    }
}
