//! Verbosity-gated logging for the refinement search.
//!
//! Nothing is formatted when the level is below the threshold, so the
//! search hot path stays silent at verbosity 0. Levels:
//! - 0: SILENT
//! - 1: IMPROVEMENTS (new best candidate, baseline, termination)
//! - 2: PROGRESS (preprocessing, partitioning)
//! - 3: DEBUG (every scored candidate)

pub const VERBOSITY_SILENT: u8 = 0;
pub const VERBOSITY_IMPROVEMENTS: u8 = 1;
pub const VERBOSITY_PROGRESS: u8 = 2;
pub const VERBOSITY_DEBUG: u8 = 3;

/// Log at IMPROVEMENTS level (verbosity >= 1).
#[macro_export]
macro_rules! log_improvement {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_IMPROVEMENTS {
            eprintln!($($arg)*);
        }
    };
}

/// Log at PROGRESS level (verbosity >= 2).
#[macro_export]
macro_rules! log_progress {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_PROGRESS {
            eprintln!($($arg)*);
        }
    };
}

/// Log at DEBUG level (verbosity >= 3).
#[macro_export]
macro_rules! log_debug {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_DEBUG {
            eprintln!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_ordered() {
        assert!(VERBOSITY_SILENT < VERBOSITY_IMPROVEMENTS);
        assert!(VERBOSITY_IMPROVEMENTS < VERBOSITY_PROGRESS);
        assert!(VERBOSITY_PROGRESS < VERBOSITY_DEBUG);
    }

    #[test]
    fn test_silent_macros_do_not_evaluate_output() {
        let verbosity = VERBOSITY_SILENT;
        log_improvement!(verbosity, "best {}", 1.0);
        log_progress!(verbosity, "partition {}", 2);
        log_debug!(verbosity, "leaf {}", 3);
    }
}
