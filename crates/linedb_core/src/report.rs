//! Error reporting hook.
//!
//! Some failures cannot be returned to the caller: a property that fails to
//! decode during a load, a child entity that cannot be saved during a
//! cascade, or a flush triggered by autosave. Every failure, returned or
//! not, is passed to the database's [`ErrorReporter`].

use crate::error::CoreError;

/// Receives every failure the database encounters.
///
/// Implemented for closures:
///
/// ```
/// use linedb_core::{Database, CoreError};
///
/// let db = Database::open_in_memory();
/// db.set_reporter(|error: &CoreError| eprintln!("linedb: {error}"));
/// ```
pub trait ErrorReporter: Send + Sync {
    /// Handles one failure.
    fn report(&self, error: &CoreError);
}

impl<F> ErrorReporter for F
where
    F: Fn(&CoreError) + Send + Sync,
{
    fn report(&self, error: &CoreError) {
        self(error);
    }
}

/// The default reporter: logs every failure as a `tracing` warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, error: &CoreError) {
        tracing::warn!(error = %error, "linedb operation failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn closures_are_reporters() {
        let count = AtomicUsize::new(0);
        let reporter = |_: &CoreError| {
            count.fetch_add(1, Ordering::Relaxed);
        };
        reporter.report(&CoreError::encoding("x"));
        reporter.report(&CoreError::encoding("y"));
        assert_eq!(count.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn tracing_reporter_does_not_panic() {
        TracingReporter.report(&CoreError::malformed_record(3, "record without Id"));
    }
}
