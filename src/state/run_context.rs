use crate::output::{Record, RecordSink};
use crate::ScoutError;

/// Outcome channel of a single engine run
///
/// The caller owns one context per run and passes it into every engine
/// operation. The first failure is kept; later steps check
/// [`RunContext::has_failed`] and short-circuit. [`RunContext::report`]
/// surfaces the error once as a synthetic record and clears it.
#[derive(Debug, Default)]
pub struct RunContext {
    error: Option<ScoutError>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure unless one is already pending
    ///
    /// Fatal errors are logged at error level, the rest as warnings.
    pub fn fail(&mut self, error: ScoutError) {
        if let Some(existing) = &self.error {
            tracing::debug!("Ignoring follow-up error ({}), already failed: {}", error, existing);
            return;
        }
        if error.is_fatal() {
            tracing::error!("{:?}: {}", error.kind(), error);
        } else {
            tracing::warn!("{:?}: {}", error.kind(), error);
        }
        self.error = Some(error);
    }

    /// Stores the error of a result and returns its value, if any
    pub fn absorb<T>(&mut self, result: crate::Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.fail(e);
                None
            }
        }
    }

    pub fn has_failed(&self) -> bool {
        self.error.is_some()
    }

    pub fn error(&self) -> Option<&ScoutError> {
        self.error.as_ref()
    }

    /// Emits the pending error as a record and clears it
    ///
    /// # Arguments
    ///
    /// * `engine_url` - Base URL of the tracker the run belongs to
    /// * `what` - The phrase or URL the run was about
    /// * `sink` - Where the error record goes
    ///
    /// # Returns
    ///
    /// `true` if an error was reported
    pub fn report(&mut self, engine_url: &str, what: &str, sink: &mut dyn RecordSink) -> bool {
        let Some(error) = self.error.take() else {
            return false;
        };

        let record = Record::error(engine_url, what, &error);
        if let Err(e) = sink.emit(&record) {
            tracing::error!("Failed to emit error record: {}", e);
        }
        true
    }
}
