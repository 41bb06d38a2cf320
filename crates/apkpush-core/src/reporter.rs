//! Reporter trait for dependency injection
//!
//! Lets the deployment core report progress without being coupled to the
//! terminal. The CLI provides a styled console implementation; tests and
//! library callers can use [`NullReporter`].

use apkpush_schema::{Abi, FailureStage};

/// Sink for deployment progress events.
pub trait Reporter {
    /// Indicates a new phase has started (e.g. "Native libraries").
    fn section(&self, title: &str);

    /// A group of libraries is about to be processed.
    fn group_started(&self, abi: &Abi, files: usize);

    /// A library reached the device.
    fn file_pushed(&self, entry: &str, remote_path: &str);

    /// A library failed; the batch continues.
    fn file_failed(&self, entry: &str, stage: FailureStage, reason: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a success message.
    fn success(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);

    /// Log an error message.
    fn error(&self, msg: &str);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn section(&self, title: &str) {
        (**self).section(title);
    }
    fn group_started(&self, abi: &Abi, files: usize) {
        (**self).group_started(abi, files);
    }
    fn file_pushed(&self, entry: &str, remote_path: &str) {
        (**self).file_pushed(entry, remote_path);
    }
    fn file_failed(&self, entry: &str, stage: FailureStage, reason: &str) {
        (**self).file_failed(entry, stage, reason);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn success(&self, msg: &str) {
        (**self).success(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
    fn error(&self, msg: &str) {
        (**self).error(msg);
    }
}

/// A no-op reporter for silent operations (e.g., testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn group_started(&self, _: &Abi, _: usize) {}
    fn file_pushed(&self, _: &str, _: &str) {}
    fn file_failed(&self, _: &str, _: FailureStage, _: &str) {}
    fn info(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn error(&self, _: &str) {}
}
