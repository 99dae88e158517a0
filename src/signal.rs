//! Cooperative cancellation for the duplicate pipeline.
//!
//! A [`CancellationToken`] is shared by every stage of the pipeline. The
//! Ctrl+C handler installed by [`install_handler`] only ever calls
//! [`CancellationToken::request`]; it never touches pipeline data.
//!
//! # Semantics
//!
//! - The first request sets a pending stop condition. Stages poll it at their
//!   natural boundaries (per walked entry, per record, per size group, per
//!   checksum submission). The stage that honors the stop calls
//!   [`CancellationToken::acknowledge`], which clears the pending condition so
//!   that later stages can still run on the reduced candidate set.
//! - Any further request escalates: the signal handler terminates the process
//!   with [`EXIT_CODE_INTERRUPTED`] without waiting for a cooperative drain.
//!
//! # Usage
//!
//! ```rust,no_run
//! use dupsift::signal::install_handler;
//!
//! let token = install_handler().expect("Failed to install signal handler");
//!
//! // Pass clones of the token to the pipeline stages
//! let stage_token = token.clone();
//! if stage_token.is_stop_requested() {
//!     stage_token.acknowledge();
//! }
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::sync::OnceLock;

/// Exit code for SIGINT (Ctrl+C) interruption.
/// This follows Unix convention: 128 + signal number (SIGINT = 2).
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// What the caller of [`CancellationToken::request`] should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    /// First request: stages will stop at their next boundary.
    Cooperative,
    /// A request arrived while an earlier one was already registered.
    Terminate,
}

/// Shared cooperative stop-request state.
///
/// Cloning is cheap and every clone observes the same state.
///
/// # Thread Safety
///
/// `CancellationToken` is `Send` and `Sync`; both counters are atomics.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    /// Total number of stop requests received, never reset.
    requests: Arc<AtomicUsize>,
    /// Set by a request, cleared by the stage that honors it.
    pending: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token with no stop requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stop request.
    ///
    /// Returns [`Escalation::Terminate`] for every request after the first.
    pub fn request(&self) -> Escalation {
        let previous = self.requests.fetch_add(1, Ordering::SeqCst);
        if previous == 0 {
            self.pending.store(true, Ordering::SeqCst);
            Escalation::Cooperative
        } else {
            Escalation::Terminate
        }
    }

    /// Check whether a stop is pending.
    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// Consume a pending stop request.
    ///
    /// Returns `true` if a request was pending. The request count is left
    /// untouched, so a later request still escalates.
    pub fn acknowledge(&self) -> bool {
        self.pending.swap(false, Ordering::SeqCst)
    }

    /// Number of stop requests received so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Whether any stop was ever requested, acknowledged or not.
    #[must_use]
    pub fn was_interrupted(&self) -> bool {
        self.request_count() > 0
    }

    /// Reset both counters.
    ///
    /// Only meant for reusing a process-wide token across runs (tests).
    pub fn reset(&self) {
        self.requests.store(0, Ordering::SeqCst);
        self.pending.store(false, Ordering::SeqCst);
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_TOKEN: OnceLock<CancellationToken> = OnceLock::new();

/// Install a Ctrl+C handler that drives a process-wide [`CancellationToken`].
///
/// The first Ctrl+C asks the pipeline to stop cooperatively; the second one
/// exits the process immediately with [`EXIT_CODE_INTERRUPTED`].
///
/// Calling this more than once (e.g. from several tests) returns the
/// already-installed token after resetting it.
///
/// # Errors
///
/// Returns [`SignalError::InstallFailed`] if another Ctrl+C handler was
/// registered outside this module.
pub fn install_handler() -> Result<CancellationToken, SignalError> {
    if let Some(token) = GLOBAL_TOKEN.get() {
        token.reset();
        return Ok(token.clone());
    }

    let token = CancellationToken::new();
    let handler_token = token.clone();

    ctrlc::set_handler(move || match handler_token.request() {
        Escalation::Cooperative => {
            let _ = writeln!(std::io::stderr(), "\nInterrupted, finishing current step...");
            let _ = std::io::stderr().flush();
            log::info!("Stop requested, pipeline will wind down at the next boundary");
        }
        Escalation::Terminate => {
            let _ = writeln!(std::io::stderr(), "\nInterrupted again, exiting now.");
            let _ = std::io::stderr().flush();
            std::process::exit(EXIT_CODE_INTERRUPTED);
        }
    })?;

    let _ = GLOBAL_TOKEN.set(token.clone());
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_new() {
        let token = CancellationToken::new();
        assert!(!token.is_stop_requested());
        assert_eq!(token.request_count(), 0);
        assert!(!token.was_interrupted());
    }

    #[test]
    fn test_first_request_is_cooperative() {
        let token = CancellationToken::new();
        assert_eq!(token.request(), Escalation::Cooperative);
        assert!(token.is_stop_requested());
    }

    #[test]
    fn test_second_request_escalates() {
        let token = CancellationToken::new();
        token.request();
        assert_eq!(token.request(), Escalation::Terminate);
        assert_eq!(token.request_count(), 2);
    }

    #[test]
    fn test_escalation_survives_acknowledge() {
        let token = CancellationToken::new();
        token.request();
        assert!(token.acknowledge());
        assert!(!token.is_stop_requested());
        assert_eq!(token.request(), Escalation::Terminate);
    }

    #[test]
    fn test_acknowledge_without_request() {
        let token = CancellationToken::new();
        assert!(!token.acknowledge());
    }

    #[test]
    fn test_clone_shares_state() {
        let token = CancellationToken::new();
        let cloned = token.clone();

        token.request();
        assert!(cloned.is_stop_requested());

        cloned.acknowledge();
        assert!(!token.is_stop_requested());
        assert!(token.was_interrupted());
    }

    #[test]
    fn test_reset() {
        let token = CancellationToken::new();
        token.request();
        token.request();
        token.reset();
        assert_eq!(token.request_count(), 0);
        assert_eq!(token.request(), Escalation::Cooperative);
    }

    #[test]
    fn test_exit_code_interrupted() {
        assert_eq!(EXIT_CODE_INTERRUPTED, 130);
    }

    #[test]
    fn test_token_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CancellationToken>();
    }
}
