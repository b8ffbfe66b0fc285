//! Ctrl+C handling for the extraction phase.
//!
//! A shared `AtomicBool` is set when the user interrupts. Extraction workers
//! check it between files; the grouping core itself always runs to
//! completion once started. An interrupted run exits with
//! [`ExitCode::Interrupted`](crate::error::ExitCode::Interrupted) (130).
//!
//! ```rust,no_run
//! use simdupe::scanner::ExtractConfig;
//! use simdupe::signal::install_handler;
//!
//! let handler = install_handler().expect("Failed to install signal handler");
//! let config = ExtractConfig::default().with_shutdown_flag(handler.get_flag());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether Ctrl+C was pressed or [`request_shutdown`](Self::request_shutdown) called.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request a shutdown manually.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clone of the flag, for [`ExtractConfig::with_shutdown_flag`](crate::scanner::ExtractConfig::with_shutdown_flag).
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear the flag.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C handler, or reuse the installed one.
///
/// `ctrlc` allows a single handler per process. Later calls (e.g. several
/// `run_app` invocations in one test binary) get the existing handler with
/// its flag reset. If another library already owns the signal, an unhooked
/// handler is returned and only manual shutdown requests work.
///
/// # Errors
///
/// Currently always succeeds; the `Result` leaves room for platforms where
/// installation failure should be fatal.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    let installed = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Finishing current files...");
        let _ = std::io::stderr().flush();
        log::info!("Shutdown signal received");
    });

    match installed {
        Ok(()) => {
            let _ = GLOBAL_HANDLER.set(handler);
        }
        Err(e) => {
            log::debug!("Ctrl+C handler unavailable ({}), using unhooked handler", e);
            let _ = GLOBAL_HANDLER.set(ShutdownHandler::new());
        }
    }

    let handler = GLOBAL_HANDLER.get_or_init(ShutdownHandler::new);
    handler.reset();
    Ok(handler.clone())
}
