//! Ctrl+C handling.
//!
//! A single shared `AtomicBool` is raised when the user presses Ctrl+C. The
//! walker and both grouping passes poll it between files and stop with
//! [`FinderError::Interrupted`](crate::duplicates::FinderError::Interrupted);
//! no partial report is written and the process exits with code 130.
//!
//! ```rust,no_run
//! use dupefind::duplicates::FinderConfig;
//! use dupefind::signal::install_handler;
//!
//! let handler = install_handler().expect("signal handler");
//! let config = FinderConfig::default().with_shutdown_flag(handler.get_flag());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

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

    /// Whether Ctrl+C was pressed or [`request_shutdown`](Self::request_shutdown) was called.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Raise the flag by hand.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// The flag itself, for the finder and walker.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Lower the flag so the handler can serve another run.
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
static INSTALL_LOCK: Mutex<()> = Mutex::new(());

/// Install the process-wide Ctrl+C handler, or reuse it.
///
/// `ctrlc` accepts one handler per process. The first successful call
/// registers it; every later call gets the same handler back with its flag
/// lowered, so `run_app` can be called repeatedly (as the tests do).
///
/// # Errors
///
/// Returns [`SignalError::InstallFailed`] if the OS refuses the handler and
/// none was registered earlier by this module.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    let _guard = INSTALL_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    let installed = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Stopping scan...");
        let _ = std::io::stderr().flush();
        log::info!("Shutdown signal received");
    });

    match installed {
        Ok(()) => {
            let _ = GLOBAL_HANDLER.set(handler);
        }
        Err(ctrlc::Error::MultipleHandlers) => {
            // Registered outside this module; the flag cannot be raised by it.
            log::warn!("Ctrl+C handler registered elsewhere; interrupts will not stop the scan");
        }
        Err(e) => return Err(e.into()),
    }

    let handler = GLOBAL_HANDLER.get_or_init(ShutdownHandler::new);
    handler.reset();
    Ok(handler.clone())
}
