//! # Termination signals awaited by [`Application::run`](crate::Application::run).
//!
//! ```text
//! unix:     SIGINT ─► Interrupt   SIGTERM ─► Terminate   SIGQUIT ─► Quit
//! other:    Ctrl-C ─► Interrupt
//! ```
//!
//! Listeners are installed per call, so a failed installation is reported to
//! the caller instead of aborting the process.

use std::fmt;

/// Termination request received from the operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Termination {
    /// `SIGINT` or Ctrl-C.
    Interrupt,
    /// `SIGTERM`.
    #[cfg_attr(not(unix), allow(dead_code))]
    Terminate,
    /// `SIGQUIT`.
    #[cfg_attr(not(unix), allow(dead_code))]
    Quit,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Termination::Interrupt => "interrupt",
            Termination::Terminate => "terminate",
            Termination::Quit => "quit",
        })
    }
}

/// Resolves with the first termination signal received.
#[cfg(unix)]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<Termination> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;

    let received = tokio::select! {
        _ = interrupt.recv() => Termination::Interrupt,
        _ = terminate.recv() => Termination::Terminate,
        _ = quit.recv() => Termination::Quit,
    };
    Ok(received)
}

/// Resolves with the first termination signal received.
#[cfg(not(unix))]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<Termination> {
    tokio::signal::ctrl_c().await?;
    Ok(Termination::Interrupt)
}
