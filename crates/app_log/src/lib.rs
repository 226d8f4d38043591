//! PhotoReviewer Logging & Observability Module
//!
//! Provides structured logging, log retention, panic handling and deadlock detection.

mod panic_hook;
mod logging;

pub use panic_hook::init_panic_hook;
pub use logging::{init_logging, cleanup_old_logs, cleanup_logs_in, LogGuard};

use std::path::PathBuf;
use directories::ProjectDirs;

/// Get the application log directory
pub fn log_dir() -> PathBuf {
    ProjectDirs::from("com", "PhotoReviewer", "PhotoReviewer")
        .map(|dirs| dirs.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

/// Initialize all observability features.
///
/// `level` is the default filter directive, overridden by `RUST_LOG`.
/// The returned guard flushes the file writer when dropped and must be
/// kept alive for the lifetime of the process.
pub fn init(level: &str) -> anyhow::Result<LogGuard> {
    let guard = init_logging(level)?;
    init_panic_hook();

    #[cfg(debug_assertions)]
    init_deadlock_detector();

    Ok(guard)
}

#[cfg(debug_assertions)]
fn init_deadlock_detector() {
    use std::thread;
    use std::time::Duration;

    thread::spawn(|| {
        loop {
            thread::sleep(Duration::from_secs(10));
            let deadlocks = parking_lot::deadlock::check_deadlock();
            if !deadlocks.is_empty() {
                tracing::error!(count = deadlocks.len(), "Deadlock detected");
                for (i, threads) in deadlocks.iter().enumerate() {
                    for t in threads {
                        tracing::error!(cycle = i, thread_id = ?t.thread_id(), "{:#?}", t.backtrace());
                    }
                }
            }
        }
    });
}
