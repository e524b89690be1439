//! Background polling thread for the GUI process.

use anyhow::Context;
use clipring::ClipboardManager;
use log::{error, info};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Run `manager.run_daemon()` on its own thread with a private tokio runtime.
pub fn start(manager: Arc<ClipboardManager>) -> anyhow::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("clipboard-daemon".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(e) => {
                    error!("failed to start async runtime: {}", e);
                    return;
                }
            };
            if let Err(e) = runtime.block_on(manager.run_daemon()) {
                error!("clipboard daemon failed: {:#}", e);
            }
        })
        .context("failed to spawn clipboard daemon thread")
}

/// Stop the daemon and make sure the history reaches disk.
///
/// The thread may have ended early (no runtime, panic) without its own final
/// flush, so the history is written once more here.
pub fn stop(manager: &ClipboardManager, daemon: JoinHandle<()>) {
    info!("shutting down");
    manager.shutdown();
    if daemon.join().is_err() {
        error!("clipboard daemon panicked");
    }
    let _ = manager.flush();
}
