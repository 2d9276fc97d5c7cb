//! Reads web-view navigation events from stdin, one per line:
//!
//! - a URL: the view navigated there
//! - `generate`: print the current page now
//! - `message <text>`: the page posted `<text>`
//! - `unload`: the view was torn down
//!
//! Ctrl-C abandons any job in flight; end of input lets queued jobs finish.

use std::sync::Arc;

use label_printer::{NetworkPrinter, Printer};
use print_bridge::{FileSettingsStore, PrintOrchestrator, poll_settings, spawn_print_worker};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. .env + logging
    let (config, _log_guard) = print_bridge::setup_environment();

    tracing::info!("Print bridge starting...");

    // 2. Printer reachability (warning only)
    let endpoint = config.printer_endpoint()?;
    let printer = NetworkPrinter::new(endpoint.clone()).with_timeout(config.printer_timeout());
    if !printer.is_online().await {
        tracing::warn!(printer = %endpoint, "Printer not reachable, jobs will fail until it is");
    }

    // 3. Worker + settings poller
    let orchestrator = Arc::new(PrintOrchestrator::from_config(&config)?);
    let shutdown = CancellationToken::new();
    let (handle, worker) =
        spawn_print_worker(orchestrator, config.web_view_url.clone(), shutdown.clone());

    let poller_shutdown = shutdown.child_token();
    let store = Arc::new(FileSettingsStore::new(&config.settings_file));
    let poller = tokio::spawn(poll_settings(
        store,
        config.settings_poll_interval(),
        handle.sender(),
        poller_shutdown.clone(),
    ));

    // 4. Navigation stream
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, abandoning in-flight work");
                shutdown.cancel();
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::info!("End of navigation stream");
                    break;
                };
                let sent = match line.trim() {
                    "" => continue,
                    "generate" => handle.generate_now().await,
                    "unload" => handle.unload().await,
                    other if other.starts_with("message ") => {
                        handle.post_message(&other["message ".len()..]).await
                    }
                    url => handle.navigate(url).await,
                };
                if sent.is_err() {
                    tracing::error!("Print worker stopped unexpectedly");
                    break;
                }
            }
        }
    }

    // 5. Drain: stop producers, let the worker finish its queue
    poller_shutdown.cancel();
    poller.await?;
    drop(handle);
    worker.await?;

    tracing::info!("Print bridge stopped");
    Ok(())
}
