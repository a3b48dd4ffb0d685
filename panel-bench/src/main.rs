//! Video Panel Bench
//!
//! Runs the panel core against a simulated six-button panel and video
//! switcher, driven from a line console.

mod console;
mod diagnostics_layer;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use panel_core::{
    event_channel, lamp_test_requested, load_settings_file, run_lamp_test, PanelIo,
    RoutingDispatcher, SharedBuffers, CONFIG_FILE, EVENT_QUEUE_CAPACITY, STARTUP_SETTLE,
};
use panel_sim::{VirtualPanel, VirtualSwitcher};
use tokio::sync::oneshot;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use console::{Console, PanelMode};
use diagnostics_layer::{DiagnosticLog, DiagnosticsLayer};

/// Warnings kept for the `status` command
const DIAGNOSTIC_HISTORY: usize = 16;

/// Video panel bench - run the routing panel against simulated hardware
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the panel config file
    #[arg(short, long, env = "PANEL_CONFIG", default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Print the effective settings as JSON and exit
    #[arg(long)]
    print_settings: bool,

    /// Do not confirm routes from the simulated switcher
    #[arg(long = "no-auto-confirm", action = clap::ArgAction::SetFalse)]
    auto_confirm: bool,

    /// Hold a button (1-6) down while the panel starts; 1 enters lamp test
    #[arg(long, value_name = "BUTTON")]
    hold_at_startup: Option<usize>,

    /// Event queue depth
    #[arg(long, default_value_t = EVENT_QUEUE_CAPACITY)]
    queue_capacity: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let diagnostics = DiagnosticLog::new(DIAGNOSTIC_HISTORY);
    init_logging(&args.log_level, diagnostics.clone());

    info!("Starting video panel bench");

    let settings = load_settings_file(&args.config);
    if args.print_settings {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }

    let (tx, rx) = event_channel(args.queue_capacity).context("Failed to create event queue")?;

    let buffers = Arc::new(SharedBuffers::new());
    let panel = VirtualPanel::new();
    let switcher = Arc::new(
        VirtualSwitcher::new(settings.router.to_string()).with_confirmations(&tx),
    );
    switcher.set_auto_confirm(args.auto_confirm);

    if let Some(button) = args.hold_at_startup {
        panel.press(button)?;
    }

    let io = PanelIo::new(panel.clone(), buffers.clone(), tx);
    let (io_shutdown, io_rx) = oneshot::channel();
    let io_task = tokio::spawn(io.run(io_rx));

    // Let the debouncer see what is held at power-on
    tokio::time::sleep(STARTUP_SETTLE).await;

    let (mode_shutdown, mode_rx) = oneshot::channel();
    let mut idle_queue = None;
    let (mode, mode_task) = if lamp_test_requested(&buffers).await {
        // Releases keep queueing; nothing consumes them in this mode
        idle_queue = Some(rx);
        (
            PanelMode::LampTest,
            tokio::spawn(run_lamp_test(buffers.clone(), mode_rx)),
        )
    } else {
        let dispatcher = RoutingDispatcher::new(settings.clone(), switcher.clone(), buffers.clone());
        (
            PanelMode::Routing,
            tokio::spawn(dispatcher.run(rx, mode_rx)),
        )
    };
    info!("Panel running in {} mode", mode);

    let console = Console {
        panel,
        switcher,
        buffers,
        diagnostics,
        mode,
        destination: settings.routing_destination,
    };
    let result = console.run().await;

    let _ = mode_shutdown.send(());
    let _ = io_shutdown.send(());
    if let Err(e) = mode_task.await {
        warn!("Panel task ended abnormally: {}", e);
    }
    let pins = io_task.await.context("Panel I/O task failed")?;
    pins.release_all();
    drop(idle_queue);

    info!("Video panel bench stopped");
    result
}

fn init_logging(level: &str, diagnostics: DiagnosticLog) {
    // Include all our crates in the default filter
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "videopanel={level},panel_core={level},panel_sim={level}",
            level = level
        )
        .into()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(DiagnosticsLayer::new(diagnostics))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["videopanel"]);
        assert_eq!(args.config, PathBuf::from(CONFIG_FILE));
        assert!(args.auto_confirm);
        assert!(!args.print_settings);
        assert_eq!(args.queue_capacity, EVENT_QUEUE_CAPACITY);
        assert_eq!(args.hold_at_startup, None);
    }

    #[test]
    fn test_args_flags() {
        let args = Args::parse_from([
            "videopanel",
            "--config",
            "/media/panel/config.txt",
            "--no-auto-confirm",
            "--hold-at-startup",
            "1",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.config, PathBuf::from("/media/panel/config.txt"));
        assert!(!args.auto_confirm);
        assert_eq!(args.hold_at_startup, Some(1));
        assert_eq!(args.log_level, "debug");
    }
}
