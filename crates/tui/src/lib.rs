//! # ck-tui
//!
//! Terminal User Interface for curriculum-kit.
//!
//! This crate provides the interactive TUI for creating lessons, watching
//! their generation progress and acting on failed steps. It drives
//! `ck-core`'s `GenerationService` over channels using the `Op` and `Event`
//! protocol defined in `ck-protocol`.

pub mod app;
pub mod event_handler;
pub mod state;
pub mod tui;
pub mod widgets;

use std::path::Path;

use anyhow::Result;
use ck_core::clock::system_clock;
use ck_core::config::loader::load_config;
use ck_core::generators::manager::GeneratorManager;
use ck_core::GenerationService;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

pub use app::App;
pub use tui::Tui;

/// Loads the project at `project_root`, starts the generation service and
/// runs the TUI until the user quits.
pub async fn run_app(project_root: &Path) -> Result<()> {
    init_tracing();

    let config = load_config(project_root).await?;
    let generators = GeneratorManager::from_app_config(&config);

    let (op_tx, op_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::channel(config.global.event_buffer.max(1));
    let service = GenerationService::new(&config, generators, system_clock(), event_tx);
    let service_task = tokio::spawn(async move { service.run(op_rx).await });

    let mut tui = Tui::init()?;
    let mut app = App::new(op_tx, event_rx);
    let result = app.run(&mut tui).await;
    tui.restore()?;

    // Dropping the app closes both channels so the service loop can finish.
    drop(app);
    if let Err(e) = service_task.await {
        tracing::warn!(error = %e, "generation service task failed");
    }
    result
}

/// Logging would corrupt the alternate screen, so formatted events always
/// go to a sink. `RUST_LOG` only changes which events are filtered; use a
/// non-TUI subcommand to see log output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::sink)
        .try_init();
}
