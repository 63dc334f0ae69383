//! Subcommand implementations.

pub mod batch;
pub mod init;
pub mod quick;
pub mod run;

use std::path::Path;
use std::sync::Arc;

use ck_core::clock::system_clock;
use ck_core::config::loader::load_config;
use ck_core::config::models::AppConfig;
use ck_core::generators::GeneratorManager;
use ck_core::workflow::engine::WorkflowEngine;
use ck_protocol::{Event, GenerationConfig};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use tokio::sync::mpsc;

use crate::cli::{Commands, LessonArgs};

pub async fn dispatch(root: &Path, command: Commands) -> Result<()> {
    match command {
        Commands::Init(args) => init::run(root, args).await,
        Commands::Run(args) => run::run(root, args).await,
        Commands::Quick(args) => quick::run(root, args).await,
        Commands::Batch(args) => batch::run(root, args).await,
        Commands::Tui => ck_tui::run_app(root)
            .await
            .map_err(|e| color_eyre::eyre::eyre!(e)),
    }
}

/// Loaded configuration plus an engine built from it.
pub struct Project {
    pub config: AppConfig,
    pub engine: Arc<WorkflowEngine>,
}

impl Project {
    pub async fn load(root: &Path) -> Result<Self> {
        let config = load_config(root)
            .await
            .wrap_err_with(|| format!("failed to load configuration from {}", root.display()))?;
        let generators = GeneratorManager::from_app_config(&config);
        let engine = Arc::new(WorkflowEngine::new(
            Arc::new(generators),
            system_clock(),
            config.global.progress_weighting,
        ));
        Ok(Self { config, engine })
    }

    pub fn event_channel(&self) -> (mpsc::Sender<Event>, mpsc::Receiver<Event>) {
        mpsc::channel(self.config.global.event_buffer.max(1))
    }
}

/// Builds the generation config for `topic` from the shared lesson flags.
pub fn lesson_config(args: &LessonArgs, topic: &str) -> GenerationConfig {
    let mut config = GenerationConfig::new(topic, args.audience.clone())
        .with_content_types(args.content_types.clone());
    config.subject = args.subject.clone();
    config.duration = args.duration.clone();
    config.complexity = args.complexity;
    config.learning_objectives = args.objectives.clone();
    config.quiz_types = args.quiz_types.clone();
    config
}

/// Runs `on_interrupt` when Ctrl-C arrives. Abort the handle once the work
/// it guards is done.
pub fn on_ctrl_c<F>(on_interrupt: F) -> tokio::task::JoinHandle<()>
where
    F: FnOnce() + Send + 'static,
{
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt();
        }
    })
}
