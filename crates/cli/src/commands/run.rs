//! `curriculum run`: generate one lesson through its full pipeline.

use std::path::Path;

use ck_core::validation::{summarize, validate_config};
use ck_core::workflow::find_template;
use ck_protocol::{GeneratedArtifact, GenerationProgress};
use color_eyre::eyre::{bail, eyre};
use color_eyre::Result;
use serde::Serialize;
use uuid::Uuid;

use crate::cli::RunArgs;
use crate::commands::{lesson_config, on_ctrl_c, Project};
use crate::report::{artifact_lines, workflow_headline, Reporter};

#[derive(Debug, Serialize)]
struct RunReport<'a> {
    workflow_id: Uuid,
    topic: &'a str,
    progress: &'a GenerationProgress,
    artifacts: &'a [GeneratedArtifact],
    error: Option<String>,
}

pub async fn run(root: &Path, args: RunArgs) -> Result<()> {
    let config = lesson_config(&args.lesson, &args.topic);
    let issues = validate_config(&config);
    if !issues.is_empty() {
        bail!("invalid lesson: {}", summarize(&issues));
    }

    let project = Project::load(root).await?;
    let template = args
        .template
        .as_deref()
        .map(|name| find_template(&project.config.pipelines, name))
        .transpose()?;
    let mut workflow = project.engine.create_workflow(config, template);

    let (events_tx, events_rx) = project.event_channel();
    let reporter = Reporter::spawn(events_rx, args.lesson.json);
    let cancel = workflow.cancel_handle();
    let interrupt = on_ctrl_c(move || cancel.cancel());

    project.engine.announce(&workflow, &events_tx).await;
    let outcome = project.engine.run_to_end(&mut workflow, &events_tx).await;
    interrupt.abort();
    drop(events_tx);
    let _ = reporter.await;

    let error = outcome.as_ref().err().map(ToString::to_string);
    if args.lesson.json {
        let report = RunReport {
            workflow_id: workflow.id(),
            topic: workflow.topic(),
            progress: workflow.progress(),
            artifacts: workflow.artifacts(),
            error: error.clone(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", workflow_headline(workflow.progress()));
        for line in artifact_lines(workflow.artifacts()) {
            println!("{line}");
        }
    }

    match error {
        Some(message) => Err(eyre!(message)),
        None => Ok(()),
    }
}
