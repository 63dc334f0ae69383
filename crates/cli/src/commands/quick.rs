//! `curriculum quick`: run a quick action for one topic.

use std::path::Path;

use ck_core::validation::{summarize, validate_quick_action};
use color_eyre::eyre::{bail, eyre};
use color_eyre::Result;
use colored::Colorize;

use crate::cli::QuickArgs;
use crate::commands::{lesson_config, Project};
use crate::report::{artifact_lines, Reporter};

pub async fn run(root: &Path, args: QuickArgs) -> Result<()> {
    let config = lesson_config(&args.lesson, &args.topic);
    let issues = validate_quick_action(&config);
    if !issues.is_empty() {
        bail!("invalid lesson: {}", summarize(&issues));
    }

    let project = Project::load(root).await?;
    let (events_tx, events_rx) = project.event_channel();
    let reporter = Reporter::spawn(events_rx, args.lesson.json);

    let outcome = project
        .engine
        .execute_quick_action(args.action, config, &events_tx)
        .await;
    drop(events_tx);
    let _ = reporter.await;

    if args.lesson.json {
        println!("{}", serde_json::to_string_pretty(&outcome.result)?);
    } else {
        let headline = if outcome.result.success {
            outcome.status.message.green().bold()
        } else {
            outcome.status.message.red().bold()
        };
        println!("{headline}");
        for line in artifact_lines(&outcome.result.artifacts) {
            println!("{line}");
        }
    }

    if outcome.result.success {
        Ok(())
    } else {
        Err(eyre!(outcome
            .result
            .error
            .unwrap_or_else(|| format!("{} failed", args.action.label()))))
    }
}
