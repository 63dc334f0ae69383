//! `curriculum batch`: generate a lesson per title for one course.

use std::path::Path;
use std::sync::Arc;

use ck_core::batch::BatchRunner;
use ck_core::validation::{summarize, validate_config};
use ck_protocol::{BatchOptions, LessonSpec};
use color_eyre::eyre::{bail, eyre};
use color_eyre::Result;

use crate::cli::BatchArgs;
use crate::commands::{lesson_config, on_ctrl_c, Project};
use crate::report::{batch_lines, Reporter};

/// Applies command-line overrides to the configured batch defaults.
pub fn batch_options(defaults: &BatchOptions, args: &BatchArgs) -> BatchOptions {
    let mut options = defaults.clone();
    if args.parallel {
        options.parallel_generation = true;
    }
    if let Some(jobs) = args.max_jobs {
        options.max_parallel_jobs = jobs.max(1);
    }
    if args.stop_on_error {
        options.continue_on_error = false;
    }
    if let Some(retries) = args.max_retries {
        options.max_retries = retries;
        options.retry_failed_items = retries > 0;
    }
    options
}

pub async fn run(root: &Path, args: BatchArgs) -> Result<()> {
    let mut lessons = Vec::with_capacity(args.lessons.len());
    for title in &args.lessons {
        let config = lesson_config(&args.lesson, title);
        let issues = validate_config(&config);
        if !issues.is_empty() {
            bail!("lesson '{title}' is invalid: {}", summarize(&issues));
        }
        lessons.push(LessonSpec {
            title: title.clone(),
            config,
        });
    }

    let project = Project::load(root).await?;
    let options = batch_options(&project.config.global.batch, &args);
    let runner = Arc::new(BatchRunner::new(project.engine.clone()));
    let batch_id = runner.create_batch(args.course.clone(), lessons, options).await;

    let (events_tx, events_rx) = project.event_channel();
    let reporter = Reporter::spawn(events_rx, args.lesson.json);
    let interrupt = {
        let runner = runner.clone();
        let handle = tokio::runtime::Handle::current();
        on_ctrl_c(move || {
            handle.spawn(async move {
                let _ = runner.cancel_batch(batch_id).await;
            });
        })
    };

    let result = runner.execute_batch(batch_id, &events_tx).await;
    interrupt.abort();
    drop(events_tx);
    let _ = reporter.await;
    let result = result?;

    if args.lesson.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for line in batch_lines(&result) {
            println!("{line}");
        }
    }

    if result.failed_items > 0 || !result.ran_to_completion() {
        return Err(eyre!(
            "{} of {} lessons did not generate",
            result.total_items - result.successful_items,
            result.total_items
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn batch_args(extra: &[&str]) -> BatchArgs {
        let mut argv = vec![
            "curriculum",
            "batch",
            "--course",
            "Geology",
            "--lesson",
            "Rocks",
            "--audience",
            "Grade 6",
        ];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Some(Commands::Batch(args)) => args,
            other => panic!("expected batch, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults_are_kept_without_flags() {
        let defaults = BatchOptions::default();
        assert_eq!(batch_options(&defaults, &batch_args(&[])), defaults);
    }

    #[test]
    fn test_flags_override_defaults() {
        let options = batch_options(
            &BatchOptions::default(),
            &batch_args(&["--parallel", "--max-jobs", "0", "--stop-on-error", "--max-retries", "0"]),
        );
        assert!(options.parallel_generation);
        assert_eq!(options.max_parallel_jobs, 1);
        assert!(!options.continue_on_error);
        assert_eq!(options.max_retries, 0);
        assert!(!options.retry_failed_items);
    }
}
