//! Subprocess runner for command-line generators.
//!
//! Spawns an executable and turns its JSON-Lines stdout into a stream of
//! `serde_json::Value`s. A non-zero exit status is reported as a final error
//! item.

use crate::generators::base::GeneratorError;
use std::pin::Pin;
use std::process::Stdio;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::process::Command;
use tokio_stream::Stream;
use tracing::debug;

pub type JsonLineStream = Pin<Box<dyn Stream<Item = Result<serde_json::Value, GeneratorError>> + Send>>;

pub struct CliExecutor;

impl CliExecutor {
    /// Runs `command` with `args` in `working_dir` and streams parsed stdout lines.
    ///
    /// Blank lines are ignored. A line that is not valid JSON yields a
    /// `StreamParse` error and the stream continues with the next line.
    pub fn execute(command: String, args: Vec<String>, working_dir: String) -> JsonLineStream {
        let stream = async_stream::stream! {
            let mut cmd = Command::new(&command);
            cmd.args(&args);
            cmd.current_dir(&working_dir);
            cmd.stdout(Stdio::piped());
            cmd.stderr(Stdio::null());
            cmd.kill_on_drop(true);

            let mut child = match cmd.spawn() {
                Ok(child) => child,
                Err(e) => {
                    yield Err(GeneratorError::Execution(format!(
                        "Failed to spawn command '{}': {}",
                        command, e
                    )));
                    return;
                }
            };

            let Some(stdout) = child.stdout.take() else {
                yield Err(GeneratorError::Execution("Failed to capture stdout".to_string()));
                return;
            };

            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<serde_json::Value>(&line) {
                    Ok(value) => yield Ok(value),
                    Err(e) => {
                        yield Err(GeneratorError::StreamParse(format!(
                            "Failed to parse JSON: {} (line: {})",
                            e, line
                        )));
                    }
                }
            }

            match child.wait().await {
                Ok(status) if status.success() => {
                    debug!(command = %command, "generator command exited");
                }
                Ok(status) => {
                    yield Err(GeneratorError::Execution(format!(
                        "Command '{}' exited with {}",
                        command, status
                    )));
                }
                Err(e) => {
                    yield Err(GeneratorError::Execution(format!(
                        "Failed to wait for command '{}': {}",
                        command, e
                    )));
                }
            }
        };

        Box::pin(stream)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn test_execute_echo_json() {
        let stream = CliExecutor::execute(
            "echo".to_string(),
            vec![r#"{"type":"progress","percent":42}"#.to_string()],
            ".".to_string(),
        );

        let values: Vec<_> = stream
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .expect("Should parse JSON successfully");

        assert_eq!(values.len(), 1);
        assert_eq!(values[0]["type"], "progress");
        assert_eq!(values[0]["percent"], 42);
    }

    #[tokio::test]
    async fn test_execute_invalid_command() {
        let stream = CliExecutor::execute(
            "nonexistent-generator-xyz".to_string(),
            vec![],
            ".".to_string(),
        );
        let results: Vec<_> = stream.collect().await;
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(GeneratorError::Execution(_))));
    }

    #[tokio::test]
    async fn test_execute_reports_parse_errors_and_continues() {
        let stream = CliExecutor::execute(
            "printf".to_string(),
            vec!["not json\\n{\"type\":\"completed\"}\\n".to_string()],
            ".".to_string(),
        );
        let results: Vec<_> = stream.collect().await;
        assert_eq!(results.len(), 2);
        assert!(matches!(results[0], Err(GeneratorError::StreamParse(_))));
        assert!(results[1].is_ok());
    }

    #[tokio::test]
    async fn test_execute_reports_failing_exit_status() {
        let stream = CliExecutor::execute("false".to_string(), vec![], ".".to_string());
        let results: Vec<_> = stream.collect().await;
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(GeneratorError::Execution(_))));
    }
}
