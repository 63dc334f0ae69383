//! Generator backed by a local executable.
//!
//! The executable is invoked as `<command> <args...> --model <model> --input <file>`
//! where `<file>` holds the system prompt and the serialized request. It must
//! print one JSON object per line on stdout:
//!
//! ```text
//! {"type":"progress","percent":40}
//! {"type":"log","message":"Outlining slides"}
//! {"type":"artifact","title":"Slides","body":"...","content_type":"slides"}
//! {"type":"completed"}
//! {"type":"error","message":"quota exceeded"}
//! ```

use crate::generators::base::{
    ContentGenerator, GenerationRequest, GeneratorError, GeneratorEvent, GeneratorResult,
    GeneratorStream,
};
use crate::generators::cli_executor::CliExecutor;
use async_trait::async_trait;
use ck_protocol::{ContentType, GeneratedArtifact, GeneratorProfile};
use serde::Deserialize;
use std::io::Write;
use tokio_stream::StreamExt;
use tracing::debug;

pub struct CommandGenerator {
    name: String,
    command: String,
    args: Vec<String>,
    model: String,
    system_prompt: String,
    working_dir: String,
}

impl CommandGenerator {
    /// Builds a generator from a profile that names a `command`.
    ///
    /// # Errors
    ///
    /// Returns `GeneratorError::NotAvailable` if the profile has no command.
    pub fn from_profile(profile: &GeneratorProfile) -> GeneratorResult<Self> {
        let command = profile.command.clone().ok_or_else(|| {
            GeneratorError::NotAvailable(format!(
                "Generator '{}' does not define a command",
                profile.name
            ))
        })?;
        Ok(Self {
            name: profile.name.clone(),
            command,
            args: profile.args.clone(),
            model: profile.model.clone(),
            system_prompt: profile.system_prompt.clone(),
            working_dir: std::env::current_dir()
                .ok()
                .and_then(|p| p.to_str().map(|s| s.to_string()))
                .unwrap_or_else(|| ".".to_string()),
        })
    }

    pub fn with_working_dir(mut self, dir: impl Into<String>) -> Self {
        self.working_dir = dir.into();
        self
    }

    fn write_input_file(
        &self,
        request: &GenerationRequest,
    ) -> GeneratorResult<tempfile::NamedTempFile> {
        let input = serde_json::json!({
            "system_prompt": self.system_prompt,
            "request": request,
        });

        let mut file = tempfile::NamedTempFile::new()
            .map_err(|e| GeneratorError::Execution(format!("Failed to create temp file: {}", e)))?;
        serde_json::to_writer(&mut file, &input)
            .map_err(|e| GeneratorError::Execution(format!("Failed to write request: {}", e)))?;
        file.flush()
            .map_err(|e| GeneratorError::Execution(format!("Failed to flush request: {}", e)))?;
        Ok(file)
    }
}

#[async_trait]
impl ContentGenerator for CommandGenerator {
    async fn check_availability(&self) -> bool {
        which::which(&self.command).is_ok()
    }

    async fn generate(&self, request: &GenerationRequest) -> GeneratorResult<GeneratorStream> {
        let input_file = self.write_input_file(request)?;
        let input_path = input_file
            .path()
            .to_str()
            .ok_or_else(|| GeneratorError::Execution("Invalid input file path".to_string()))?
            .to_string();

        let mut args = self.args.clone();
        if !self.model.is_empty() {
            args.push("--model".to_string());
            args.push(self.model.clone());
        }
        args.push("--input".to_string());
        args.push(input_path);

        debug!(generator = %self.name, command = %self.command, step = %request.step.id, "spawning generator");
        let mut lines = CliExecutor::execute(self.command.clone(), args, self.working_dir.clone());

        let stream = async_stream::stream! {
            // The process reads the file, so it lives as long as the stream.
            let _input_file = input_file;
            while let Some(line) = lines.next().await {
                match line {
                    Ok(value) => {
                        if let Some(event) = convert_line(value) {
                            yield event;
                        }
                    }
                    Err(e) => yield Err(e),
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireEvent {
    Progress {
        percent: i64,
    },
    Log {
        message: String,
    },
    Artifact {
        title: String,
        body: String,
        #[serde(default)]
        content_type: Option<ContentType>,
    },
    Completed,
    Error {
        message: String,
    },
}

/// Converts one JSON line. Unknown message types are ignored.
fn convert_line(value: serde_json::Value) -> Option<GeneratorResult<GeneratorEvent>> {
    let known = value
        .get("type")
        .and_then(|t| t.as_str())
        .is_some_and(|t| matches!(t, "progress" | "log" | "artifact" | "completed" | "error"));
    if !known {
        return None;
    }

    let event = match serde_json::from_value::<WireEvent>(value) {
        Ok(event) => event,
        Err(e) => {
            return Some(Err(GeneratorError::StreamParse(format!(
                "Malformed generator message: {}",
                e
            ))))
        }
    };

    Some(match event {
        WireEvent::Progress { percent } => Ok(GeneratorEvent::Progress(percent.clamp(0, 100) as u8)),
        WireEvent::Log { message } => Ok(GeneratorEvent::Log(message)),
        WireEvent::Artifact {
            title,
            body,
            content_type,
        } => Ok(GeneratorEvent::Artifact(GeneratedArtifact {
            content_type,
            title,
            body,
        })),
        WireEvent::Completed => Ok(GeneratorEvent::Completed),
        WireEvent::Error { message } => Err(GeneratorError::Backend(message)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile(command: Option<&str>) -> GeneratorProfile {
        GeneratorProfile {
            name: "lesson-writer".to_string(),
            description: "Drafts lessons".to_string(),
            provider: "local".to_string(),
            model: "small".to_string(),
            command: command.map(str::to_string),
            args: vec![],
            system_prompt: "You write lessons.".to_string(),
        }
    }

    #[test]
    fn test_profile_without_command_is_rejected() {
        assert!(matches!(
            CommandGenerator::from_profile(&profile(None)),
            Err(GeneratorError::NotAvailable(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let generator =
            CommandGenerator::from_profile(&profile(Some("definitely-not-installed-ck-gen")))
                .expect("profile");
        assert!(!generator.check_availability().await);
    }

    #[test]
    fn test_convert_progress_is_clamped() {
        assert_eq!(
            convert_line(json!({"type": "progress", "percent": 140})),
            Some(Ok(GeneratorEvent::Progress(100)))
        );
    }

    #[test]
    fn test_convert_artifact_with_content_type() {
        let event = convert_line(json!({
            "type": "artifact",
            "title": "Quiz",
            "body": "1. What is lava?",
            "content_type": "quiz"
        }));
        match event {
            Some(Ok(GeneratorEvent::Artifact(a))) => {
                assert_eq!(a.content_type, Some(ContentType::Quiz));
                assert_eq!(a.title, "Quiz");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_convert_error_and_unknown() {
        assert_eq!(
            convert_line(json!({"type": "error", "message": "quota exceeded"})),
            Some(Err(GeneratorError::Backend("quota exceeded".to_string())))
        );
        assert_eq!(convert_line(json!({"type": "heartbeat"})), None);
        assert!(matches!(
            convert_line(json!({"type": "log"})),
            Some(Err(GeneratorError::StreamParse(_)))
        ));
    }
}
