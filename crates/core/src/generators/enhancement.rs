//! Improvement suggestions for imported lesson material.

use crate::generators::base::{GenerationRequest, GeneratorError, GeneratorEvent, GeneratorResult};
use crate::generators::manager::GeneratorManager;
use ck_protocol::{EnhancementSuggestions, GenerationConfig, StepDefinition};
use tokio_stream::StreamExt;
use tracing::info;

pub const ENHANCEMENT_STEP_ID: &str = "enhancement_suggestions";

/// Asks the generator registered for `provider_id` to review imported
/// content.
///
/// The generator receives the content and `analysis` as request input and
/// must return an artifact whose body is an `EnhancementSuggestions` JSON
/// object.
///
/// # Arguments
///
/// * `manager` - Generator registry
/// * `imported_content` - Raw text of the imported material
/// * `analysis` - Structured analysis of that material
/// * `provider_id` - Provider name, or a generator name
///
/// # Errors
///
/// Returns the generator's error, or `StreamParse` if no artifact arrives or
/// its body is not valid suggestions JSON.
pub async fn generate_enhancement_suggestions(
    manager: &GeneratorManager,
    imported_content: &str,
    analysis: &serde_json::Value,
    provider_id: &str,
) -> GeneratorResult<EnhancementSuggestions> {
    let generator = manager
        .find_by_provider(provider_id)
        .unwrap_or_else(|| provider_id.to_string());

    let topic = analysis
        .get("topic")
        .and_then(|t| t.as_str())
        .unwrap_or("Imported content");
    let audience = analysis
        .get("audience")
        .and_then(|a| a.as_str())
        .unwrap_or_default();

    let request = GenerationRequest::new(
        StepDefinition::new(ENHANCEMENT_STEP_ID, "Suggest enhancements"),
        GenerationConfig::new(topic, audience),
    )
    .with_input(serde_json::json!({
        "imported_content": imported_content,
        "analysis": analysis,
    }));

    info!(generator = %generator, "requesting enhancement suggestions");
    let mut stream = manager.generate(Some(&generator), &request).await?;

    let mut body = None;
    while let Some(event) = stream.next().await {
        match event? {
            GeneratorEvent::Artifact(artifact) => body = Some(artifact.body),
            GeneratorEvent::Completed => break,
            GeneratorEvent::Progress(_) | GeneratorEvent::Log(_) => {}
        }
    }

    let body = body.ok_or_else(|| {
        GeneratorError::StreamParse("Generator returned no suggestions".to_string())
    })?;
    serde_json::from_str(&body)
        .map_err(|e| GeneratorError::StreamParse(format!("Invalid suggestions payload: {}", e)))
}
