//! Factory for creating generator instances from profiles.

use crate::generators::adapters::{CommandGenerator, MockGenerator};
use crate::generators::base::ContentGenerator;
use anyhow::{bail, Result};
use ck_protocol::GeneratorProfile;
use std::sync::Arc;

pub struct GeneratorFactory;

impl GeneratorFactory {
    /// Creates a generator for `profile`.
    ///
    /// Provider `mock` yields a [`MockGenerator`]; the model names
    /// `failing` and `unavailable` select the matching mock behaviour. Any
    /// other provider needs a `command` and yields a [`CommandGenerator`].
    ///
    /// # Errors
    ///
    /// Fails when a non-mock profile has no command to run.
    pub fn create(profile: &GeneratorProfile) -> Result<Arc<dyn ContentGenerator>> {
        if profile.provider.eq_ignore_ascii_case("mock") {
            let generator = match profile.model.as_str() {
                "failing" => MockGenerator::failing(),
                "unavailable" => MockGenerator::unavailable(),
                _ => MockGenerator::success(),
            };
            return Ok(Arc::new(generator));
        }

        if profile.command.is_none() {
            bail!(
                "Generator '{}' (provider '{}') has no command configured",
                profile.name,
                profile.provider
            );
        }
        Ok(Arc::new(CommandGenerator::from_profile(profile)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(provider: &str, model: &str, command: Option<&str>) -> GeneratorProfile {
        GeneratorProfile {
            name: "test".to_string(),
            description: String::new(),
            provider: provider.to_string(),
            model: model.to_string(),
            command: command.map(str::to_string),
            args: vec![],
            system_prompt: String::new(),
        }
    }

    #[tokio::test]
    async fn test_factory_create_mock() {
        let generator = GeneratorFactory::create(&profile("mock", "any", None)).expect("mock");
        assert!(generator.check_availability().await);

        let unavailable =
            GeneratorFactory::create(&profile("mock", "unavailable", None)).expect("mock");
        assert!(!unavailable.check_availability().await);
    }

    #[test]
    fn test_factory_requires_command() {
        assert!(GeneratorFactory::create(&profile("openai", "gpt-4o", None)).is_err());
        assert!(GeneratorFactory::create(&profile("openai", "gpt-4o", Some("lesson-gen"))).is_ok());
    }
}
