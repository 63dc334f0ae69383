//! Generator registry.
//!
//! `GeneratorManager` holds every configured generator by name, resolves the
//! generator for a step (explicit name, then the configured default), and
//! falls back to a designated generator when the chosen one is unavailable.

use crate::config::models::AppConfig;
use crate::generators::adapters::MockGenerator;
use crate::generators::base::{
    ContentGenerator, GenerationRequest, GeneratorError, GeneratorResult, GeneratorStream,
};
use crate::generators::factory::GeneratorFactory;
use ck_protocol::GeneratorProfile;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Name under which the built-in mock is registered when nothing is configured.
pub const BUILTIN_MOCK: &str = "mock";

#[derive(Default)]
pub struct GeneratorManager {
    generators: HashMap<String, Arc<dyn ContentGenerator>>,
    providers: HashMap<String, String>,
    default_name: Option<String>,
    fallback_name: Option<String>,
}

impl GeneratorManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates generators for every profile. Profiles the factory rejects are
    /// logged and skipped.
    pub fn from_profiles(profiles: &[GeneratorProfile]) -> Self {
        let mut manager = Self::new();
        for profile in profiles {
            match GeneratorFactory::create(profile) {
                Ok(generator) => {
                    manager.insert(&profile.name, &profile.provider, generator);
                }
                Err(e) => warn!(generator = %profile.name, error = %e, "skipping generator profile"),
            }
        }
        manager
    }

    /// Builds the registry for a loaded project configuration.
    ///
    /// Without any usable profile the built-in mock generator is registered
    /// and becomes the default.
    pub fn from_app_config(config: &AppConfig) -> Self {
        let mut manager = Self::from_profiles(&config.generators);
        manager.default_name = config.global.default_generator.clone();

        if manager.generators.is_empty() {
            info!("no generator profiles configured, using the built-in mock generator");
            manager.insert(BUILTIN_MOCK, "mock", Arc::new(MockGenerator::success()));
            manager.default_name = Some(BUILTIN_MOCK.to_string());
        }
        manager
    }

    pub fn register(
        mut self,
        name: impl Into<String>,
        provider: impl Into<String>,
        generator: Arc<dyn ContentGenerator>,
    ) -> Self {
        self.insert(&name.into(), &provider.into(), generator);
        self
    }

    pub fn with_default(mut self, name: impl Into<String>) -> Self {
        self.default_name = Some(name.into());
        self
    }

    pub fn with_fallback(mut self, name: impl Into<String>) -> Self {
        self.fallback_name = Some(name.into());
        self
    }

    fn insert(&mut self, name: &str, provider: &str, generator: Arc<dyn ContentGenerator>) {
        self.generators.insert(name.to_string(), generator);
        self.providers.insert(name.to_string(), provider.to_string());
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ContentGenerator>> {
        self.generators.get(name).cloned()
    }

    /// Name of the first generator registered for `provider`, sorted by name.
    pub fn find_by_provider(&self, provider: &str) -> Option<String> {
        let mut names: Vec<_> = self
            .providers
            .iter()
            .filter(|(_, p)| p.eq_ignore_ascii_case(provider))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names.into_iter().next()
    }

    /// Picks a generator name: the requested one, else the default, else the
    /// only registered generator.
    pub fn resolve_name(&self, requested: Option<&str>) -> GeneratorResult<String> {
        if let Some(name) = requested.or(self.default_name.as_deref()) {
            return Ok(name.to_string());
        }
        if self.generators.len() == 1 {
            if let Some(name) = self.generators.keys().next() {
                return Ok(name.clone());
            }
        }
        Err(GeneratorError::NotAvailable(
            "No generator requested and no default generator configured".to_string(),
        ))
    }

    /// Starts generation on the resolved generator, using the fallback if the
    /// primary is unavailable.
    ///
    /// # Errors
    ///
    /// `GeneratorError::NotAvailable` when the generator is unknown or
    /// neither it nor the fallback is available.
    pub async fn generate(
        &self,
        requested: Option<&str>,
        request: &GenerationRequest,
    ) -> GeneratorResult<GeneratorStream> {
        let name = self.resolve_name(requested)?;
        let Some(generator) = self.get(&name) else {
            return Err(GeneratorError::NotAvailable(format!(
                "Generator '{}' not found in registry",
                name
            )));
        };

        if generator.check_availability().await {
            return generator.generate(request).await;
        }

        if let Some(fallback_name) = self.fallback_name.as_deref().filter(|f| *f != name) {
            if let Some(fallback) = self.get(fallback_name) {
                if fallback.check_availability().await {
                    warn!(generator = %name, fallback = %fallback_name, "generator unavailable, using fallback");
                    return fallback.generate(request).await;
                }
            }
        }

        Err(GeneratorError::NotAvailable(format!(
            "Generator '{}' is not available and no fallback succeeded",
            name
        )))
    }

    pub fn list_generators(&self) -> Vec<String> {
        let mut names: Vec<_> = self.generators.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn has_generator(&self, name: &str) -> bool {
        self.generators.contains_key(name)
    }

    pub fn default_generator(&self) -> Option<&str> {
        self.default_name.as_deref()
    }
}
