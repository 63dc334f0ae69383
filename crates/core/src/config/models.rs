//! Unified configuration loaded from `.curriculum-kit/`.

use ck_protocol::config_models::GlobalConfig;
use ck_protocol::generator_models::GeneratorProfile;
use ck_protocol::template_models::PipelineTemplate;

/// Everything found under `.curriculum-kit/`.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Settings from `config.toml`.
    pub global: GlobalConfig,

    /// Profiles from `generators/*.md`.
    pub generators: Vec<GeneratorProfile>,

    /// Templates from `pipelines/*.yaml`.
    pub pipelines: Vec<PipelineTemplate>,
}

impl AppConfig {
    pub fn template(&self, name: &str) -> Option<&PipelineTemplate> {
        self.pipelines.iter().find(|p| p.name == name)
    }

    pub fn generator(&self, name: &str) -> Option<&GeneratorProfile> {
        self.generators.iter().find(|g| g.name == name)
    }
}
