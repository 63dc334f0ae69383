//! Configuration file loader for the `.curriculum-kit/` directory structure.
//!
//! This module loads and parses every configuration file in the
//! `.curriculum-kit/` directory:
//! - `config.toml`: Global settings
//! - `generators/*.md`: Generator profiles with YAML front matter
//! - `pipelines/*.yaml`: Pipeline templates

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use crate::config::models::AppConfig;
use crate::config::CONFIG_DIR;
use ck_protocol::config_models::GlobalConfig;
use ck_protocol::generator_models::GeneratorProfile;
use ck_protocol::template_models::PipelineTemplate;
use gray_matter::engine::YAML;
use gray_matter::Matter;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Loads all configuration from the `.curriculum-kit/` directory.
///
/// # Arguments
///
/// * `root` - Directory containing the `.curriculum-kit/` folder
///
/// # Returns
///
/// An `AppConfig` with everything that was found. Missing directories or
/// files fall back to defaults rather than failing.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - Files exist but cannot be read
/// - Files have invalid syntax (TOML, YAML, or Markdown front matter)
/// - A template has no steps or repeats a step id
/// - Two templates or two generator profiles share a name
///
/// # Example
///
/// ```rust,no_run
/// use ck_core::config::loader::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// println!("Loaded {} generators", config.generators.len());
/// # Ok(())
/// # }
/// ```
pub async fn load_config(root: &Path) -> ConfigResult<AppConfig> {
    let config_dir = root.join(CONFIG_DIR);

    if !config_dir.exists() {
        debug!(path = %config_dir.display(), "no config directory, using defaults");
        return Ok(AppConfig::default());
    }

    let global = load_global_config(&config_dir)?;
    let generators = load_generators(&config_dir)?;
    let pipelines = load_pipelines(&config_dir)?;

    debug!(
        generators = generators.len(),
        pipelines = pipelines.len(),
        "configuration loaded"
    );

    Ok(AppConfig {
        global,
        generators,
        pipelines,
    })
}

/// Loads global configuration from `config.toml`.
fn load_global_config(config_dir: &Path) -> ConfigResult<GlobalConfig> {
    let config_path = config_dir.join("config.toml");

    if !config_path.exists() {
        return Ok(GlobalConfig::default());
    }

    let content = read_file(&config_path)?;
    toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
        path: config_path,
        source,
    })
}

/// Loads all generator profiles from `generators/*.md`.
fn load_generators(config_dir: &Path) -> ConfigResult<Vec<GeneratorProfile>> {
    let dir = config_dir.join("generators");
    let mut generators: Vec<GeneratorProfile> = Vec::new();

    for path in files_with_extension(&dir, &["md"])? {
        let content = read_file(&path)?;

        let matter = Matter::<YAML>::new();
        let result = matter.parse(&content);

        let mut profile: GeneratorProfile = result
            .data
            .ok_or_else(|| ConfigError::MarkdownParse {
                path: path.clone(),
                reason: "Missing YAML front matter".to_string(),
            })?
            .deserialize()
            .map_err(|e| ConfigError::MarkdownParse {
                path: path.clone(),
                reason: format!("Failed to deserialize front matter: {e}"),
            })?;

        // The markdown body is the generator's system prompt.
        profile.system_prompt = result.content;

        if generators.iter().any(|g| g.name == profile.name) {
            return Err(ConfigError::DuplicateGenerator {
                path,
                name: profile.name,
            });
        }
        generators.push(profile);
    }

    Ok(generators)
}

/// Loads all pipeline templates from `pipelines/*.yaml` and `*.yml`.
fn load_pipelines(config_dir: &Path) -> ConfigResult<Vec<PipelineTemplate>> {
    let dir = config_dir.join("pipelines");
    let mut pipelines: Vec<PipelineTemplate> = Vec::new();

    for path in files_with_extension(&dir, &["yaml", "yml"])? {
        let content = read_file(&path)?;

        let template: PipelineTemplate =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::YamlParse {
                path: path.clone(),
                source,
            })?;

        validate_template(&template).map_err(|reason| ConfigError::InvalidPipeline {
            path: path.clone(),
            reason,
        })?;

        if pipelines.iter().any(|p| p.name == template.name) {
            return Err(ConfigError::DuplicatePipeline {
                path,
                name: template.name,
            });
        }
        pipelines.push(template);
    }

    Ok(pipelines)
}

fn validate_template(template: &PipelineTemplate) -> Result<(), String> {
    if template.steps.is_empty() {
        return Err(format!("Pipeline '{}' has no steps", template.name));
    }
    let mut seen = HashSet::new();
    for step in &template.steps {
        if !seen.insert(step.id.as_str()) {
            return Err(format!(
                "Pipeline '{}' repeats step id '{}'",
                template.name, step.id
            ));
        }
    }
    Ok(())
}

/// Direct children of `dir` with one of `extensions`, sorted by file name.
/// A missing directory yields no files.
fn files_with_extension(dir: &Path, extensions: &[&str]) -> ConfigResult<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| ConfigError::DirectoryWalk {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| extensions.contains(&ext));
        if matches {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

fn read_file(path: &Path) -> ConfigResult<String> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}
