//! Directory structure and file generation for `.curriculum-kit` initialization.

use super::error::{InitError, InitResult};
use super::templates::{get_template, list_templates};
use crate::config::CONFIG_DIR;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Templates written in minimal mode.
const MINIMAL_TEMPLATES: &[&str] = &[
    "config.toml",
    "generators/mock-writer.md",
    "pipelines/standard-lesson.yaml",
];

/// Options for initializing a `.curriculum-kit` directory.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Directory in which `.curriculum-kit` is created.
    pub target_dir: PathBuf,

    /// Overwrite an existing `.curriculum-kit` directory.
    pub force: bool,

    /// Only write the offline generator and the standard lesson pipeline.
    pub minimal: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            target_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            force: false,
            minimal: false,
        }
    }
}

/// Generates a `.curriculum-kit` directory from the embedded templates.
///
/// ```text
/// .curriculum-kit/
/// ├── config.toml
/// ├── generators/
/// │   ├── mock-writer.md
/// │   └── lesson-writer.md (unless minimal)
/// └── pipelines/
///     ├── standard-lesson.yaml
///     └── quick-review.yaml (unless minimal)
/// ```
///
/// # Returns
///
/// The paths of the files written.
///
/// # Errors
///
/// - `DirectoryExists` if the directory exists and `force` is not set
/// - `TemplateNotFound` if an embedded template is missing
/// - `DirectoryCreate` / `FileWrite` on file system failures
pub async fn generate_curriculum_kit_structure(options: InitOptions) -> InitResult<Vec<PathBuf>> {
    let config_dir = options.target_dir.join(CONFIG_DIR);

    if config_dir.exists() && !options.force {
        return Err(InitError::DirectoryExists(config_dir));
    }

    for sub in ["generators", "pipelines"] {
        let path = config_dir.join(sub);
        fs::create_dir_all(&path).map_err(|source| InitError::DirectoryCreate { path, source })?;
    }

    let templates: Vec<String> = if options.minimal {
        MINIMAL_TEMPLATES.iter().map(|s| s.to_string()).collect()
    } else {
        let mut all = vec!["config.toml".to_string()];
        all.extend(list_templates("generators/"));
        all.extend(list_templates("pipelines/"));
        all
    };

    let mut written = Vec::with_capacity(templates.len());
    for template in &templates {
        written.push(write_template_file(&config_dir, template)?);
    }

    info!(path = %config_dir.display(), files = written.len(), "initialized curriculum-kit");
    Ok(written)
}

fn write_template_file(config_dir: &Path, template_path: &str) -> InitResult<PathBuf> {
    let content = get_template(template_path)
        .ok_or_else(|| InitError::TemplateNotFound(template_path.to_string()))?;

    let target_path = config_dir.join(template_path);
    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent).map_err(|source| InitError::DirectoryCreate {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(&target_path, content).map_err(|source| InitError::FileWrite {
        path: target_path.clone(),
        source,
    })?;
    Ok(target_path)
}
