use std::path::PathBuf;
use thiserror::Error;

/// Why `.curriculum-kit/` could not be loaded. Every variant names the
/// offending file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid project settings in {path}: {source}")]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid pipeline template {path}: {source}")]
    YamlParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// Generator profiles are Markdown files with a YAML header.
    #[error("invalid generator profile {path}: {reason}")]
    MarkdownParse { path: PathBuf, reason: String },

    #[error("cannot list {path}: {source}")]
    DirectoryWalk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("generator '{name}' in {path} is already defined")]
    DuplicateGenerator { path: PathBuf, name: String },

    #[error("pipeline '{name}' in {path} is already defined")]
    DuplicatePipeline { path: PathBuf, name: String },

    /// Parsed, but unusable: no steps or a repeated step id.
    #[error("pipeline template {path} is unusable: {reason}")]
    InvalidPipeline { path: PathBuf, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
