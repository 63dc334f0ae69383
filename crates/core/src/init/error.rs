use std::path::PathBuf;
use thiserror::Error;

pub type InitResult<T> = Result<T, InitError>;

#[derive(Debug, Error)]
pub enum InitError {
    /// `init` without `--force` never touches an existing project.
    #[error("{} already exists. Use --force to overwrite.", .0.display())]
    DirectoryExists(PathBuf),

    /// The embedded starter file set is missing an entry.
    #[error("no starter file named '{0}'")]
    TemplateNotFound(String),

    #[error("cannot create {}: {source}", path.display())]
    DirectoryCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}
