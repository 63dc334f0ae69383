//! `curriculum init`: writes a starter `.curriculum-kit/` into a project.
//!
//! The starter files are embedded in the binary at build time from the
//! workspace `templates/` directory. A full init writes `config.toml`, every
//! generator profile and every pipeline template. A minimal init writes only
//! what the offline `mock-writer` generator and the `standard-lesson`
//! pipeline need.
//!
//! ```no_run
//! use ck_core::init::{generate_curriculum_kit_structure, InitOptions};
//!
//! # async fn demo() -> ck_core::init::InitResult<()> {
//! let written = generate_curriculum_kit_structure(InitOptions {
//!     target_dir: "course-material".into(),
//!     force: false,
//!     minimal: true,
//! })
//! .await?;
//! assert_eq!(written.len(), 3);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod generator;
pub mod templates;

pub use error::{InitError, InitResult};
pub use generator::{generate_curriculum_kit_structure, InitOptions};
pub use templates::{get_template, list_templates};
