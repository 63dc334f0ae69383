//! # ck-protocol
//!
//! Core protocol definitions and data models for curriculum-kit.
//!
//! This crate defines all shared data structures used for:
//! - Lesson generation requests and quick actions
//! - Generation step / pipeline progress state
//! - Batch generation options and results
//! - Configuration file parsing (TOML config, YAML templates, Markdown generator profiles)
//! - Communication between a front-end and the core generation service
//!
//! ## Modules
//!
//! - [`step_models`]: `GenerationStep` and its status
//! - [`progress_models`]: `GenerationProgress` aggregate snapshots
//! - [`generation_models`]: Lesson parameters, content types, quick actions
//! - [`batch_models`]: Batch options, outcomes and progress
//! - [`feedback_models`]: Status toasts
//! - [`generator_models`]: Generator profiles from `generators/*.md`
//! - [`template_models`]: Pipeline templates from `pipelines/*.yaml`
//! - [`config_models`]: Global configuration from config.toml
//! - [`ipc`]: Operations and Events
//!
//! ## Design Principles
//!
//! - Minimal dependencies: only serde, ts-rs, uuid and chrono
//! - TypeScript generation: all types derive `TS` so the desktop UI shares the shapes
//! - Independent compilation: no dependencies on other curriculum-kit crates

pub mod batch_models;
pub mod config_models;
pub mod feedback_models;
pub mod generation_models;
pub mod generator_models;
pub mod ipc;
pub mod progress_models;
pub mod step_models;
pub mod template_models;

// Re-export all public types for convenience
pub use batch_models::*;
pub use config_models::*;
pub use feedback_models::*;
pub use generation_models::*;
pub use generator_models::*;
pub use ipc::*;
pub use progress_models::*;
pub use step_models::*;
pub use template_models::*;
