//! # ck-core
//!
//! Generation orchestration engine for curriculum-kit.
//!
//! This crate provides:
//! - Configuration loading from the `.curriculum-kit/` directory
//! - Content generator abstraction and backends
//! - Step progress tracking with ordered, cancellable transitions
//! - Workflow execution, quick actions and batch generation
//! - The Op/Event service a front-end drives
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and management
//! - [`generators`]: Generator trait, backends and the registry
//! - [`progress`]: Step state machine and consumer-side progress feed
//! - [`workflow`]: Step planning and execution
//! - [`batch`]: Multi-lesson batch runs
//! - [`service`]: Op dispatch and workflow registry
//! - [`validation`]: Lesson parameter checks
//! - [`init`]: Project scaffolding
//! - [`clock`]: Injectable time source

pub mod batch;
pub mod clock;
pub mod config;
pub mod generators;
pub mod init;
pub mod progress;
pub mod service;
pub mod validation;
pub mod workflow;

pub use service::GenerationService;
