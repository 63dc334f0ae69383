//! Content generator abstraction layer.
//!
//! - [`base`]: the `ContentGenerator` trait, requests, events and errors
//! - [`adapters`]: mock and command-line backends
//! - [`cli_executor`]: JSON-Lines subprocess runner
//! - [`factory`]: builds a generator from a `GeneratorProfile`
//! - [`manager`]: registry with default and fallback resolution
//! - [`enhancement`]: suggestions for imported material

pub mod adapters;
pub mod base;
pub mod cli_executor;
pub mod enhancement;
pub mod factory;
pub mod manager;

pub use base::{
    ContentGenerator, GenerationRequest, GeneratorError, GeneratorEvent, GeneratorResult,
    GeneratorStream,
};
pub use manager::GeneratorManager;
