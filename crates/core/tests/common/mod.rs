//! Common test utilities shared by the integration tests.
//!
//! - Fixtures (lesson configs, engines, project directories)
//! - Event assertions
//! - Test-only generators with controllable behavior

pub mod assertions;
pub mod fixtures;
pub mod generators;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use generators::*;
