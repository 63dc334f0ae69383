//! Generator backends.

pub mod command_generator;
pub mod mock_generator;

pub use command_generator::CommandGenerator;
pub use mock_generator::MockGenerator;
