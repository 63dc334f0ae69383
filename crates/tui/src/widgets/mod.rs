//! TUI widgets.

pub mod command_composer;
pub mod dashboard;
pub mod detail_view;
pub mod progress_indicator;
pub mod status_bar;

pub use command_composer::CommandComposer;
pub use detail_view::DetailView;
pub use progress_indicator::{IndicatorActions, ProgressIndicator};
pub use status_bar::StatusBar;

/// Whether a widget handled a key. Unconsumed keys fall through to the
/// app-level bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Consumed,
    NotConsumed,
}
