/// Curator - terminal operations console for R2R collections.
///
/// Library crate providing the API client, list/filter/selection state
/// machinery, and the ratatui front end.

pub mod client;
pub mod config;
pub mod logging;
pub mod state;
pub mod tui;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
