//! Terminal UI: Elm-style event loop, views, and shared chrome.

pub mod app;
pub mod events;
pub mod services;
pub mod theme;
pub mod views;
pub mod widgets;

pub use app::AppState;
pub use events::{Action, AppEvent, Focus, Notification, NotificationLevel};
pub use services::Services;
