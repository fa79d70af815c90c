//! UI-facing application state, kept separate from rendering.
//!
//! Everything in this module is plain data plus pure transitions: loads are
//! reduced from channel events, visible rows are derived on demand, and no
//! function here touches the terminal or the network.

pub mod filter;
pub mod list;
pub mod loader;
pub mod selection;

pub use filter::{visible_documents, DocumentFilters, SortKey, SortOrder, SortSpec};
pub use list::{ListEvent, LoadHandle, LoadOutcome, ResourceList};
pub use loader::{run_page_loader, spawn_page_loader, FETCH_PAGE_SIZE};
pub use selection::Selection;
