//! View modules, one per screen plus shared overlays.

pub mod collection;
pub mod collections;
pub mod switcher;

pub use collection::{CollectionViewState, DetailResult};
pub use collections::{OverviewResult, OverviewState};
pub use switcher::{SwitcherResult, SwitcherState};
