//! `metroconsole-navigation` — which menu entries an identity may see.

pub mod catalog;
pub mod gate;

pub use catalog::{MenuCatalog, MenuEntry, MenuSection};
pub use gate::{VisibleSection, first_visible_entry, is_entry_visible, visible_entries};
