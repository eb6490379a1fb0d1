//! Menu filtering by identity.
//!
//! An entry is visible when the identity may `view` its module. Administrators
//! see everything; that override lives in the evaluator, ahead of any grant
//! lookup. Sections left with no visible entries are omitted. Nothing is
//! memoized: call again after the identity changes.

use serde::Serialize;

use metroconsole_auth::{Action, Identity, can};

use crate::catalog::{MenuCatalog, MenuEntry};

/// A section as rendered for one identity.
///
/// Serialized as `{section, entries[{id, label, module}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisibleSection<'a> {
    #[serde(rename = "section")]
    pub title: &'a str,
    pub entries: Vec<&'a MenuEntry>,
}

pub fn is_entry_visible(entry: &MenuEntry, identity: Option<&Identity>) -> bool {
    can(identity, &entry.module, Action::View)
}

/// Visible sections in declaration order.
pub fn visible_entries<'a>(
    catalog: &'a MenuCatalog,
    identity: Option<&Identity>,
) -> Vec<VisibleSection<'a>> {
    catalog
        .sections()
        .iter()
        .filter_map(|section| {
            let entries: Vec<_> = section
                .entries
                .iter()
                .filter(|entry| is_entry_visible(entry, identity))
                .collect();
            (!entries.is_empty()).then_some(VisibleSection {
                title: &section.title,
                entries,
            })
        })
        .collect()
}

/// Landing entry after login: the first visible entry, if any.
pub fn first_visible_entry<'a>(
    catalog: &'a MenuCatalog,
    identity: Option<&Identity>,
) -> Option<&'a MenuEntry> {
    catalog
        .entries()
        .find(|entry| is_entry_visible(entry, identity))
}
