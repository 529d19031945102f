//! Bundled plugins.
//!
//! A plugin is anything that registers handlers on a
//! [`HookRegistry`](crate::HookRegistry). [`register_by_name`] maps the
//! names used in configuration to the bundled implementations.

mod property_sorter;

pub use property_sorter::PropertySorter;

use crate::hooks::HookRegistry;

/// Names of the bundled plugins.
pub const BUNDLED: &[&str] = &["property-sorter"];

/// Register a bundled plugin by name.
///
/// Returns `false` when no plugin has that name.
pub fn register_by_name(name: &str, hooks: &mut HookRegistry) -> bool {
    match name {
        "property-sorter" => {
            PropertySorter::new().register(hooks);
            true
        }
        _ => false,
    }
}
