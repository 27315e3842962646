//! Process-wide type metadata cache
//!
//! Short type names are derived from `std::any::type_name` by stripping module
//! paths, which is cheap but not free. The results are memoized per `TypeId`
//! and dropped at the end of every refresh so stale descriptors never outlive
//! the context that needed them.

use dashmap::DashMap;
use std::any::TypeId;
use std::sync::{Arc, LazyLock};

static SHORT_NAMES: LazyLock<DashMap<TypeId, Arc<str>>> = LazyLock::new(DashMap::new);

/// Short, module-less rendering of a type name, e.g. `Vec<String>` for
/// `alloc::vec::Vec<alloc::string::String>`.
pub fn short_type_name(id: TypeId, full_name: &'static str) -> Arc<str> {
    if let Some(cached) = SHORT_NAMES.get(&id) {
        return Arc::clone(cached.value());
    }
    let short: Arc<str> = strip_paths(full_name).into();
    SHORT_NAMES.insert(id, Arc::clone(&short));
    short
}

/// Drop every cached descriptor.
pub fn clear_caches() {
    SHORT_NAMES.clear();
    tracing::trace!("Cleared introspection caches");
}

/// Number of cached descriptors.
pub fn cached_entries() -> usize {
    SHORT_NAMES.len()
}

fn strip_paths(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut segment = String::new();
    for ch in name.chars() {
        match ch {
            ':' => segment.clear(),
            '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | ';' | '&' => {
                out.push_str(&segment);
                segment.clear();
                out.push(ch);
            }
            _ => segment.push(ch),
        }
    }
    out.push_str(&segment);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe;

    #[test]
    fn test_strip_paths() {
        assert_eq!(strip_paths("alloc::string::String"), "String");
        assert_eq!(
            strip_paths("alloc::vec::Vec<alloc::string::String>"),
            "Vec<String>"
        );
        assert_eq!(strip_paths("(u8, core::option::Option<i32>)"), "(u8, Option<i32>)");
    }

    #[test]
    fn test_short_type_name_is_memoized() {
        let first = short_type_name(TypeId::of::<Probe>(), std::any::type_name::<Probe>());
        let second = short_type_name(TypeId::of::<Probe>(), std::any::type_name::<Probe>());
        assert_eq!(&*first, "Probe");
        assert_eq!(first, second);
    }
}
