//! Configuration Module
//!
//! The [`Environment`] is an ordered list of [`PropertySource`]s. Lookups go
//! through the sources in order and the first match wins.

mod property_source;

pub use property_source::PropertySource;

use crate::error::{ContextError, Result};
use parking_lot::RwLock;
use std::sync::Arc;

/// Property view of a context
#[derive(Clone, Default)]
pub struct Environment {
    sources: Arc<RwLock<Vec<PropertySource>>>,
    required: Arc<RwLock<Vec<String>>>,
}

impl Environment {
    /// Environment backed by the process environment
    pub fn new() -> Self {
        let environment = Self::empty();
        environment.add_last(PropertySource::system_environment());
        environment
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a source with the highest precedence, replacing one of the same name
    pub fn add_first(&self, source: PropertySource) {
        let mut sources = self.sources.write();
        sources.retain(|s| s.name() != source.name());
        sources.insert(0, source);
    }

    /// Add a source with the lowest precedence, replacing one of the same name
    pub fn add_last(&self, source: PropertySource) {
        let mut sources = self.sources.write();
        sources.retain(|s| s.name() != source.name());
        sources.push(source);
    }

    pub fn property_source(&self, name: &str) -> Option<PropertySource> {
        self.sources.read().iter().find(|s| s.name() == name).cloned()
    }

    pub fn source_names(&self) -> Vec<String> {
        self.sources.read().iter().map(|s| s.name().to_string()).collect()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.sources.read().iter().find_map(|s| s.get(key))
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.sources.read().iter().any(|s| s.contains(key))
    }

    /// Keys that must resolve when the context refreshes
    pub fn set_required_properties<I, S>(&self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut required = self.required.write();
        for key in keys {
            let key = key.into();
            if !required.contains(&key) {
                required.push(key);
            }
        }
    }

    pub fn validate_required_properties(&self) -> Result<()> {
        let missing: Vec<String> = self
            .required
            .read()
            .iter()
            .filter(|key| !self.contains(key))
            .cloned()
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ContextError::MissingRequiredProperties(missing))
        }
    }

    /// Append the parent's sources that are not present here yet
    pub fn merge(&self, parent: &Environment) {
        if Arc::ptr_eq(&self.sources, &parent.sources) {
            return;
        }
        let inherited = parent.sources.read().clone();
        let mut sources = self.sources.write();
        for source in inherited {
            if !sources.iter().any(|s| s.name() == source.name()) {
                sources.push(source);
            }
        }
    }

    /// Replace `${key}` and `${key:default}` placeholders.
    ///
    /// Placeholders that cannot be resolved are left untouched.
    pub fn resolve_placeholders(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                out.push_str(&rest[start..]);
                return out;
            };
            let expression = &after[..end];
            let (key, default) = match expression.split_once(':') {
                Some((key, default)) => (key, Some(default)),
                None => (expression, None),
            };
            match self.get(key.trim()).or_else(|| default.map(str::to_string)) {
                Some(value) => out.push_str(&value),
                None => out.push_str(&rest[start..start + 2 + end + 1]),
            }
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        out
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("sources", &self.source_names())
            .field("required", &*self.required.read())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn environment() -> Environment {
        let env = Environment::empty();
        env.add_last(PropertySource::from_map("defaults", [("db.pool", "4"), ("app.name", "orders")]));
        env.add_first(PropertySource::from_map("overrides", [("db.pool", "16")]));
        env
    }

    #[test]
    fn test_first_source_wins() {
        let env = environment();
        assert_eq!(env.get("db.pool").as_deref(), Some("16"));
        assert_eq!(env.get("app.name").as_deref(), Some("orders"));
        assert_eq!(env.source_names(), vec!["overrides", "defaults"]);
        assert_eq!(env.get_or("missing", "x"), "x");
    }

    #[test]
    fn test_system_environment_loaded() {
        let env = Environment::new();
        assert_eq!(env.source_names(), vec![PropertySource::SYSTEM_ENVIRONMENT]);
    }

    #[test]
    fn test_required_properties() {
        let env = environment();
        env.set_required_properties(["app.name"]);
        env.validate_required_properties().unwrap();

        env.set_required_properties(["db.url", "db.user"]);
        let err = env.validate_required_properties().unwrap_err();
        assert!(matches!(
            err,
            ContextError::MissingRequiredProperties(ref keys) if keys == &["db.url", "db.user"]
        ));
    }

    #[test]
    fn test_merge_appends_missing_sources() {
        let parent = Environment::empty();
        parent.add_last(PropertySource::from_map("shared", [("region", "eu-west-1")]));
        parent.add_last(PropertySource::from_map("defaults", [("app.name", "parent")]));

        let child = environment();
        child.merge(&parent);

        assert_eq!(child.source_names(), vec!["overrides", "defaults", "shared"]);
        assert_eq!(child.get("region").as_deref(), Some("eu-west-1"));
        assert_eq!(child.get("app.name").as_deref(), Some("orders"));
    }

    #[test]
    fn test_resolve_placeholders() {
        let env = environment();
        assert_eq!(
            env.resolve_placeholders("${app.name}:${db.pool}/${db.timeout:30}"),
            "orders:16/30"
        );
        assert_eq!(env.resolve_placeholders("${unknown} stays"), "${unknown} stays");
        assert_eq!(env.resolve_placeholders("open ${brace"), "open ${brace");
    }
}
