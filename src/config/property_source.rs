use dashmap::DashMap;
use serde_json::Value;
use std::env;
use std::sync::Arc;

/// A named set of properties
#[derive(Clone, Debug)]
pub struct PropertySource {
    name: Arc<str>,
    properties: Arc<DashMap<String, String>>,
}

impl PropertySource {
    pub const SYSTEM_ENVIRONMENT: &'static str = "systemEnvironment";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Arc::from(name.into()),
            properties: Arc::new(DashMap::new()),
        }
    }

    pub fn from_map<I, K, V>(name: impl Into<String>, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let source = Self::new(name);
        for (key, value) in properties {
            source.set(key, value);
        }
        source
    }

    /// Process environment variables
    pub fn system_environment() -> Self {
        Self::from_map(Self::SYSTEM_ENVIRONMENT, env::vars())
    }

    /// Flatten a JSON document into dotted keys, e.g.
    /// `{"db": {"hosts": ["a"]}}` becomes `db.hosts[0] = a`.
    pub fn from_json(name: impl Into<String>, document: &Value) -> Self {
        let source = Self::new(name);
        flatten(&source, String::new(), document);
        source
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.properties.get(key).map(|v| v.clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

fn flatten(source: &PropertySource, prefix: String, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                let key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(source, key, nested);
            }
        }
        Value::Array(items) => {
            for (index, nested) in items.iter().enumerate() {
                flatten(source, format!("{}[{}]", prefix, index), nested);
            }
        }
        Value::Null => source.set(prefix, ""),
        Value::String(s) => source.set(prefix, s.as_str()),
        other => source.set(prefix, other.to_string()),
    }
}
