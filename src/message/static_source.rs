use super::{HierarchicalMessageSource, Locale, MessageSource, format_message};
use crate::error::{ContextError, Result};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::fmt::Display;
use std::sync::Arc;

/// In-memory message source.
///
/// Messages are looked up along the locale fallback chain, then in the
/// parent source, then the caller's default.
///
/// # Example
///
/// ```rust,ignore
/// let messages = StaticMessageSource::new();
/// messages.add_message("greeting", &Locale::new("en"), "Hello {0}");
/// messages.add_message("greeting", &Locale::new("de"), "Hallo {0}");
/// ```
#[derive(Default)]
pub struct StaticMessageSource {
    messages: DashMap<(String, Locale), String>,
    parent: RwLock<Option<Arc<dyn MessageSource>>>,
    use_code_as_default: bool,
}

impl StaticMessageSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the code itself instead of failing when nothing matches
    pub fn use_code_as_default(mut self, enabled: bool) -> Self {
        self.use_code_as_default = enabled;
        self
    }

    pub fn add_message(&self, code: impl Into<String>, locale: &Locale, message: impl Into<String>) {
        self.messages.insert((code.into(), locale.clone()), message.into());
    }

    pub fn add_messages<I, K, V>(&self, locale: &Locale, messages: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (code, message) in messages {
            self.add_message(code, locale, message);
        }
    }

    fn resolve_local(&self, code: &str, locale: &Locale) -> Option<String> {
        locale.fallbacks().into_iter().find_map(|candidate| {
            self.messages
                .get(&(code.to_string(), candidate))
                .map(|m| m.value().clone())
        })
    }
}

impl MessageSource for StaticMessageSource {
    fn get_message(
        &self,
        code: &str,
        args: &[&dyn Display],
        default: Option<&str>,
        locale: &Locale,
    ) -> Result<String> {
        if let Some(template) = self.resolve_local(code, locale) {
            return Ok(format_message(&template, args));
        }

        let parent = self.parent.read().clone();
        if let Some(parent) = parent {
            match parent.get_message(code, args, None, locale) {
                Err(ContextError::NoSuchMessage { .. }) => {}
                other => return other,
            }
        }

        if let Some(default) = default {
            return Ok(format_message(default, args));
        }
        if self.use_code_as_default {
            return Ok(code.to_string());
        }
        Err(ContextError::NoSuchMessage {
            code: code.to_string(),
            locale: locale.to_string(),
        })
    }

    fn as_hierarchical(&self) -> Option<&dyn HierarchicalMessageSource> {
        Some(self)
    }
}

impl HierarchicalMessageSource for StaticMessageSource {
    fn set_parent_message_source(&self, parent: Option<Arc<dyn MessageSource>>) {
        *self.parent.write() = parent;
    }

    fn parent_message_source(&self) -> Option<Arc<dyn MessageSource>> {
        self.parent.read().clone()
    }
}
