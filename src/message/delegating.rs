use super::{HierarchicalMessageSource, MessageSource, format_message};
use crate::error::{ContextError, Result};
use crate::message::Locale;
use parking_lot::RwLock;
use std::fmt::Display;
use std::sync::Arc;

/// Empty message source that hands every request to its parent.
///
/// Installed by a context when no `message_source` component is declared.
#[derive(Default)]
pub struct DelegatingMessageSource {
    parent: RwLock<Option<Arc<dyn MessageSource>>>,
}

impl DelegatingMessageSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MessageSource for DelegatingMessageSource {
    fn get_message(
        &self,
        code: &str,
        args: &[&dyn Display],
        default: Option<&str>,
        locale: &Locale,
    ) -> Result<String> {
        let parent = self.parent.read().clone();
        if let Some(parent) = parent {
            return parent.get_message(code, args, default, locale);
        }
        match default {
            Some(default) => Ok(format_message(default, args)),
            None => Err(ContextError::NoSuchMessage {
                code: code.to_string(),
                locale: locale.to_string(),
            }),
        }
    }

    fn as_hierarchical(&self) -> Option<&dyn HierarchicalMessageSource> {
        Some(self)
    }
}

impl HierarchicalMessageSource for DelegatingMessageSource {
    fn set_parent_message_source(&self, parent: Option<Arc<dyn MessageSource>>) {
        *self.parent.write() = parent;
    }

    fn parent_message_source(&self) -> Option<Arc<dyn MessageSource>> {
        self.parent.read().clone()
    }
}
