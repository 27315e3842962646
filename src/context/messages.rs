use super::ApplicationContext;
use crate::error::{ContextError, Result};
use crate::message::{Locale, MessageSource, format_message};
use std::fmt::Display;
use std::sync::Weak;

/// Resolves messages through a parent context, looked up on every request.
///
/// Used as the parent message source when the parent context has no
/// initialized message source of its own yet.
pub(crate) struct ParentContextMessageSource {
    parent: Weak<ApplicationContext>,
}

impl ParentContextMessageSource {
    pub(crate) fn new(parent: Weak<ApplicationContext>) -> Self {
        Self { parent }
    }
}

impl MessageSource for ParentContextMessageSource {
    fn get_message(
        &self,
        code: &str,
        args: &[&dyn Display],
        default: Option<&str>,
        locale: &Locale,
    ) -> Result<String> {
        if let Some(parent) = self.parent.upgrade() {
            return parent.resolve_message(code, args, default, locale);
        }
        match default {
            Some(default) => Ok(format_message(default, args)),
            None => Err(ContextError::NoSuchMessage {
                code: code.to_string(),
                locale: locale.to_string(),
            }),
        }
    }
}
