use super::Locale;
use crate::error::{ContextError, Result};
use std::fmt::Display;
use std::sync::Arc;

/// Resolves message codes to localized text.
pub trait MessageSource: Send + Sync {
    /// Resolve `code` for `locale`, formatting `{0}`, `{1}`, ... with `args`.
    ///
    /// Falls back to `default` (formatted the same way) when the code cannot
    /// be resolved; fails with [`ContextError::NoSuchMessage`] when there is
    /// no default either.
    fn get_message(
        &self,
        code: &str,
        args: &[&dyn Display],
        default: Option<&str>,
        locale: &Locale,
    ) -> Result<String>;

    /// Try every code of `resolvable` in order, then its default.
    fn get_message_resolvable(&self, resolvable: &MessageResolvable, locale: &Locale) -> Result<String> {
        let args: Vec<&dyn Display> = resolvable.args.iter().map(|a| a as &dyn Display).collect();
        for code in &resolvable.codes {
            match self.get_message(code, &args, None, locale) {
                Err(ContextError::NoSuchMessage { .. }) => continue,
                other => return other,
            }
        }
        if let Some(default) = &resolvable.default {
            return Ok(format_message(default, &args));
        }
        Err(ContextError::NoSuchMessage {
            code: resolvable.codes.last().cloned().unwrap_or_default(),
            locale: locale.to_string(),
        })
    }

    /// The hierarchical view of this source, if it has one
    fn as_hierarchical(&self) -> Option<&dyn HierarchicalMessageSource> {
        None
    }
}

/// A message source that can delegate misses to a parent.
pub trait HierarchicalMessageSource: MessageSource {
    fn set_parent_message_source(&self, parent: Option<Arc<dyn MessageSource>>);

    fn parent_message_source(&self) -> Option<Arc<dyn MessageSource>>;
}

/// Several candidate codes plus arguments and a default, resolved as one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageResolvable {
    pub codes: Vec<String>,
    pub args: Vec<String>,
    pub default: Option<String>,
}

impl MessageResolvable {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: codes.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Replace `{n}` placeholders with the matching argument.
///
/// Placeholders without an argument are kept verbatim. Without arguments the
/// template is returned unchanged.
pub fn format_message(template: &str, args: &[&dyn Display]) -> String {
    if args.is_empty() {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let index: usize = after[..close].trim().parse().ok()?;
            let arg = args.get(index)?;
            Some((arg.to_string(), close))
        });
        match replaced {
            Some((value, close)) => {
                out.push_str(&value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
