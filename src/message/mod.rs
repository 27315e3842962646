//! Message Module
//!
//! Hierarchical, locale-aware message resolution. A context exposes one
//! [`MessageSource`]; misses bubble up to the parent context's source.

mod delegating;
mod locale;
mod source;
mod static_source;

pub use delegating::DelegatingMessageSource;
pub use locale::Locale;
pub use source::{HierarchicalMessageSource, MessageResolvable, MessageSource, format_message};
pub use static_source::StaticMessageSource;
