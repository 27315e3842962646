//! Process-wide view of the contexts that are currently refreshed.
//!
//! A context registers itself at the end of a successful refresh and
//! unregisters when it closes. [`snapshot_json`] renders the view for
//! diagnostics endpoints.

use crate::context::ApplicationContext;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::LazyLock;

static LIVE_CONTEXTS: LazyLock<DashMap<String, LiveContext>> = LazyLock::new(DashMap::new);

/// One refreshed context
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveContext {
    pub id: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub startup_date: Option<DateTime<Utc>>,
}

pub(crate) fn register(context: &ApplicationContext) {
    let entry = LiveContext {
        id: context.id(),
        display_name: context.display_name(),
        parent_id: context.parent().map(|p| p.id()),
        startup_date: context.startup_date(),
    };
    tracing::trace!("Registering live context {}", entry.id);
    LIVE_CONTEXTS.insert(entry.id.clone(), entry);
}

pub(crate) fn unregister(id: &str) {
    LIVE_CONTEXTS.remove(id);
}

/// All live contexts, ordered by id
pub fn snapshot() -> Vec<LiveContext> {
    let mut contexts: Vec<LiveContext> = LIVE_CONTEXTS.iter().map(|e| e.value().clone()).collect();
    contexts.sort_by(|a, b| a.id.cmp(&b.id));
    contexts
}

pub fn is_live(id: &str) -> bool {
    LIVE_CONTEXTS.contains_key(id)
}

pub fn snapshot_json() -> serde_json::Result<String> {
    serde_json::to_string_pretty(&snapshot())
}
