use crate::event::{ApplicationListener, ListenerSet};
use std::sync::Arc;

/// Listeners held by a context across refresh cycles.
///
/// The first refresh captures the listeners registered so far as the
/// baseline. Later refreshes and every close restore the working set to that
/// baseline, which drops listeners added while the context was running.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    baseline: Option<ListenerSet>,
    working: ListenerSet,
}

impl ListenerRegistry {
    pub(crate) fn add(&mut self, listener: Arc<dyn ApplicationListener>) -> bool {
        self.working.insert(listener)
    }

    pub(crate) fn listeners(&self) -> &ListenerSet {
        &self.working
    }

    /// Capture the baseline on the first refresh, restore it on later ones
    pub(crate) fn prepare_refresh(&mut self) {
        match &self.baseline {
            None => self.baseline = Some(self.working.clone()),
            Some(baseline) => self.working = baseline.clone(),
        }
    }

    pub(crate) fn reset_to_baseline(&mut self) {
        if let Some(baseline) = &self.baseline {
            self.working = baseline.clone();
        }
    }
}
