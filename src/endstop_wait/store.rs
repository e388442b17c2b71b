use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

/// Most recent wait result per endstop name. Clones share the same map.
///
/// Updates are a single synchronous write, so a reader never observes a wait
/// that is still sampling; it sees the previous completed result.
#[derive(Debug, Clone, Default)]
pub struct LastStateStore {
    states: Arc<RwLock<HashMap<String, bool>>>,
}

impl LastStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, endstop: &str, triggered: bool) {
        let mut states = self.states.write().unwrap_or_else(PoisonError::into_inner);
        states.insert(endstop.to_string(), triggered);
    }

    pub fn get(&self, endstop: &str) -> Option<bool> {
        let states = self.states.read().unwrap_or_else(PoisonError::into_inner);
        states.get(endstop).copied()
    }

    pub fn snapshot(&self) -> BTreeMap<String, bool> {
        let states = self.states.read().unwrap_or_else(PoisonError::into_inner);
        states.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }
}
