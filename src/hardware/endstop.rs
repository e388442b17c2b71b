// src/hardware/endstop.rs - Endstop handles and name resolution
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::EndstopConfig;

/// A named digital input that reports triggered / not triggered.
pub trait EndstopHandle: fmt::Debug + Send + Sync {
    /// Sample the logical state at the given event time.
    fn query(&self, print_time: f64) -> bool;
}

/// Maps an endstop name to a sampling handle.
pub trait EndstopResolver: Send + Sync {
    fn lookup(&self, name: &str) -> Option<Arc<dyn EndstopHandle>>;
    fn names(&self) -> Vec<String>;
}

/// Split a pin description into its name and inversion flag (`"!PA1"`).
pub fn parse_pin(desc: &str) -> (&str, bool) {
    let desc = desc.trim();
    match desc.strip_prefix('!') {
        Some(pin) => (pin.trim(), true),
        None => (desc, false),
    }
}

/// Endstop whose raw level lives in a shared atomic, so another task can drive
/// it while a wait is sampling.
#[derive(Debug, Clone)]
pub struct MirroredEndstop {
    pin: String,
    level: Arc<AtomicBool>,
    inverted: bool,
}

impl MirroredEndstop {
    pub fn new(pin: impl Into<String>, level: bool, inverted: bool) -> Self {
        Self {
            pin: pin.into(),
            level: Arc::new(AtomicBool::new(level)),
            inverted,
        }
    }

    pub fn pin(&self) -> &str {
        &self.pin
    }

    pub fn set_level(&self, level: bool) {
        self.level.store(level, Ordering::Release);
    }

    /// Shared raw level; writes are visible to every clone of this endstop.
    pub fn level_handle(&self) -> Arc<AtomicBool> {
        self.level.clone()
    }
}

impl EndstopHandle for MirroredEndstop {
    fn query(&self, _print_time: f64) -> bool {
        self.level.load(Ordering::Acquire) ^ self.inverted
    }
}

/// Replays a fixed list of raw levels, repeating the last one once the script
/// runs out. Records every query time.
#[derive(Debug)]
pub struct ScriptedEndstop {
    levels: Vec<bool>,
    inverted: bool,
    cursor: AtomicUsize,
    query_times: Mutex<Vec<f64>>,
}

impl ScriptedEndstop {
    pub fn new(levels: Vec<bool>, inverted: bool) -> Self {
        Self {
            levels,
            inverted,
            cursor: AtomicUsize::new(0),
            query_times: Mutex::new(Vec::new()),
        }
    }

    /// Logical state that never changes.
    pub fn constant(triggered: bool) -> Self {
        Self::new(vec![triggered], false)
    }

    pub fn query_count(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    pub fn query_times(&self) -> Vec<f64> {
        self.query_times.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl EndstopHandle for ScriptedEndstop {
    fn query(&self, print_time: f64) -> bool {
        let index = self.cursor.fetch_add(1, Ordering::AcqRel);
        self.query_times
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(print_time);
        let level = self.levels.get(index).or(self.levels.last()).copied().unwrap_or(false);
        level ^ self.inverted
    }
}

/// Keyed endstop lookup. The first registration of a name wins.
#[derive(Debug, Default, Clone)]
pub struct EndstopRegistry {
    endstops: HashMap<String, Arc<dyn EndstopHandle>>,
}

impl EndstopRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handle` under `name`. Returns false if the name was taken.
    pub fn register(&mut self, name: impl Into<String>, handle: Arc<dyn EndstopHandle>) -> bool {
        let name = name.into();
        if self.endstops.contains_key(&name) {
            tracing::warn!("Endstop '{}' already registered, keeping the first definition", name);
            return false;
        }
        tracing::debug!("Registered endstop '{}'", name);
        self.endstops.insert(name, handle);
        true
    }

    pub fn len(&self) -> usize {
        self.endstops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endstops.is_empty()
    }

    /// Build simulated endstops from `[endstops.<name>]` sections.
    pub fn from_config(endstops: &HashMap<String, EndstopConfig>) -> Self {
        let mut registry = Self::new();
        for (name, cfg) in endstops {
            let (pin, pin_inverted) = parse_pin(&cfg.pin);
            let inverted = cfg.inverted ^ pin_inverted;
            let handle: Arc<dyn EndstopHandle> = match &cfg.samples {
                Some(levels) => Arc::new(ScriptedEndstop::new(levels.clone(), inverted)),
                None => Arc::new(MirroredEndstop::new(pin, cfg.level, inverted)),
            };
            tracing::debug!("Endstop '{}' on pin {} (inverted: {})", name, pin, inverted);
            registry.register(name.clone(), handle);
        }
        registry
    }
}

impl EndstopResolver for EndstopRegistry {
    fn lookup(&self, name: &str) -> Option<Arc<dyn EndstopHandle>> {
        self.endstops.get(name).cloned()
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.endstops.keys().cloned().collect();
        names.sort();
        names
    }
}
