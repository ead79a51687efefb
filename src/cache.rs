//! Plan caching.
//!
//! Built plans are immutable and safe to share across concurrent
//! evaluations, keyed by their command key. The cache is an explicit
//! value owned by the embedder and handed to the engine - never a
//! process-wide static.

use std::sync::Arc;

use dashmap::DashMap;

use crate::plan::ExecutionPlan;

const DEFAULT_CAPACITY: usize = 256;

/// A capacity-bound map from command key to built plan.
#[derive(Debug)]
pub struct PlanCache {
    plans: DashMap<String, Arc<ExecutionPlan>>,
    capacity: usize,
}

impl Default for PlanCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl PlanCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            plans: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, command_key: &str) -> Option<Arc<ExecutionPlan>> {
        self.plans.get(command_key).map(|entry| Arc::clone(&entry))
    }

    /// Inserts a plan, evicting an arbitrary entry when full.
    pub fn insert(&self, plan: Arc<ExecutionPlan>) {
        if self.plans.len() >= self.capacity {
            if let Some(key) = self.plans.iter().next().map(|e| e.key().clone()) {
                self.plans.remove(&key);
            }
        }
        self.plans.insert(plan.command_key().to_string(), plan);
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}
