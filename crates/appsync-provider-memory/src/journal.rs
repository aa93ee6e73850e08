//! Call recording and one-shot fault injection.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use appsync_provider::ProviderError;

/// One provider operation as seen by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCall {
    pub operation: String,
    pub target: String,
}

/// Ordered record of every operation a backend received.
#[derive(Debug, Default)]
pub struct CallJournal {
    calls: Mutex<Vec<ProviderCall>>,
    faults: Mutex<HashMap<String, VecDeque<ProviderError>>>,
}

// A panicking test thread must not hide the journal from the others.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl CallJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a call and returns the next fault queued for `operation`, if any.
    pub fn record(&self, operation: &str, target: impl Into<String>) -> Result<(), ProviderError> {
        let target = target.into();
        tracing::trace!(operation, target = %target, "provider call");
        lock(&self.calls).push(ProviderCall {
            operation: operation.to_string(),
            target,
        });

        match lock(&self.faults).get_mut(operation).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Queues `error` to be returned by the next call to `operation`.
    pub fn fail_on(&self, operation: &str, error: ProviderError) {
        lock(&self.faults)
            .entry(operation.to_string())
            .or_default()
            .push_back(error);
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        lock(&self.calls).clone()
    }

    pub fn count(&self, operation: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|call| call.operation == operation)
            .count()
    }

    /// Targets of every recorded call to `operation`, in order.
    pub fn targets(&self, operation: &str) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .filter(|call| call.operation == operation)
            .map(|call| call.target.clone())
            .collect()
    }

    /// Number of calls that can change remote state.
    pub fn mutation_count(&self) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|call| is_mutation(&call.operation))
            .count()
    }

    pub fn clear(&self) {
        lock(&self.calls).clear();
    }
}

fn is_mutation(operation: &str) -> bool {
    ["create_", "update_", "delete_", "put_", "start_"]
        .iter()
        .any(|prefix| operation.starts_with(prefix))
}
