//! Shared graph builders and an instrumented store for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use route_inference::store::memory::InMemoryError;
use route_inference::{Class, GraphStore, InMemoryGraphStore, Predicate, QuerySpec, Triple, UpdateSpec};

// ─────────────────────────────────────────────────────────────────────────────
// Graph builders
// ─────────────────────────────────────────────────────────────────────────────

/// Route `name` with the given first and next elements.
pub fn route(name: &str, first: &str, next: &str) -> [Triple; 3] {
    [
        Triple::typed(name, Class::Route),
        Triple::link(name, Predicate::FirstElement, first),
        Triple::link(name, Predicate::NextElement, next),
    ]
}

pub fn route_name(i: usize) -> String {
    format!("route_{i}")
}

pub fn run_name(i: usize) -> String {
    format!("run_{i}")
}

/// A chain of `k` nested routes.
///
/// `route_i = run_i + route_{i+1}` for `i < k`, and `route_k = run_k + tail`.
/// `run_k` is the leaf: the innermost first element.
pub fn route_chain(k: usize) -> Vec<Triple> {
    let mut triples = Vec::new();
    for i in 1..=k {
        let next = if i == k { "tail".to_string() } else { route_name(i + 1) };
        triples.extend(route(&route_name(i), &run_name(i), &next));
    }
    triples
}

/// [`route_chain`] with `values[i - 1]` on `run_i` and `tail_value` on the tail.
pub fn valued_chain(predicate: Predicate, values: &[i64], tail_value: i64) -> Vec<Triple> {
    let mut triples = route_chain(values.len());
    for (i, value) in values.iter().enumerate() {
        triples.push(Triple::literal(run_name(i + 1), predicate, *value));
    }
    triples.push(Triple::literal("tail", predicate, tail_value));
    triples
}

// ─────────────────────────────────────────────────────────────────────────────
// Instrumented store
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum InstrumentedError {
    #[error("injected failure on {0}")]
    Injected(&'static str),
    #[error(transparent)]
    Memory(#[from] InMemoryError),
}

/// In-memory store that records calls and can fail or panic on a chosen update.
#[derive(Default)]
pub struct InstrumentedStore {
    pub inner: InMemoryGraphStore,
    calls: Mutex<HashMap<UpdateSpec, usize>>,
    probes: Mutex<usize>,
    fail_on: Option<(UpdateSpec, usize)>,
    panic_on: Option<(UpdateSpec, usize)>,
}

impl InstrumentedStore {
    pub fn new(triples: impl IntoIterator<Item = Triple>) -> Self {
        Self {
            inner: InMemoryGraphStore::from_triples(triples),
            ..Default::default()
        }
    }

    /// Fail the `nth` (1-based) call of `op`, leaving the graph untouched.
    pub fn failing(mut self, op: UpdateSpec, nth: usize) -> Self {
        self.fail_on = Some((op, nth));
        self
    }

    /// Panic on the `nth` (1-based) call of `op`, leaving the graph untouched.
    pub fn panicking(mut self, op: UpdateSpec, nth: usize) -> Self {
        self.panic_on = Some((op, nth));
        self
    }

    /// Number of times `op` was requested, including a failed attempt.
    pub fn calls(&self, op: UpdateSpec) -> usize {
        self.calls.lock().get(&op).copied().unwrap_or(0)
    }

    /// Total update requests.
    pub fn total_updates(&self) -> usize {
        self.calls.lock().values().sum()
    }

    /// Total probe requests.
    pub fn total_probes(&self) -> usize {
        *self.probes.lock()
    }
}

#[async_trait]
impl GraphStore for InstrumentedStore {
    type Error = InstrumentedError;

    async fn update(&self, op: &UpdateSpec) -> Result<(), Self::Error> {
        let call = {
            let mut calls = self.calls.lock();
            let n = calls.entry(*op).or_default();
            *n += 1;
            *n
        };
        if self.fail_on == Some((*op, call)) {
            return Err(InstrumentedError::Injected(op.label()));
        }
        if self.panic_on == Some((*op, call)) {
            panic!("store crashed on {}", op.label());
        }
        Ok(self.inner.update(op).await?)
    }

    async fn count(&self, probe: &QuerySpec) -> Result<u64, Self::Error> {
        *self.probes.lock() += 1;
        Ok(self.inner.count(probe).await?)
    }
}
