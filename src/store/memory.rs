//! In-memory graph store for testing.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::types::{Class, Object, Predicate, QuerySpec, Resource, Triple, UpdateSpec};
use super::GraphStore;

/// Error type for in-memory store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InMemoryError {
    /// Summed duration does not fit in an `i64`.
    #[error("Duration overflow on route {0}")]
    DurationOverflow(Resource),
}

/// Subject -> predicate -> objects index.
///
/// Uses BTreeMap/BTreeSet for deterministic iteration order.
#[derive(Debug, Clone, Default)]
struct Graph {
    facts: BTreeMap<Resource, BTreeMap<Predicate, BTreeSet<Object>>>,
}

impl Graph {
    fn insert(&mut self, triple: Triple) -> bool {
        self.facts
            .entry(triple.subject)
            .or_default()
            .entry(triple.predicate)
            .or_default()
            .insert(triple.object)
    }

    fn objects(&self, subject: &Resource, predicate: Predicate) -> impl Iterator<Item = &Object> {
        self.facts
            .get(subject)
            .and_then(|preds| preds.get(&predicate))
            .into_iter()
            .flatten()
    }

    fn resources(&self, subject: &Resource, predicate: Predicate) -> impl Iterator<Item = &Resource> {
        self.objects(subject, predicate).filter_map(Object::as_resource)
    }

    fn integers<'a>(&'a self, subject: &Resource, predicate: Predicate) -> impl Iterator<Item = i64> + 'a {
        self.objects(subject, predicate).filter_map(Object::as_integer)
    }

    fn instances(&self, class: Class) -> impl Iterator<Item = &Resource> {
        let wanted = Object::Class(class);
        self.facts
            .iter()
            .filter(move |(_, preds)| {
                preds
                    .get(&Predicate::Type)
                    .is_some_and(|types| types.contains(&wanted))
            })
            .map(|(subject, _)| subject)
    }

    fn count_objects(&self, class: Option<Class>, predicate: Predicate) -> u64 {
        let count = |subject: &Resource| self.objects(subject, predicate).count() as u64;
        match class {
            Some(class) => self.instances(class).map(count).sum(),
            None => self.facts.keys().map(count).sum(),
        }
    }

    /// Evaluate the WHERE side of an update against the current facts.
    fn matches(&self, op: &UpdateSpec) -> Result<Vec<Triple>, InMemoryError> {
        let mut out = Vec::new();
        match op {
            UpdateSpec::SeedDifficulty { class, difficulty } => {
                for run in self.instances(*class) {
                    out.push(Triple::literal(run.clone(), Predicate::Difficulty, difficulty.value()));
                }
            }
            UpdateSpec::InferDuration => {
                for (route, first, next) in self.route_pairs(Predicate::Duration) {
                    let total = first
                        .checked_add(next)
                        .ok_or_else(|| InMemoryError::DurationOverflow(route.clone()))?;
                    out.push(Triple::literal(route.clone(), Predicate::Duration, total));
                }
            }
            UpdateSpec::InferDifficulty => {
                for (route, first, next) in self.route_pairs(Predicate::Difficulty) {
                    out.push(Triple::literal(route.clone(), Predicate::Difficulty, first.max(next)));
                }
            }
            UpdateSpec::BelongsToFirst => {
                for route in self.instances(Class::Route) {
                    for first in self.resources(route, Predicate::FirstElement) {
                        out.push(Triple::link(first.clone(), Predicate::BelongsTo, route.clone()));
                    }
                }
            }
            UpdateSpec::BelongsToRest => {
                for route in self.instances(Class::Route) {
                    for next in self.resources(route, Predicate::NextElement) {
                        let target = Object::Resource(next.clone());
                        for (belonger, preds) in &self.facts {
                            let belongs = preds
                                .get(&Predicate::BelongsTo)
                                .is_some_and(|routes| routes.contains(&target));
                            if belongs {
                                out.push(Triple::link(belonger.clone(), Predicate::BelongsTo, route.clone()));
                            }
                        }
                    }
                }
            }
            UpdateSpec::BelongsToPlace => {
                for place in self.instances(Class::Place) {
                    let lifts = self
                        .resources(place, Predicate::IsStartOf)
                        .chain(self.resources(place, Predicate::IsEndOf));
                    for lift in lifts {
                        for route in self.resources(lift, Predicate::BelongsTo) {
                            out.push(Triple::link(place.clone(), Predicate::BelongsTo, route.clone()));
                        }
                    }
                }
            }
            UpdateSpec::BelongsToRestaurant => {
                for restaurant in self.instances(Class::Restaurant) {
                    for place in self.resources(restaurant, Predicate::LocatedAt) {
                        for route in self.resources(place, Predicate::BelongsTo) {
                            out.push(Triple::link(restaurant.clone(), Predicate::BelongsTo, route.clone()));
                        }
                    }
                }
            }
        }
        Ok(out)
    }

    /// Every (route, first value, next value) combination for a numeric predicate.
    fn route_pairs(&self, predicate: Predicate) -> Vec<(&Resource, i64, i64)> {
        let mut pairs = Vec::new();
        for route in self.instances(Class::Route) {
            for first in self.resources(route, Predicate::FirstElement) {
                for next in self.resources(route, Predicate::NextElement) {
                    for a in self.integers(first, predicate) {
                        for b in self.integers(next, predicate) {
                            pairs.push((route, a, b));
                        }
                    }
                }
            }
        }
        pairs
    }
}

/// In-memory graph store for testing.
///
/// Updates evaluate their pattern against a snapshot under a read lock and then
/// insert the matches under a write lock, so concurrent rules interleave at
/// update granularity.
///
/// Integer literals are `i64`. A duration sum outside that range fails the
/// update with [`InMemoryError::DurationOverflow`] instead of wrapping; the
/// SPARQL backend has no such bound.
#[derive(Debug, Default)]
pub struct InMemoryGraphStore {
    graph: RwLock<Graph>,
}

impl InMemoryGraphStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given facts.
    pub fn from_triples(triples: impl IntoIterator<Item = Triple>) -> Self {
        let store = Self::new();
        store.extend(triples);
        store
    }

    /// Add a fact. Returns false if it was already present.
    pub fn insert(&self, triple: Triple) -> bool {
        self.graph.write().insert(triple)
    }

    /// Add several facts.
    pub fn extend(&self, triples: impl IntoIterator<Item = Triple>) {
        let mut graph = self.graph.write();
        for triple in triples {
            graph.insert(triple);
        }
    }

    /// Check whether a fact is present.
    pub fn contains(&self, triple: &Triple) -> bool {
        self.graph
            .read()
            .objects(&triple.subject, triple.predicate)
            .any(|o| *o == triple.object)
    }

    /// Objects of `subject predicate ?o`, in order.
    pub fn objects(&self, subject: &Resource, predicate: Predicate) -> Vec<Object> {
        self.graph.read().objects(subject, predicate).cloned().collect()
    }

    /// Integer values of `subject predicate ?o`, in order.
    pub fn integers(&self, subject: &Resource, predicate: Predicate) -> Vec<i64> {
        self.graph.read().integers(subject, predicate).collect()
    }

    /// Get number of facts.
    pub fn len(&self) -> usize {
        self.graph
            .read()
            .facts
            .values()
            .flat_map(|preds| preds.values())
            .map(BTreeSet::len)
            .sum()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    type Error = InMemoryError;

    async fn update(&self, op: &UpdateSpec) -> Result<(), Self::Error> {
        let inserts = self.graph.read().matches(op)?;
        let mut graph = self.graph.write();
        let added = inserts.into_iter().filter(|t| graph.insert(t.clone())).count();
        tracing::trace!(op = op.label(), added, "in-memory update applied");
        Ok(())
    }

    async fn count(&self, probe: &QuerySpec) -> Result<u64, Self::Error> {
        let graph = self.graph.read();
        Ok(match probe {
            QuerySpec::RouteDurations => graph.count_objects(Some(Class::Route), Predicate::Duration),
            QuerySpec::RouteDifficulties => graph.count_objects(Some(Class::Route), Predicate::Difficulty),
            QuerySpec::Memberships => graph.count_objects(None, Predicate::BelongsTo),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Difficulty;

    fn route(store: &InMemoryGraphStore, name: &str, first: &str, next: &str) {
        store.extend([
            Triple::typed(name, Class::Route),
            Triple::link(name, Predicate::FirstElement, first),
            Triple::link(name, Predicate::NextElement, next),
        ]);
    }

    #[tokio::test]
    async fn test_insert_is_idempotent() {
        let store = InMemoryGraphStore::new();
        assert!(store.is_empty());
        assert!(store.insert(Triple::typed("a", Class::BlueRun)));
        assert!(!store.insert(Triple::typed("a", Class::BlueRun)));
        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());
    }

    #[tokio::test]
    async fn test_seed_difficulty_only_tags_class_members() {
        let store = InMemoryGraphStore::from_triples([
            Triple::typed("blue", Class::BlueRun),
            Triple::typed("lift", Class::SkiLift),
        ]);

        store
            .update(&UpdateSpec::SeedDifficulty { class: Class::BlueRun, difficulty: Difficulty::BLUE })
            .await
            .unwrap();

        assert_eq!(store.integers(&"blue".into(), Predicate::Difficulty), vec![1]);
        assert!(store.integers(&"lift".into(), Predicate::Difficulty).is_empty());
    }

    #[tokio::test]
    async fn test_duration_combines_every_value_pair() {
        let store = InMemoryGraphStore::new();
        route(&store, "r", "a", "b");
        store.extend([
            Triple::literal("a", Predicate::Duration, 5),
            Triple::literal("b", Predicate::Duration, 7),
            Triple::literal("b", Predicate::Duration, 10),
        ]);

        store.update(&UpdateSpec::InferDuration).await.unwrap();

        assert_eq!(store.integers(&"r".into(), Predicate::Duration), vec![12, 15]);
        assert_eq!(store.count(&QuerySpec::RouteDurations).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duration_overflow_is_an_error() {
        let store = InMemoryGraphStore::new();
        route(&store, "r", "a", "b");
        store.extend([
            Triple::literal("a", Predicate::Duration, i64::MAX),
            Triple::literal("b", Predicate::Duration, 1),
        ]);

        let err = store.update(&UpdateSpec::InferDuration).await.unwrap_err();
        assert!(matches!(err, InMemoryError::DurationOverflow(r) if r.as_str() == "r"));
        assert!(store.integers(&"r".into(), Predicate::Duration).is_empty());
    }

    #[tokio::test]
    async fn test_difficulty_takes_max() {
        let store = InMemoryGraphStore::new();
        route(&store, "r", "a", "b");
        store.extend([
            Triple::literal("a", Predicate::Difficulty, 3),
            Triple::literal("b", Predicate::Difficulty, 1),
        ]);

        store.update(&UpdateSpec::InferDifficulty).await.unwrap();

        assert_eq!(store.integers(&"r".into(), Predicate::Difficulty), vec![3]);
    }

    #[tokio::test]
    async fn test_missing_values_are_skipped() {
        let store = InMemoryGraphStore::new();
        route(&store, "r", "a", "b");
        store.insert(Triple::literal("a", Predicate::Duration, 5));

        store.update(&UpdateSpec::InferDuration).await.unwrap();

        assert_eq!(store.count(&QuerySpec::RouteDurations).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_route_probes_ignore_untyped_subjects() {
        let store = InMemoryGraphStore::from_triples([
            Triple::literal("run", Predicate::Duration, 4),
            Triple::typed("r", Class::Route),
            Triple::literal("r", Predicate::Duration, 9),
        ]);

        assert_eq!(store.count(&QuerySpec::RouteDurations).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_belongs_to_rest_propagates_one_step_per_pass() {
        let store = InMemoryGraphStore::new();
        route(&store, "outer", "x", "inner");
        route(&store, "inner", "leaf", "tail");

        store.update(&UpdateSpec::BelongsToFirst).await.unwrap();
        assert_eq!(store.count(&QuerySpec::Memberships).await.unwrap(), 2);

        store.update(&UpdateSpec::BelongsToRest).await.unwrap();
        assert!(store.contains(&Triple::link("leaf", Predicate::BelongsTo, "outer")));
        assert_eq!(store.count(&QuerySpec::Memberships).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_restaurant_follows_place() {
        let store = InMemoryGraphStore::from_triples([
            Triple::typed("p", Class::Place),
            Triple::typed("resto", Class::Restaurant),
            Triple::link("resto", Predicate::LocatedAt, "p"),
            Triple::link("p", Predicate::IsEndOf, "lift"),
            Triple::link("lift", Predicate::BelongsTo, "r"),
        ]);

        store.update(&UpdateSpec::BelongsToRestaurant).await.unwrap();
        assert!(!store.contains(&Triple::link("resto", Predicate::BelongsTo, "r")));

        store.update(&UpdateSpec::BelongsToPlace).await.unwrap();
        store.update(&UpdateSpec::BelongsToRestaurant).await.unwrap();
        assert!(store.contains(&Triple::link("p", Predicate::BelongsTo, "r")));
        assert!(store.contains(&Triple::link("resto", Predicate::BelongsTo, "r")));
    }
}
