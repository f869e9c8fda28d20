//! Rule identities and the declarative operations a store executes.

use serde::{Deserialize, Serialize};

use super::vocab::{Class, Difficulty};

/// Name of an inference rule.
///
/// Variant order is the order rules appear in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleName {
    /// Tag runs and lifts with a fixed difficulty.
    SeedDifficulty,
    /// Propagate durations to composite routes.
    Duration,
    /// Propagate difficulties to composite routes.
    Difficulty,
    /// Transitive route membership.
    BelongsTo,
    /// Places belong to the routes of their lifts.
    BelongsToPlace,
    /// Restaurants belong to the routes of their places.
    BelongsToRestaurant,
}

impl RuleName {
    /// All rules, in report order.
    pub const ALL: [RuleName; 6] = [
        Self::SeedDifficulty,
        Self::Duration,
        Self::Difficulty,
        Self::BelongsTo,
        Self::BelongsToPlace,
        Self::BelongsToRestaurant,
    ];

    /// Rules that must complete before this one starts.
    pub fn depends_on(&self) -> &'static [RuleName] {
        match self {
            Self::SeedDifficulty | Self::Duration | Self::BelongsTo => &[],
            Self::Difficulty => &[Self::SeedDifficulty],
            Self::BelongsToPlace => &[Self::BelongsTo],
            Self::BelongsToRestaurant => &[Self::BelongsToPlace],
        }
    }

    /// Stable kebab-case name used in logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SeedDifficulty => "seed-difficulty",
            Self::Duration => "duration",
            Self::Difficulty => "difficulty",
            Self::BelongsTo => "belongs-to",
            Self::BelongsToPlace => "belongs-to-place",
            Self::BelongsToRestaurant => "belongs-to-restaurant",
        }
    }
}

impl std::fmt::Display for RuleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declarative insert-where graph mutation.
///
/// Every variant only inserts facts; re-applying one is a no-op once its
/// matches are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateSpec {
    /// `?x a class` ⇒ `?x :difficulty level`.
    SeedDifficulty {
        /// Class whose members are tagged.
        class: Class,
        /// Level assigned.
        difficulty: Difficulty,
    },
    /// Route duration is the sum of its first and next element durations.
    InferDuration,
    /// Route difficulty is the max of its first and next element difficulties.
    InferDifficulty,
    /// A route's first element belongs to the route.
    BelongsToFirst,
    /// Whatever belongs to a route's next element belongs to the route.
    BelongsToRest,
    /// A place belongs to every route its lift belongs to.
    BelongsToPlace,
    /// A restaurant belongs to every route its place belongs to.
    BelongsToRestaurant,
}

impl UpdateSpec {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::SeedDifficulty { .. } => "seed_difficulty",
            Self::InferDuration => "infer_duration",
            Self::InferDifficulty => "infer_difficulty",
            Self::BelongsToFirst => "belongs_to_first",
            Self::BelongsToRest => "belongs_to_rest",
            Self::BelongsToPlace => "belongs_to_place",
            Self::BelongsToRestaurant => "belongs_to_restaurant",
        }
    }
}

/// A read-only counting query used as a convergence probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuerySpec {
    /// Number of `:duration` facts on routes.
    RouteDurations,
    /// Number of `:difficulty` facts on routes.
    RouteDifficulties,
    /// Number of `:belongsTo` facts in the graph.
    Memberships,
}

impl QuerySpec {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::RouteDurations => "route_durations",
            Self::RouteDifficulties => "route_difficulties",
            Self::Memberships => "memberships",
        }
    }
}

/// A rule driven to fixpoint: an update paired with the probe measuring it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixpointRule {
    /// Rule the loop belongs to.
    pub name: RuleName,
    /// Mutation applied each pass.
    pub update: UpdateSpec,
    /// Count measured after each pass.
    pub probe: QuerySpec,
}

impl FixpointRule {
    /// Pair an update with its probe.
    pub const fn new(name: RuleName, update: UpdateSpec, probe: QuerySpec) -> Self {
        Self { name, update, probe }
    }

    /// Duration propagation.
    pub const DURATION: Self =
        Self::new(RuleName::Duration, UpdateSpec::InferDuration, QuerySpec::RouteDurations);

    /// Difficulty propagation.
    pub const DIFFICULTY: Self =
        Self::new(RuleName::Difficulty, UpdateSpec::InferDifficulty, QuerySpec::RouteDifficulties);

    /// Backward membership propagation along route chains (belongs-to phase B).
    pub const BELONGS_TO_REST: Self =
        Self::new(RuleName::BelongsTo, UpdateSpec::BelongsToRest, QuerySpec::Memberships);
}
