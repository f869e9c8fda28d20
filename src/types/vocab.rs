//! Ski-area vocabulary: classes, predicates and difficulty levels.

use serde::{Deserialize, Serialize};

/// Default namespace of the ski-area ontology.
pub const DEFAULT_NAMESPACE: &str = "http://www.semanticweb.org/tws/tp2#";

/// Ontology class an individual can be typed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Class {
    /// Easy run.
    BlueRun,
    /// Intermediate run.
    RedRun,
    /// Expert run.
    BlackRun,
    /// Any ski lift.
    SkiLift,
    /// Composite route made of a first and a next element.
    Route,
    /// Start or end point of a lift or run.
    Place,
    /// Restaurant located at a place.
    Restaurant,
}

impl Class {
    /// Local name within the ontology namespace.
    pub fn local_name(&self) -> &'static str {
        match self {
            Self::BlueRun => "BlueRun",
            Self::RedRun => "RedRun",
            Self::BlackRun => "BlackRun",
            Self::SkiLift => "SkiLift",
            Self::Route => "Route",
            Self::Place => "Place",
            Self::Restaurant => "Restaurant",
        }
    }
}

impl std::fmt::Display for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.local_name())
    }
}

/// Predicates the inference rules read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Predicate {
    /// `rdf:type`.
    Type,
    /// Numeric difficulty of a run, lift or route.
    Difficulty,
    /// Numeric duration of a run, lift or route.
    Duration,
    /// First element of a route.
    FirstElement,
    /// Element following the first element of a route.
    NextElement,
    /// Membership of an element in a route.
    BelongsTo,
    /// Place where a lift starts.
    IsStartOf,
    /// Place where a lift ends.
    IsEndOf,
    /// Place a restaurant is located at.
    LocatedAt,
}

impl Predicate {
    /// Prefixed SPARQL form (`:name` or `rdf:type`).
    pub fn prefixed(&self) -> &'static str {
        match self {
            Self::Type => "rdf:type",
            Self::Difficulty => ":difficulty",
            Self::Duration => ":duration",
            Self::FirstElement => ":firstElement",
            Self::NextElement => ":nextElement",
            Self::BelongsTo => ":belongsTo",
            Self::IsStartOf => ":isStartOf",
            Self::IsEndOf => ":isEndOf",
            Self::LocatedAt => ":locatedAt",
        }
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefixed())
    }
}

/// Difficulty level. Ordered: lift < blue < red < black.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Difficulty(u8);

impl Difficulty {
    /// Ski lifts.
    pub const LIFT: Self = Self(0);
    /// Blue runs.
    pub const BLUE: Self = Self(1);
    /// Red runs.
    pub const RED: Self = Self(2);
    /// Black runs.
    pub const BLACK: Self = Self(3);

    /// Numeric value as stored in the graph.
    pub fn value(&self) -> i64 {
        i64::from(self.0)
    }
}

/// The element classes that receive a seeded difficulty, with their level.
///
/// Order matches the sequence in which seeding sub-steps run.
pub const SEEDED_CLASSES: [(Class, Difficulty); 4] = [
    (Class::BlueRun, Difficulty::BLUE),
    (Class::RedRun, Difficulty::RED),
    (Class::BlackRun, Difficulty::BLACK),
    (Class::SkiLift, Difficulty::LIFT),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_ordering() {
        assert!(Difficulty::LIFT < Difficulty::BLUE);
        assert!(Difficulty::BLUE < Difficulty::RED);
        assert!(Difficulty::RED < Difficulty::BLACK);
        assert_eq!(Difficulty::BLACK.value(), 3);
    }

    #[test]
    fn test_class_display_is_local_name() {
        for (class, _) in SEEDED_CLASSES {
            assert_eq!(class.to_string(), class.local_name());
        }
        assert_eq!(Class::Restaurant.to_string(), "Restaurant");
    }
}
