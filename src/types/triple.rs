//! Triple model for graph facts.

use serde::{Deserialize, Serialize};

use super::vocab::{Class, Predicate};

/// Named individual in the ski-area graph (local name within the namespace).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resource(String);

impl Resource {
    /// Create a resource from its local name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Local name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Resource {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Resource {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, ":{}", self.0)
    }
}

/// Object position of a triple.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Object {
    /// Another individual.
    Resource(Resource),
    /// An ontology class (object of `rdf:type`).
    Class(Class),
    /// An integer literal.
    Integer(i64),
}

impl Object {
    /// The individual, if this object is one.
    pub fn as_resource(&self) -> Option<&Resource> {
        match self {
            Self::Resource(r) => Some(r),
            _ => None,
        }
    }

    /// The integer value, if this object is a literal.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }
}

/// A single graph fact.
///
/// Implements `Ord` so a set of triples iterates deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Triple {
    /// Subject individual.
    pub subject: Resource,
    /// Predicate.
    pub predicate: Predicate,
    /// Object.
    pub object: Object,
}

impl Triple {
    /// Create a triple.
    pub fn new(subject: impl Into<Resource>, predicate: Predicate, object: Object) -> Self {
        Self {
            subject: subject.into(),
            predicate,
            object,
        }
    }

    /// `subject rdf:type class`.
    pub fn typed(subject: impl Into<Resource>, class: Class) -> Self {
        Self::new(subject, Predicate::Type, Object::Class(class))
    }

    /// `subject predicate object` with an individual as object.
    pub fn link(subject: impl Into<Resource>, predicate: Predicate, object: impl Into<Resource>) -> Self {
        Self::new(subject, predicate, Object::Resource(object.into()))
    }

    /// `subject predicate value` with an integer literal as object.
    pub fn literal(subject: impl Into<Resource>, predicate: Predicate, value: i64) -> Self {
        Self::new(subject, predicate, Object::Integer(value))
    }
}
