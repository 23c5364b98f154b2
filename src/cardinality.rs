//! Duplicate handling policies.

/// Whether a container admits duplicates of its elements or values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// An element equal (`==`) to one already stored is rejected.
    #[default]
    Distinct,
    /// Every element is stored.
    Duplicate,
}

impl Cardinality {
    pub fn allows_duplicates(self) -> bool {
        self == Cardinality::Duplicate
    }
}

/// How entries with equal-comparing keys are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DuplicatePolicy {
    /// A second entry with an equal key is a no-op.
    #[default]
    DistinctKeys,
    /// Equal keys are accepted, but an equal (key, value) pair is rejected.
    DuplicateKeysDistinctValues,
    /// Nothing is rejected.
    DuplicateKeysDuplicateValues,
}

impl DuplicatePolicy {
    pub fn allows_duplicate_keys(self) -> bool {
        self != DuplicatePolicy::DistinctKeys
    }

    /// Cardinality of the values grouped under one key.
    pub fn value_cardinality(self) -> Cardinality {
        match self {
            DuplicatePolicy::DuplicateKeysDuplicateValues => Cardinality::Duplicate,
            _ => Cardinality::Distinct,
        }
    }
}

impl From<Cardinality> for DuplicatePolicy {
    /// Collections compare the whole element, so distinct elements may still share a key.
    fn from(cardinality: Cardinality) -> Self {
        match cardinality {
            Cardinality::Distinct => DuplicatePolicy::DuplicateKeysDistinctValues,
            Cardinality::Duplicate => DuplicatePolicy::DuplicateKeysDuplicateValues,
        }
    }
}
