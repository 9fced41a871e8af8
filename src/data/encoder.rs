use crate::error::{RecError, Result};
use crate::models::RawId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Which vocabulary an encoder belongs to. User and item encoders are never
/// interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    User,
    Item,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::User => write!(f, "user"),
            EntityKind::Item => write!(f, "item"),
        }
    }
}

/// Bijection between sparse raw identifiers and dense indices `[0, N)`.
///
/// Indices are handed out in first-seen order. The mapping is fixed once
/// `fit` returns; there is no way to add identifiers afterwards.
#[derive(Debug, Clone)]
pub struct IdEncoder {
    kind: EntityKind,
    index_of: HashMap<RawId, usize>,
    raw_ids: Vec<RawId>,
}

impl IdEncoder {
    pub fn fit<I>(kind: EntityKind, raw_ids: I) -> Self
    where
        I: IntoIterator<Item = RawId>,
    {
        let mut index_of = HashMap::new();
        let mut ids = Vec::new();

        for raw_id in raw_ids {
            index_of.entry(raw_id).or_insert_with(|| {
                ids.push(raw_id);
                ids.len() - 1
            });
        }

        Self {
            kind,
            index_of,
            raw_ids: ids,
        }
    }

    pub fn encode(&self, raw_id: RawId) -> Result<usize> {
        self.index_of
            .get(&raw_id)
            .copied()
            .ok_or(RecError::UnknownId {
                kind: self.kind,
                raw_id,
            })
    }

    /// Maps a dense index back to its raw identifier.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.size()`.
    pub fn decode(&self, index: usize) -> RawId {
        self.raw_ids[index]
    }

    pub fn size(&self) -> usize {
        self.raw_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_seen_order() {
        let encoder = IdEncoder::fit(EntityKind::User, vec![7, 3, 7, 9]);
        assert_eq!(encoder.encode(7).unwrap(), 0);
        assert_eq!(encoder.encode(3).unwrap(), 1);
        assert_eq!(encoder.encode(9).unwrap(), 2);
        assert_eq!(encoder.size(), 3);
    }

    #[test]
    fn test_round_trip_is_stable() {
        let ids = vec![100, -4, 55, 100, 0, 55, 12_000_000_000];
        let encoder = IdEncoder::fit(EntityKind::Item, ids.clone());
        for id in ids {
            let index = encoder.encode(id).unwrap();
            assert_eq!(encoder.encode(encoder.decode(index)).unwrap(), index);
            assert_eq!(encoder.decode(index), id);
        }
    }

    #[test]
    fn test_unknown_id() {
        let encoder = IdEncoder::fit(EntityKind::Item, vec![1, 2]);
        match encoder.encode(999) {
            Err(RecError::UnknownId { kind, raw_id }) => {
                assert_eq!(kind, EntityKind::Item);
                assert_eq!(raw_id, 999);
            }
            other => panic!("expected UnknownId, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_fit() {
        let encoder = IdEncoder::fit(EntityKind::User, Vec::new());
        assert!(encoder.is_empty());
        assert!(encoder.encode(0).is_err());
    }
}
