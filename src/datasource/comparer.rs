//! Sharding key comparison
//!
//! Range-style mappers need an ordering over key values. The comparer is part
//! of the datasource configuration so that every mapper built from it agrees
//! on that ordering.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::routing::ShardKeyValue;

/// Orders sharding key values
pub trait ShardingComparer: Send + Sync {
    fn compare(&self, a: &ShardKeyValue, b: &ShardKeyValue) -> Ordering;

    fn equals(&self, a: &ShardKeyValue, b: &ShardKeyValue) -> bool {
        self.compare(a, b) == Ordering::Equal
    }
}

/// Natural ordering of the key domain.
///
/// Values of different key types order by type first, which keeps the
/// ordering total.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalComparer;

impl ShardingComparer for NaturalComparer {
    fn compare(&self, a: &ShardKeyValue, b: &ShardKeyValue) -> Ordering {
        a.cmp(b)
    }
}

/// Like [`NaturalComparer`], but strings compare ignoring case
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseInsensitiveComparer;

impl ShardingComparer for CaseInsensitiveComparer {
    fn compare(&self, a: &ShardKeyValue, b: &ShardKeyValue) -> Ordering {
        match (a, b) {
            (ShardKeyValue::String(x), ShardKeyValue::String(y)) => {
                x.to_lowercase().cmp(&y.to_lowercase())
            }
            _ => a.cmp(b),
        }
    }
}

/// Comparer selection in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparerKind {
    #[default]
    Natural,
    CaseInsensitive,
}

impl ComparerKind {
    pub fn build(self) -> Box<dyn ShardingComparer> {
        match self {
            ComparerKind::Natural => Box::new(NaturalComparer),
            ComparerKind::CaseInsensitive => Box::new(CaseInsensitiveComparer),
        }
    }
}
