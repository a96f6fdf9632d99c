//! Physical table discovery
//!
//! A `TableEnsureManager` reports which physical tables exist in a
//! datasource. The default reports none and leaves the tail universe to the
//! caller.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

pub trait TableEnsureManager: Send + Sync {
    /// Physical table names present in `data_source`
    fn existing_tables(&self, data_source: &str) -> BTreeSet<String>;
}

/// Reports no tables
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyTableEnsureManager;

impl TableEnsureManager for EmptyTableEnsureManager {
    fn existing_tables(&self, _data_source: &str) -> BTreeSet<String> {
        BTreeSet::new()
    }
}

/// Fixed table list per datasource, taken from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticTableEnsureManager {
    tables: BTreeMap<String, BTreeSet<String>>,
}

impl StaticTableEnsureManager {
    pub fn new(tables: BTreeMap<String, BTreeSet<String>>) -> Self {
        Self { tables }
    }
}

impl TableEnsureManager for StaticTableEnsureManager {
    fn existing_tables(&self, data_source: &str) -> BTreeSet<String> {
        self.tables.get(data_source).cloned().unwrap_or_default()
    }
}

/// Table discovery selection in configuration files
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableEnsureConfig {
    #[default]
    None,
    /// Tables listed per datasource name
    Static {
        tables: BTreeMap<String, BTreeSet<String>>,
    },
}

impl TableEnsureConfig {
    pub fn build(&self) -> Box<dyn TableEnsureManager> {
        match self {
            TableEnsureConfig::None => Box::new(EmptyTableEnsureManager),
            TableEnsureConfig::Static { tables } => {
                Box::new(StaticTableEnsureManager::new(tables.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_manager() {
        assert!(EmptyTableEnsureManager.existing_tables("ds0").is_empty());
    }

    #[test]
    fn test_static_from_json() {
        let config: TableEnsureConfig = serde_json::from_value(json!({
            "kind": "static",
            "tables": {"ds0": ["order_0", "order_1"]}
        }))
        .unwrap();
        let manager = config.build();
        assert_eq!(
            manager.existing_tables("ds0").into_iter().collect::<Vec<_>>(),
            vec!["order_0", "order_1"]
        );
        assert!(manager.existing_tables("ds1").is_empty());
    }

    #[test]
    fn test_default_is_none() {
        let config: TableEnsureConfig = serde_json::from_value(json!({"kind": "none"})).unwrap();
        assert_eq!(config, TableEnsureConfig::default());
    }
}
