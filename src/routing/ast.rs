//! Predicate tree model
//!
//! The tree mirrors a boolean filter expression after the host query's native
//! representation has been normalised. Every node owns its children; the tree
//! is never cyclic and is never mutated by resolution.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::LiteralError;
use super::operator::ShardingOperator;
use super::value::ShardKeyType;

/// Which sharding key a resolution targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShardingKeyKind {
    /// Table-level key: picks physical table tails
    Table,
    /// Datasource-level key: picks datasource tails
    #[serde(rename = "datasource")]
    DataSource,
}

impl ShardingKeyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShardingKeyKind::Table => "table",
            ShardingKeyKind::DataSource => "datasource",
        }
    }
}

impl fmt::Display for ShardingKeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sharding key property and its declared type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardingKey {
    pub property: String,
    pub key_type: ShardKeyType,
}

/// Sharding metadata of one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMetadata {
    /// Entity (row type) name
    pub entity: String,
    /// Table sharding key, if the entity is table-sharded
    #[serde(default)]
    pub table_key: Option<ShardingKey>,
    /// Datasource sharding key, if the entity is datasource-sharded
    #[serde(default)]
    pub datasource_key: Option<ShardingKey>,
}

impl EntityMetadata {
    /// Creates metadata for an entity with no sharding keys
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            table_key: None,
            datasource_key: None,
        }
    }

    /// Sets the table sharding key
    pub fn with_table_key(mut self, property: impl Into<String>, key_type: ShardKeyType) -> Self {
        self.table_key = Some(ShardingKey {
            property: property.into(),
            key_type,
        });
        self
    }

    /// Sets the datasource sharding key
    pub fn with_datasource_key(
        mut self,
        property: impl Into<String>,
        key_type: ShardKeyType,
    ) -> Self {
        self.datasource_key = Some(ShardingKey {
            property: property.into(),
            key_type,
        });
        self
    }

    /// Returns the key of the given kind
    pub fn key(&self, kind: ShardingKeyKind) -> Option<&ShardingKey> {
        match kind {
            ShardingKeyKind::Table => self.table_key.as_ref(),
            ShardingKeyKind::DataSource => self.datasource_key.as_ref(),
        }
    }

    /// Returns true if `property` is this entity's sharding key of `kind`
    pub fn is_sharding_key(&self, kind: ShardingKeyKind, property: &PropertyRef) -> bool {
        match self.key(kind) {
            Some(key) => property.entity == self.entity && property.property == key.property,
            None => false,
        }
    }
}

/// Reference to an entity property, e.g. `o.Id`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyRef {
    pub entity: String,
    pub property: String,
}

impl fmt::Display for PropertyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.entity, self.property)
    }
}

type Thunk = dyn Fn() -> Result<Value, LiteralError> + Send + Sync;

/// A self-contained sub-expression evaluated in isolation.
///
/// The closure must not touch live or streaming data; it sees only values it
/// closed over when the tree was built.
#[derive(Clone)]
pub struct DeferredValue {
    label: String,
    eval: Arc<Thunk>,
}

impl DeferredValue {
    pub fn new<F>(label: impl Into<String>, eval: F) -> Self
    where
        F: Fn() -> Result<Value, LiteralError> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            eval: Arc::new(eval),
        }
    }

    /// Runs the closure
    pub fn evaluate(&self) -> Result<Value, LiteralError> {
        (self.eval)()
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for DeferredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredValue")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// One side of a comparison or call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operand {
    /// Entity property access
    Property(PropertyRef),
    /// Plain constant
    Constant { value: Value },
    /// Member path into a closed-over value, e.g. `filter.Range.Min`
    Captured { root: Value, path: Vec<String> },
    /// Self-contained sub-expression, evaluated on demand
    #[serde(skip)]
    Deferred(DeferredValue),
    /// Anything touching live relational or streaming data
    Live { description: String },
}

impl Operand {
    pub fn property(entity: impl Into<String>, property: impl Into<String>) -> Self {
        Operand::Property(PropertyRef {
            entity: entity.into(),
            property: property.into(),
        })
    }

    pub fn constant(value: impl Into<Value>) -> Self {
        Operand::Constant {
            value: value.into(),
        }
    }

    pub fn captured<I, S>(root: Value, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Operand::Captured {
            root,
            path: path.into_iter().map(Into::into).collect(),
        }
    }

    pub fn deferred<F>(label: impl Into<String>, eval: F) -> Self
    where
        F: Fn() -> Result<Value, LiteralError> + Send + Sync + 'static,
    {
        Operand::Deferred(DeferredValue::new(label, eval))
    }

    pub fn live(description: impl Into<String>) -> Self {
        Operand::Live {
            description: description.into(),
        }
    }

    /// Returns the referenced property, if this operand is one
    pub fn as_property(&self) -> Option<&PropertyRef> {
        match self {
            Operand::Property(p) => Some(p),
            _ => None,
        }
    }

    /// Returns true if the operand belongs to the literal grammar
    pub fn is_literal_shaped(&self) -> bool {
        matches!(
            self,
            Operand::Constant { .. } | Operand::Captured { .. } | Operand::Deferred(_)
        )
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Property(p) => write!(f, "{}", p),
            Operand::Constant { value } => write!(f, "{}", value),
            Operand::Captured { path, .. } => write!(f, "<captured>.{}", path.join(".")),
            Operand::Deferred(d) => write!(f, "<eval {}>", d.label()),
            Operand::Live { description } => write!(f, "<live {}>", description),
        }
    }
}

/// Collection side of a membership test
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CollectionExpr {
    /// Inline array or list initialiser
    Items { items: Vec<Value> },
    /// Member path into a closed-over collection
    Captured { root: Value, path: Vec<String> },
    /// Self-contained sub-expression producing an array
    #[serde(skip)]
    Deferred(DeferredValue),
    /// Sub-query or streaming source; never materialised
    Live { description: String },
}

impl CollectionExpr {
    pub fn items<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        CollectionExpr::Items {
            items: items.into_iter().map(Into::into).collect(),
        }
    }

    pub fn captured<I, S>(root: Value, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CollectionExpr::Captured {
            root,
            path: path.into_iter().map(Into::into).collect(),
        }
    }

    pub fn deferred<F>(label: impl Into<String>, eval: F) -> Self
    where
        F: Fn() -> Result<Value, LiteralError> + Send + Sync + 'static,
    {
        CollectionExpr::Deferred(DeferredValue::new(label, eval))
    }

    pub fn live(description: impl Into<String>) -> Self {
        CollectionExpr::Live {
            description: description.into(),
        }
    }
}

/// Filter expression node
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PredicateNode {
    /// `left <op> right`
    Compare {
        left: Operand,
        op: ShardingOperator,
        right: Operand,
    },
    /// `receiver.Equals(argument)`
    EqualsCall { receiver: Operand, argument: Operand },
    /// `collection.Contains(item)`, or its negation when `negated`
    Membership {
        collection: CollectionExpr,
        item: Operand,
        #[serde(default)]
        negated: bool,
    },
    Not { inner: Box<PredicateNode> },
    And {
        left: Box<PredicateNode>,
        right: Box<PredicateNode>,
    },
    Or {
        left: Box<PredicateNode>,
        right: Box<PredicateNode>,
    },
    /// Anything the normaliser could not classify
    Opaque {
        #[serde(default)]
        description: String,
    },
}

impl PredicateNode {
    pub fn compare(left: Operand, op: ShardingOperator, right: Operand) -> Self {
        PredicateNode::Compare { left, op, right }
    }

    pub fn equals_call(receiver: Operand, argument: Operand) -> Self {
        PredicateNode::EqualsCall { receiver, argument }
    }

    pub fn contains(collection: CollectionExpr, item: Operand) -> Self {
        PredicateNode::Membership {
            collection,
            item,
            negated: false,
        }
    }

    pub fn not_contains(collection: CollectionExpr, item: Operand) -> Self {
        PredicateNode::Membership {
            collection,
            item,
            negated: true,
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: PredicateNode) -> Self {
        PredicateNode::Not {
            inner: Box::new(inner),
        }
    }

    pub fn and(left: PredicateNode, right: PredicateNode) -> Self {
        PredicateNode::And {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn or(left: PredicateNode, right: PredicateNode) -> Self {
        PredicateNode::Or {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn opaque(description: impl Into<String>) -> Self {
        PredicateNode::Opaque {
            description: description.into(),
        }
    }

    /// Left-deep AND over all nodes; `None` when empty
    pub fn all_of(nodes: impl IntoIterator<Item = PredicateNode>) -> Option<Self> {
        nodes.into_iter().reduce(PredicateNode::and)
    }

    /// Left-deep OR over all nodes; `None` when empty
    pub fn any_of(nodes: impl IntoIterator<Item = PredicateNode>) -> Option<Self> {
        nodes.into_iter().reduce(PredicateNode::or)
    }

    /// Nesting depth; a leaf has depth 1
    pub fn depth(&self) -> usize {
        match self {
            PredicateNode::Not { inner } => 1 + inner.depth(),
            PredicateNode::And { left, right } | PredicateNode::Or { left, right } => {
                1 + left.depth().max(right.depth())
            }
            _ => 1,
        }
    }
}
