//! Key-to-tail mapping interface
//!
//! Concrete strategies (hash, modulus, range, time bucket) live with the
//! routing configuration that owns them. The resolver only requires that a
//! mapper is a pure function of its configuration: the same value and
//! operator always produce an equivalent predicate.

use super::operator::ShardingOperator;
use super::predicate::TailPredicate;
use super::value::ShardKeyValue;

/// Maps `key <op> value` to the tails that may hold matching rows
pub trait KeyToTailMapper {
    fn tail_predicate(&self, value: &ShardKeyValue, op: ShardingOperator) -> TailPredicate;
}

impl<F> KeyToTailMapper for F
where
    F: Fn(&ShardKeyValue, ShardingOperator) -> TailPredicate,
{
    fn tail_predicate(&self, value: &ShardKeyValue, op: ShardingOperator) -> TailPredicate {
        self(value, op)
    }
}

/// Mapper used by explain output.
///
/// Labels each request as `property op value` and admits every tail, so the
/// folded predicate shows the constraints without narrowing anything.
#[derive(Debug, Clone)]
pub struct SymbolicMapper {
    property: String,
}

impl SymbolicMapper {
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
        }
    }
}

impl KeyToTailMapper for SymbolicMapper {
    fn tail_predicate(&self, value: &ShardKeyValue, op: ShardingOperator) -> TailPredicate {
        TailPredicate::from_fn(format!("{} {} {}", self.property, op, value), |_| true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_mapper() {
        let mapper = |value: &ShardKeyValue, op: ShardingOperator| match (value, op) {
            (ShardKeyValue::Int(v), ShardingOperator::Equal) => {
                TailPredicate::tail_in([format!("_{}", v.rem_euclid(2))])
            }
            _ => TailPredicate::Always,
        };

        let p = mapper.tail_predicate(&ShardKeyValue::Int(5), ShardingOperator::Equal);
        assert_eq!(p.filter_tails(["_0", "_1"]), vec!["_1"]);

        let p = mapper.tail_predicate(&ShardKeyValue::Int(5), ShardingOperator::LessThan);
        assert!(p.is_always());
    }

    #[test]
    fn test_symbolic_mapper_labels_without_narrowing() {
        let mapper = SymbolicMapper::new("Id");
        let p = mapper.tail_predicate(&ShardKeyValue::Int(7), ShardingOperator::GreaterThan);
        assert_eq!(p.to_string(), "Id > 7");
        assert_eq!(p.filter_tails(["_0", "_1"]), vec!["_0", "_1"]);
    }
}
