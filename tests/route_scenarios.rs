//! Route resolution scenarios
//!
//! Algebraic properties of the fold, checked pointwise over a fixed tail
//! universe, plus the modulus scenario end to end.

use serde_json::json;

use shardroute::observability::MetricsRegistry;
use shardroute::routing::{
    CollectionExpr, EntityMetadata, LiteralError, Operand, PredicateNode, ResolveOptions,
    RouteResolver, ShardKeyType, ShardKeyValue, ShardingKeyKind, ShardingOperator,
    TailPredicate, ZeroValuePolicy,
};

const TAILS: [&str; 4] = ["_0", "_1", "_2", "_3"];

fn order() -> EntityMetadata {
    EntityMetadata::new("Order")
        .with_table_key("Id", ShardKeyType::Int)
        .with_datasource_key("Region", ShardKeyType::String)
}

fn id() -> Operand {
    Operand::property("Order", "Id")
}

fn cmp(op: ShardingOperator, v: i64) -> PredicateNode {
    PredicateNode::compare(id(), op, Operand::constant(v))
}

fn eq(v: i64) -> PredicateNode {
    cmp(ShardingOperator::Equal, v)
}

/// `tail == "_" + (id mod 4)`, narrowing only on Equal
fn modulus(value: &ShardKeyValue, op: ShardingOperator) -> TailPredicate {
    match (value.as_i64(), op) {
        (Some(id), ShardingOperator::Equal) => {
            TailPredicate::tail_in([format!("_{}", id.rem_euclid(4))])
        }
        _ => TailPredicate::Always,
    }
}

/// Ids 0..40 in buckets of ten, tail `_k` holds `[10k, 10k + 9]`
fn ranges(value: &ShardKeyValue, op: ShardingOperator) -> TailPredicate {
    let Some(v) = value.as_i64() else {
        return TailPredicate::Always;
    };
    let admitted = (0..4i64).filter(|k| {
        let (lo, hi) = (k * 10, k * 10 + 9);
        match op {
            ShardingOperator::Equal => lo <= v && v <= hi,
            ShardingOperator::LessThan => lo < v,
            ShardingOperator::LessThanOrEqual => lo <= v,
            ShardingOperator::GreaterThan => hi > v,
            ShardingOperator::GreaterThanOrEqual => hi >= v,
            ShardingOperator::NotEqual | ShardingOperator::Unknown => true,
        }
    });
    TailPredicate::tail_in(admitted.map(|k| format!("_{}", k)).collect::<Vec<_>>())
}

fn tails_of(p: &TailPredicate) -> Vec<&'static str> {
    p.filter_tails(TAILS)
}

fn resolve_with<M>(mapper: &M, node: &PredicateNode) -> TailPredicate
where
    M: Fn(&ShardKeyValue, ShardingOperator) -> TailPredicate,
{
    let meta = order();
    RouteResolver::new(&meta, ShardingKeyKind::Table, mapper)
        .resolve(node)
        .unwrap()
}

fn resolve(node: &PredicateNode) -> TailPredicate {
    resolve_with(&modulus, node)
}

// =============================================================================
// MODULUS SCENARIO
// =============================================================================

#[test]
fn test_modulus_single_equality() {
    assert_eq!(tails_of(&resolve(&eq(7))), vec!["_3"]);
}

#[test]
fn test_modulus_disjunction() {
    let node = PredicateNode::or(eq(7), eq(10));
    assert_eq!(tails_of(&resolve(&node)), vec!["_2", "_3"]);
}

#[test]
fn test_modulus_membership_matches_disjunction() {
    let node = PredicateNode::contains(CollectionExpr::items([7, 10]), id());
    assert_eq!(tails_of(&resolve(&node)), vec!["_2", "_3"]);
}

#[test]
fn test_modulus_not_equal_narrows_nothing() {
    let node = cmp(ShardingOperator::NotEqual, 7);
    assert_eq!(tails_of(&resolve(&node)), TAILS.to_vec());
}

#[test]
fn test_modulus_unrecognised_call() {
    let node = PredicateNode::opaque("o.Name.StartsWith(\"x\")");
    assert_eq!(tails_of(&resolve(&node)), TAILS.to_vec());
}

// =============================================================================
// ALGEBRAIC PROPERTIES
// =============================================================================

#[test]
fn test_and_or_distribute_pointwise() {
    let pairs = [
        (eq(1), eq(2)),
        (eq(1), cmp(ShardingOperator::LessThan, 25)),
        (cmp(ShardingOperator::GreaterThan, 12), cmp(ShardingOperator::LessThanOrEqual, 31)),
        (eq(5), PredicateNode::opaque("x")),
    ];
    for mapper in [ranges as fn(&ShardKeyValue, ShardingOperator) -> TailPredicate, modulus] {
        for (l, r) in &pairs {
            let rl = resolve_with(&mapper, l);
            let rr = resolve_with(&mapper, r);

            let and = resolve_with(&mapper, &PredicateNode::and(l.clone(), r.clone()));
            let or = resolve_with(&mapper, &PredicateNode::or(l.clone(), r.clone()));
            for t in TAILS {
                assert_eq!(and.matches(t), rl.matches(t) && rr.matches(t), "AND at {}", t);
                assert_eq!(or.matches(t), rl.matches(t) || rr.matches(t), "OR at {}", t);
            }
        }
    }
}

#[test]
fn test_operator_mirroring() {
    let cases = [
        (ShardingOperator::GreaterThan, ShardingOperator::LessThan),
        (ShardingOperator::GreaterThanOrEqual, ShardingOperator::LessThanOrEqual),
        (ShardingOperator::LessThan, ShardingOperator::GreaterThan),
        (ShardingOperator::LessThanOrEqual, ShardingOperator::GreaterThanOrEqual),
        (ShardingOperator::Equal, ShardingOperator::Equal),
    ];
    for (op, mirrored) in cases {
        let lit_left = PredicateNode::compare(Operand::constant(15), op, id());
        let key_left = cmp(mirrored, 15);
        assert_eq!(
            tails_of(&resolve_with(&ranges, &lit_left)),
            tails_of(&resolve_with(&ranges, &key_left)),
            "{} mirrored",
            op
        );
    }
}

#[test]
fn test_membership_expansion() {
    let node = PredicateNode::contains(CollectionExpr::items([3, 14, 38]), id());
    let expanded = PredicateNode::any_of([eq(3), eq(14), eq(38)]).unwrap();
    assert_eq!(
        tails_of(&resolve_with(&ranges, &node)),
        tails_of(&resolve_with(&ranges, &expanded))
    );
    assert_eq!(tails_of(&resolve_with(&ranges, &node)), vec!["_0", "_1", "_3"]);
}

#[test]
fn test_negated_membership() {
    // Counts NotEqual leaves and narrows each to all tails but the value's own
    let excluding = |v: &ShardKeyValue, op: ShardingOperator| match (v.as_i64(), op) {
        (Some(id), ShardingOperator::NotEqual) => {
            let own = format!("_{}", id.rem_euclid(4));
            TailPredicate::from_fn(format!("tail != {}", own), move |t| t != own)
        }
        _ => TailPredicate::Always,
    };

    let node = PredicateNode::not(PredicateNode::contains(CollectionExpr::items([1, 2]), id()));
    let expected = PredicateNode::and(
        cmp(ShardingOperator::NotEqual, 1),
        cmp(ShardingOperator::NotEqual, 2),
    );
    assert_eq!(
        tails_of(&resolve_with(&excluding, &node)),
        tails_of(&resolve_with(&excluding, &expected))
    );
    assert_eq!(tails_of(&resolve_with(&excluding, &node)), vec!["_0", "_3"]);

    // the explicit negated form folds identically
    let direct = PredicateNode::not_contains(CollectionExpr::items([1, 2]), id());
    assert_eq!(tails_of(&resolve_with(&excluding, &direct)), vec!["_0", "_3"]);
}

#[test]
fn test_irrelevant_key_reference() {
    let other_property = PredicateNode::compare(
        Operand::property("Order", "CustomerId"),
        ShardingOperator::Equal,
        Operand::constant(7),
    );
    let other_entity = PredicateNode::compare(
        Operand::property("Customer", "Id"),
        ShardingOperator::Equal,
        Operand::constant(7),
    );
    let datasource_key = PredicateNode::compare(
        Operand::property("Order", "Region"),
        ShardingOperator::Equal,
        Operand::constant("eu"),
    );
    for node in [other_property, other_entity, datasource_key] {
        assert!(resolve(&node).is_always());
    }
}

#[test]
fn test_datasource_key_resolution() {
    let meta = order();
    let by_region = |v: &ShardKeyValue, op: ShardingOperator| match (v.as_str(), op) {
        (Some(region), ShardingOperator::Equal) => TailPredicate::tail_in([format!("ds_{}", region)]),
        _ => TailPredicate::Always,
    };
    let resolver = RouteResolver::new(&meta, ShardingKeyKind::DataSource, &by_region);

    let node = PredicateNode::and(
        eq(7),
        PredicateNode::equals_call(Operand::property("Order", "Region"), Operand::constant("eu")),
    );
    let p = resolver.resolve(&node).unwrap();
    assert_eq!(p.filter_tails(["ds_eu", "ds_us"]), vec!["ds_eu"]);
}

// =============================================================================
// LITERALS AND FAILURES
// =============================================================================

#[test]
fn test_closed_over_member_paths() {
    let filter = json!({"range": {"ids": [7, 10]}, "pick": {"id": 6}});
    let node = PredicateNode::or(
        PredicateNode::compare(
            id(),
            ShardingOperator::Equal,
            Operand::captured(filter.clone(), ["pick", "id"]),
        ),
        PredicateNode::contains(CollectionExpr::captured(filter, ["range", "ids"]), id()),
    );
    assert_eq!(tails_of(&resolve(&node)), vec!["_2", "_3"]);
}

#[test]
fn test_literal_failure_aborts_resolution() {
    let meta = order();
    let metrics = MetricsRegistry::new();
    let resolver =
        RouteResolver::new(&meta, ShardingKeyKind::Table, &modulus).with_metrics(&metrics);

    let node = PredicateNode::and(
        eq(7),
        PredicateNode::compare(
            id(),
            ShardingOperator::Equal,
            Operand::captured(json!({"customer": null}), ["customer", "id"]),
        ),
    );
    let err = resolver.resolve(&node).unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(err.code(), "SHARD_ROUTE_LITERAL_FAILED");
    assert!(err.to_string().contains("Order.Id"));
    assert_eq!(metrics.snapshot().failures, 1);
}

#[test]
fn test_failing_deferred_collection() {
    let node = PredicateNode::contains(
        CollectionExpr::deferred("ids[1 / zero]", || {
            Err(LiteralError::Arithmetic("division by zero".into()))
        }),
        id(),
    );
    let meta = order();
    let result = RouteResolver::new(&meta, ShardingKeyKind::Table, &modulus).resolve(&node);
    assert!(result.is_err());
}

#[test]
fn test_live_sources_are_opaque() {
    let nodes = [
        PredicateNode::contains(CollectionExpr::live("orders.Select(o => o.Id)"), id()),
        PredicateNode::compare(id(), ShardingOperator::Equal, Operand::live("orders.Max(o => o.Id)")),
    ];
    for node in nodes {
        assert!(resolve(&node).is_always());
    }
}

#[test]
fn test_zero_key_policy() {
    assert!(resolve(&eq(0)).is_always());

    let meta = order();
    let resolver = RouteResolver::new(&meta, ShardingKeyKind::Table, &modulus)
        .with_options(ResolveOptions::default().with_zero_values(ZeroValuePolicy::TreatAsKey));
    assert_eq!(resolver.resolve(&eq(0)).unwrap().filter_tails(TAILS), vec!["_0"]);
}

// =============================================================================
// LIMITS AND CONCURRENCY
// =============================================================================

fn nest_not(node: PredicateNode, times: usize) -> PredicateNode {
    (0..times).fold(node, |n, _| PredicateNode::not(n))
}

#[test]
fn test_depth_limit() {
    let meta = order();
    let resolver = RouteResolver::new(&meta, ShardingKeyKind::Table, &modulus);

    let within = nest_not(eq(7), 100);
    assert_eq!(resolver.resolve(&within).unwrap().filter_tails(TAILS), vec!["_3"]);

    let beyond = nest_not(eq(7), 300);
    assert!(resolver.resolve(&beyond).unwrap().is_always());
}

#[test]
fn test_large_membership_list() {
    let node = PredicateNode::contains(CollectionExpr::items((1..=20_000i64).map(|i| i * 4)), id());
    let meta = order();
    let p = RouteResolver::new(&meta, ShardingKeyKind::Table, &modulus)
        .resolve(&node)
        .unwrap();
    assert_eq!(p.filter_tails(TAILS), vec!["_0"]);
}

#[test]
fn test_where_chain() {
    let meta = order();
    let resolver = RouteResolver::new(&meta, ShardingKeyKind::Table, &modulus);
    let resolution = resolver
        .route(&[
            PredicateNode::contains(CollectionExpr::items([5, 6, 7]), id()),
            PredicateNode::not(eq(6)),
            PredicateNode::or(eq(7), eq(6)),
        ])
        .unwrap();
    assert_eq!(resolution.matching_tails(TAILS), vec!["_2", "_3"]);
    assert_eq!(resolution.require_match(TAILS).unwrap(), vec!["_2", "_3"]);
}

#[test]
fn test_concurrent_resolutions() {
    let meta = order();
    let metrics = MetricsRegistry::new();
    let resolver =
        RouteResolver::new(&meta, ShardingKeyKind::Table, &modulus).with_metrics(&metrics);

    std::thread::scope(|s| {
        for i in 0..8i64 {
            let resolver = &resolver;
            s.spawn(move || {
                for _ in 0..100 {
                    let p = resolver.resolve(&eq(i)).unwrap();
                    if i == 0 {
                        assert!(p.is_always());
                    } else {
                        let expected = format!("_{}", i % 4);
                        assert_eq!(p.filter_tails(TAILS), vec![expected.as_str()]);
                    }
                }
            });
        }
    });
    assert_eq!(metrics.snapshot().resolutions, 800);
}
