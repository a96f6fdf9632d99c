//! Tail predicates
//!
//! A tail predicate answers "may this tail hold matching rows?". It is built
//! fresh for every resolution, holds no mutable state, and can be shared
//! across threads once built.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

type TailTest = dyn Fn(&str) -> bool + Send + Sync;

/// Labelled leaf test over tail identifiers
#[derive(Clone)]
pub struct TailFilter {
    label: String,
    test: Arc<TailTest>,
}

impl TailFilter {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn matches(&self, tail: &str) -> bool {
        (self.test)(tail)
    }
}

/// Tail-eligibility predicate
#[derive(Clone)]
pub enum TailPredicate {
    /// Every tail is eligible
    Always,
    /// No tail is eligible
    Never,
    Filter(TailFilter),
    And(Box<TailPredicate>, Box<TailPredicate>),
    Or(Box<TailPredicate>, Box<TailPredicate>),
}

impl TailPredicate {
    /// Wraps an arbitrary tail test
    pub fn from_fn<F>(label: impl Into<String>, test: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        TailPredicate::Filter(TailFilter {
            label: label.into(),
            test: Arc::new(test),
        })
    }

    /// Admits exactly the listed tails
    pub fn tail_in<I, S>(tails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = tails.into_iter().map(Into::into).collect();
        if set.is_empty() {
            return TailPredicate::Never;
        }
        let label = format!(
            "tail in {{{}}}",
            set.iter().cloned().collect::<Vec<_>>().join(", ")
        );
        TailPredicate::from_fn(label, move |tail| set.contains(tail))
    }

    /// Intersection, folding constants
    pub fn and(self, other: TailPredicate) -> Self {
        match (self, other) {
            (TailPredicate::Always, p) | (p, TailPredicate::Always) => p,
            (TailPredicate::Never, _) | (_, TailPredicate::Never) => TailPredicate::Never,
            (l, r) => TailPredicate::And(Box::new(l), Box::new(r)),
        }
    }

    /// Union, folding constants
    pub fn or(self, other: TailPredicate) -> Self {
        match (self, other) {
            (TailPredicate::Always, _) | (_, TailPredicate::Always) => TailPredicate::Always,
            (TailPredicate::Never, p) | (p, TailPredicate::Never) => p,
            (l, r) => TailPredicate::Or(Box::new(l), Box::new(r)),
        }
    }

    /// Union of all parts; `Never` when empty.
    ///
    /// Builds a balanced tree so large membership lists stay shallow.
    pub fn any<I>(parts: I) -> Self
    where
        I: IntoIterator<Item = TailPredicate>,
    {
        Self::balanced(parts.into_iter().collect(), &TailPredicate::Never, TailPredicate::or)
    }

    /// Intersection of all parts; `Always` when empty
    pub fn all<I>(parts: I) -> Self
    where
        I: IntoIterator<Item = TailPredicate>,
    {
        Self::balanced(parts.into_iter().collect(), &TailPredicate::Always, TailPredicate::and)
    }

    fn balanced(
        mut parts: Vec<TailPredicate>,
        empty: &TailPredicate,
        join: fn(TailPredicate, TailPredicate) -> TailPredicate,
    ) -> Self {
        if parts.len() <= 1 {
            return parts.pop().unwrap_or_else(|| empty.clone());
        }
        let right = parts.split_off(parts.len() / 2);
        join(
            Self::balanced(parts, empty, join),
            Self::balanced(right, empty, join),
        )
    }

    /// Evaluates the predicate for one tail
    pub fn matches(&self, tail: &str) -> bool {
        match self {
            TailPredicate::Always => true,
            TailPredicate::Never => false,
            TailPredicate::Filter(filter) => filter.matches(tail),
            TailPredicate::And(l, r) => l.matches(tail) && r.matches(tail),
            TailPredicate::Or(l, r) => l.matches(tail) || r.matches(tail),
        }
    }

    /// Keeps the eligible tails, preserving input order
    pub fn filter_tails<'t, I>(&self, tails: I) -> Vec<&'t str>
    where
        I: IntoIterator<Item = &'t str>,
    {
        tails.into_iter().filter(|t| self.matches(t)).collect()
    }

    pub fn is_always(&self) -> bool {
        matches!(self, TailPredicate::Always)
    }

    pub fn is_never(&self) -> bool {
        matches!(self, TailPredicate::Never)
    }
}

impl fmt::Display for TailPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TailPredicate::Always => f.write_str("ALL"),
            TailPredicate::Never => f.write_str("NONE"),
            TailPredicate::Filter(filter) => f.write_str(filter.label()),
            TailPredicate::And(l, r) => write!(f, "({} AND {})", l, r),
            TailPredicate::Or(l, r) => write!(f, "({} OR {})", l, r),
        }
    }
}

impl fmt::Debug for TailPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TailPredicate({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAILS: [&str; 4] = ["_0", "_1", "_2", "_3"];

    #[test]
    fn test_constants() {
        assert_eq!(TailPredicate::Always.filter_tails(TAILS), TAILS.to_vec());
        assert!(TailPredicate::Never.filter_tails(TAILS).is_empty());
    }

    #[test]
    fn test_tail_in() {
        let p = TailPredicate::tail_in(["_3", "_1"]);
        assert_eq!(p.filter_tails(TAILS), vec!["_1", "_3"]);
        assert_eq!(p.to_string(), "tail in {_1, _3}");
        assert!(TailPredicate::tail_in(Vec::<String>::new()).is_never());
    }

    #[test]
    fn test_and_or_pointwise() {
        let a = TailPredicate::tail_in(["_0", "_1"]);
        let b = TailPredicate::tail_in(["_1", "_2"]);
        assert_eq!(a.clone().and(b.clone()).filter_tails(TAILS), vec!["_1"]);
        assert_eq!(a.or(b).filter_tails(TAILS), vec!["_0", "_1", "_2"]);
    }

    #[test]
    fn test_constant_folding() {
        let a = TailPredicate::tail_in(["_0"]);
        assert!(TailPredicate::Always.or(a.clone()).is_always());
        assert!(TailPredicate::Never.and(a.clone()).is_never());
        assert!(matches!(TailPredicate::Always.and(a.clone()), TailPredicate::Filter(_)));
        assert!(matches!(TailPredicate::Never.or(a), TailPredicate::Filter(_)));
    }

    #[test]
    fn test_any_all() {
        assert!(TailPredicate::any(Vec::new()).is_never());
        assert!(TailPredicate::all(Vec::new()).is_always());

        let any = TailPredicate::any((0..3).map(|i| TailPredicate::tail_in([format!("_{}", i)])));
        assert_eq!(any.filter_tails(TAILS), vec!["_0", "_1", "_2"]);

        let all = TailPredicate::all(vec![
            TailPredicate::tail_in(["_0", "_1", "_2"]),
            TailPredicate::tail_in(["_1", "_2", "_3"]),
            TailPredicate::tail_in(["_2"]),
        ]);
        assert_eq!(all.filter_tails(TAILS), vec!["_2"]);
    }

    #[test]
    fn test_any_over_many_parts_stays_shallow() {
        let parts = (0..100_000).map(|i| TailPredicate::tail_in([format!("t{}", i)]));
        let p = TailPredicate::any(parts);
        assert!(p.matches("t99999"));
        assert!(!p.matches("_0"));
    }

    #[test]
    fn test_display_nesting() {
        let p = TailPredicate::tail_in(["_0"])
            .or(TailPredicate::tail_in(["_1"]))
            .and(TailPredicate::from_fn("even", |t| t.ends_with('0') || t.ends_with('2')));
        assert_eq!(p.to_string(), "((tail in {_0} OR tail in {_1}) AND even)");
    }

    #[test]
    fn test_shared_across_threads() {
        let p = TailPredicate::tail_in(["_2"]);
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| assert_eq!(p.filter_tails(TAILS), vec!["_2"]));
            }
        });
    }
}
