//! Logical combinators (AND, OR, NOT).
//!
//! `and`/`or` flatten nested same-kind combinators into a single ordered
//! child list, so translation can emit minimal parenthesization. `not` never
//! simplifies: `not(not(p))` stays two nodes deep.

use crate::expr::Predicate;

/// Conjunction of any number of predicates, flattening nested ANDs.
///
/// A single input is returned unchanged. An empty input yields `And([])`,
/// which the translator renders as a tautology.
pub fn and(predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
    combine(predicates, true)
}

/// `left AND right`.
pub fn and2(left: Predicate, right: Predicate) -> Predicate {
    and([left, right])
}

/// Disjunction of any number of predicates, flattening nested ORs.
///
/// A single input is returned unchanged. An empty input yields `Or([])`,
/// which the translator renders as a contradiction.
pub fn or(predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
    combine(predicates, false)
}

/// `left OR right`.
pub fn or2(left: Predicate, right: Predicate) -> Predicate {
    or([left, right])
}

/// Negation. Preserved structurally; double negation is not collapsed.
pub fn not(predicate: Predicate) -> Predicate {
    Predicate::Not(Box::new(predicate))
}

fn combine(predicates: impl IntoIterator<Item = Predicate>, conjunction: bool) -> Predicate {
    let mut flat = Vec::new();
    for predicate in predicates {
        match (conjunction, predicate) {
            (true, Predicate::And(children)) => flat.extend(children),
            (false, Predicate::Or(children)) => flat.extend(children),
            (_, other) => flat.push(other),
        }
    }
    if flat.len() == 1 {
        return flat.pop().expect("len checked");
    }
    if conjunction {
        Predicate::And(flat)
    } else {
        Predicate::Or(flat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::cmp::eq;

    fn leaf(n: i64) -> Predicate {
        eq(n, n).unwrap()
    }

    #[test]
    fn nested_same_kind_combinators_flatten() {
        let p = and2(and2(leaf(1), leaf(2)), leaf(3));
        match p {
            Predicate::And(children) => assert_eq!(children.len(), 3),
            other => panic!("expected And, got {other:?}"),
        }

        let q = or([or2(leaf(1), leaf(2)), or2(leaf(3), leaf(4))]);
        match q {
            Predicate::Or(children) => assert_eq!(children.len(), 4),
            other => panic!("expected Or, got {other:?}"),
        }
    }

    #[test]
    fn mixed_kinds_do_not_flatten() {
        let p = and2(or2(leaf(1), leaf(2)), leaf(3));
        match p {
            Predicate::And(children) => {
                assert_eq!(children.len(), 2);
                assert!(matches!(children[0], Predicate::Or(_)));
            }
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn double_negation_is_preserved() {
        let p = not(not(leaf(1)));
        let Predicate::Not(inner) = &p else {
            panic!("expected Not");
        };
        assert!(matches!(**inner, Predicate::Not(_)));
        assert_ne!(p, leaf(1));
    }

    #[test]
    fn single_input_is_returned_unchanged() {
        let p = leaf(7);
        assert_eq!(and([p.clone()]), p);
        assert_eq!(or([p.clone()]), p);
    }
}
