//! Least-upper-bound / greatest-lower-bound computation over proper types,
//! and deterministic intersection construction.
//!
//! The lub here is best-effort rather than the full JLS 4.10.4 construction:
//! common supertype candidates come from the erased superclass closure, and
//! diverging type arguments widen to wildcards. Recursive argument merges
//! (`Comparable<Integer>` vs `Comparable<Double>`) are cut off by a
//! visited-pair guard instead of the JLS infinite-type machinery.

use std::collections::{BTreeSet, HashSet};

use crate::{
    class_closure, format_type, instantiate_as_supertype, is_subtype, ClassKind, ClassType, Type,
    TypeEnv, WildcardBound,
};

/// Sort rank within an intersection: classes first, then interfaces, then
/// everything else. Keeps intersections deterministic regardless of the
/// order members were discovered in.
pub fn intersection_component_rank(env: &dyn TypeEnv, ty: &Type) -> u8 {
    match ty {
        Type::Class(ClassType { def, .. }) => match env.class(*def).map(|d| d.kind) {
            Some(ClassKind::Class) => 0,
            Some(ClassKind::Interface) => 1,
            None => 2,
        },
        _ => 3,
    }
}

/// A stable, human-readable ordering key.
pub fn type_sort_key(env: &dyn TypeEnv, ty: &Type) -> String {
    format_type(env, ty)
}

/// Build an intersection type: flatten nested members, drop duplicates and
/// redundant supertypes, and order members deterministically. Collapses to
/// the single member (or Object for an empty input).
pub fn make_intersection(env: &dyn TypeEnv, parts: Vec<Type>) -> Type {
    let mut flat = Vec::new();
    flatten(parts, &mut flat);

    let mut members: Vec<Type> = Vec::new();
    for part in flat {
        if !members.contains(&part) {
            members.push(part);
        }
    }

    // Drop members another member is already a strict subtype of.
    let redundant: Vec<bool> = members
        .iter()
        .enumerate()
        .map(|(i, m)| {
            members.iter().enumerate().any(|(j, other)| {
                i != j && is_subtype(env, other, m) && !is_subtype(env, m, other)
            })
        })
        .collect();
    let mut members: Vec<Type> = members
        .into_iter()
        .zip(redundant)
        .filter(|(_, r)| !r)
        .map(|(m, _)| m)
        .collect();

    members.sort_by_cached_key(|ty| (intersection_component_rank(env, ty), type_sort_key(env, ty)));

    match members.len() {
        0 => Type::class(env.well_known().object, vec![]),
        1 => members.remove(0),
        _ => Type::Intersection(members),
    }
}

fn flatten(parts: Vec<Type>, out: &mut Vec<Type>) {
    for part in parts {
        match part {
            Type::Intersection(nested) => flatten(nested, out),
            other => out.push(other),
        }
    }
}

/// Greatest lower bound of two proper types.
pub fn glb(env: &dyn TypeEnv, a: &Type, b: &Type) -> Type {
    if is_subtype(env, a, b) {
        return a.clone();
    }
    if is_subtype(env, b, a) {
        return b.clone();
    }
    make_intersection(env, vec![a.clone(), b.clone()])
}

/// Greatest lower bound of a collection of proper types (Object when empty).
pub fn glb_all(env: &dyn TypeEnv, types: &[Type]) -> Type {
    make_intersection(env, types.to_vec())
}

/// Least upper bound of a collection of proper types.
///
/// The null type is absorbed by any reference type; an input of only null
/// types is the null type itself.
pub fn lub(env: &dyn TypeEnv, types: &[Type]) -> Type {
    let mut parts: Vec<&Type> = types.iter().filter(|t| !matches!(t, Type::Null)).collect();
    parts.dedup();
    let Some(first) = parts.first() else {
        return if types.is_empty() {
            Type::class(env.well_known().object, vec![])
        } else {
            Type::Null
        };
    };

    let mut seen = HashSet::new();
    let mut out = (*first).clone();
    for part in &parts[1..] {
        out = lub2(env, &out, part, &mut seen);
    }
    out
}

fn lub2(env: &dyn TypeEnv, a: &Type, b: &Type, seen: &mut HashSet<(Type, Type)>) -> Type {
    let object = || Type::class(env.well_known().object, vec![]);

    if is_subtype(env, a, b) {
        return b.clone();
    }
    if is_subtype(env, b, a) {
        return a.clone();
    }
    // Re-entrant merge of the same pair (`Comparable<Integer>` vs
    // `Comparable<Double>` merges its own arguments forever): cut off.
    if !seen.insert((a.clone(), b.clone())) {
        return object();
    }

    if let (Type::Array(ae), Type::Array(be)) = (a, b) {
        if !ae.is_primitive() && !be.is_primitive() {
            return Type::array(lub2(env, ae, be, seen));
        }
        let wk = env.well_known();
        return make_intersection(
            env,
            vec![
                Type::class(wk.cloneable, vec![]),
                Type::class(wk.serializable, vec![]),
            ],
        );
    }

    let common: BTreeSet<_> = class_closure(env, a)
        .intersection(&class_closure(env, b))
        .copied()
        .collect();
    if common.is_empty() {
        return object();
    }

    // Most specific candidates: drop anything another candidate already
    // erases to.
    let minimal: Vec<_> = common
        .iter()
        .copied()
        .filter(|c| {
            !common.iter().any(|d| {
                d != c && class_closure(env, &Type::class(*d, vec![])).contains(c)
            })
        })
        .collect();

    let mut members = Vec::new();
    for candidate in minimal {
        let Some(Type::Class(ClassType { args: a_args, .. })) =
            instantiate_as_supertype(env, a, candidate)
        else {
            continue;
        };
        let Some(Type::Class(ClassType { args: b_args, .. })) =
            instantiate_as_supertype(env, b, candidate)
        else {
            continue;
        };
        if a_args.is_empty() || b_args.is_empty() || a_args.len() != b_args.len() {
            members.push(Type::class(candidate, vec![]));
            continue;
        }
        let merged: Vec<Type> = a_args
            .iter()
            .zip(&b_args)
            .map(|(x, y)| merge_argument(env, x, y, seen))
            .collect();
        members.push(Type::class(candidate, merged));
    }

    make_intersection(env, members)
}

/// Least containing type argument, best-effort (JLS 4.10.4 "lcta").
fn merge_argument(env: &dyn TypeEnv, a: &Type, b: &Type, seen: &mut HashSet<(Type, Type)>) -> Type {
    if a == b {
        return a.clone();
    }
    match (a, b) {
        (Type::Wildcard(WildcardBound::Super(x)), Type::Wildcard(WildcardBound::Super(y))) => {
            Type::Wildcard(WildcardBound::Super(Box::new(glb(env, x, y))))
        }
        (Type::Wildcard(WildcardBound::Super(_)), _)
        | (_, Type::Wildcard(WildcardBound::Super(_)))
        | (Type::Wildcard(WildcardBound::Unbounded), _)
        | (_, Type::Wildcard(WildcardBound::Unbounded)) => {
            Type::Wildcard(WildcardBound::Unbounded)
        }
        _ => {
            let upper = |t: &Type| match t {
                Type::Wildcard(WildcardBound::Extends(u)) => (**u).clone(),
                other => other.clone(),
            };
            let merged = lub2(env, &upper(a), &upper(b), seen);
            if crate::subtyping::is_object(env, &merged) {
                Type::Wildcard(WildcardBound::Unbounded)
            } else {
                Type::Wildcard(WildcardBound::Extends(Box::new(merged)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TypeStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn make_intersection_drops_redundant_supertypes() {
        let env = TypeStore::with_minimal_jdk();
        let number = Type::class(env.well_known().number, vec![]);
        let integer = Type::class(env.well_known().integer, vec![]);

        assert_eq!(
            make_intersection(&env, vec![number, integer.clone()]),
            integer
        );
    }

    #[test]
    fn make_intersection_is_order_independent() {
        let env = TypeStore::with_minimal_jdk();
        let cloneable = Type::class(env.well_known().cloneable, vec![]);
        let serializable = Type::class(env.well_known().serializable, vec![]);

        let a = make_intersection(&env, vec![cloneable.clone(), serializable.clone()]);
        let b = make_intersection(&env, vec![serializable, cloneable]);
        assert_eq!(a, b);
    }

    #[test]
    fn lub_of_subtype_pair_is_the_supertype() {
        let env = TypeStore::with_minimal_jdk();
        let number = Type::class(env.well_known().number, vec![]);
        let integer = Type::class(env.well_known().integer, vec![]);

        assert_eq!(lub(&env, &[integer, number.clone()]), number);
    }

    #[test]
    fn lub_of_integer_and_double_is_below_number() {
        let env = TypeStore::with_minimal_jdk();
        let number = Type::class(env.well_known().number, vec![]);
        let integer = Type::class(env.well_known().integer, vec![]);
        let double = Type::class(env.well_known().double, vec![]);

        let result = lub(&env, &[integer.clone(), double.clone()]);
        assert!(is_subtype(&env, &result, &number));
        assert!(is_subtype(&env, &integer, &result));
        assert!(is_subtype(&env, &double, &result));
    }

    #[test]
    fn lub_absorbs_null() {
        let env = TypeStore::with_minimal_jdk();
        let string = Type::class(env.well_known().string, vec![]);

        assert_eq!(lub(&env, &[Type::Null, string.clone()]), string);
        assert_eq!(lub(&env, &[Type::Null]), Type::Null);
    }

    #[test]
    fn lub_of_reference_arrays_lifts_component_lub() {
        let env = TypeStore::with_minimal_jdk();
        let number = Type::class(env.well_known().number, vec![]);
        let integer = Type::class(env.well_known().integer, vec![]);

        let result = lub(
            &env,
            &[Type::array(integer), Type::array(number.clone())],
        );
        assert_eq!(result, Type::array(number));
    }
}
