//! Structural subtyping over proper types (JLS 4.10), plus erasure and the
//! primitive boxing map.
//!
//! Everything here is a read-only query. Improper types (those mentioning
//! inference variables) are never subtypes of anything: the inference engine
//! reduces them to constraints before consulting this module.

use std::collections::HashSet;

use crate::{
    helpers::instantiate_as_supertype, ClassType, PrimitiveType, Type, TypeEnv, TypeVarId,
    WildcardBound,
};

/// Structural subtype test: `s <: t`.
pub fn is_subtype(env: &dyn TypeEnv, s: &Type, t: &Type) -> bool {
    let mut seen = HashSet::new();
    is_subtype_impl(env, s, t, &mut seen)
}

pub(crate) fn is_subtype_impl(
    env: &dyn TypeEnv,
    s: &Type,
    t: &Type,
    seen: &mut HashSet<TypeVarId>,
) -> bool {
    if s == t {
        return true;
    }
    if !s.is_proper() || !t.is_proper() {
        return false;
    }

    // Everything reference-shaped is below Object.
    if let Type::Class(ct) = t {
        if ct.def == env.well_known().object && ct.args.is_empty() {
            return is_reference(s);
        }
    }

    match (s, t) {
        (Type::Null, _) => return is_reference(t),
        (_, Type::Null) => return false,
        (Type::Primitive(_), _) | (_, Type::Primitive(_)) => return false,
        (Type::Void, _) | (_, Type::Void) => return false,
        (Type::Wildcard(_), _) | (_, Type::Wildcard(_)) => return false,
        _ => {}
    }

    // An intersection target requires all of its members.
    if let Type::Intersection(parts) = t {
        return parts.iter().all(|p| is_subtype_impl(env, s, p, seen));
    }
    // An intersection source provides any of its members.
    if let Type::Intersection(parts) = s {
        return parts.iter().any(|p| is_subtype_impl(env, p, t, seen));
    }

    // A type-variable target is only reachable through its lower bound
    // (capture variables produced from `? super` wildcards carry one).
    if let Type::TypeVar(id) = t {
        if seen.insert(*id) {
            let lower = env.type_param(*id).and_then(|d| d.lower_bound.clone());
            let ok = lower.is_some_and(|lower| is_subtype_impl(env, s, &lower, seen));
            seen.remove(id);
            if ok {
                return true;
            }
        }
        if !matches!(s, Type::TypeVar(_)) {
            return false;
        }
        // A type-variable source may still reach `t` via its upper bounds.
    }

    if let Type::TypeVar(id) = s {
        if !seen.insert(*id) {
            return false;
        }
        let ok = env.type_param(*id).is_some_and(|d| {
            d.upper_bounds
                .iter()
                .any(|upper| is_subtype_impl(env, upper, t, seen))
        });
        seen.remove(id);
        return ok;
    }
    if matches!(t, Type::TypeVar(_)) {
        return false;
    }

    match (s, t) {
        (Type::Array(se), Type::Array(te)) => {
            // Reference components are covariant, primitive components exact.
            if se.is_primitive() || te.is_primitive() {
                se == te
            } else {
                is_subtype_impl(env, se, te, seen)
            }
        }
        (Type::Array(_), Type::Class(ct)) => {
            let wk = env.well_known();
            ct.args.is_empty()
                && (ct.def == wk.cloneable || ct.def == wk.serializable)
        }
        (Type::Class(_), Type::Array(_)) => false,
        (Type::Class(_), Type::Class(target)) => class_subtype(env, s, target, seen),
        _ => false,
    }
}

fn class_subtype(
    env: &dyn TypeEnv,
    s: &Type,
    target: &ClassType,
    seen: &mut HashSet<TypeVarId>,
) -> bool {
    let Some(Type::Class(ClassType { args: s_args, .. })) =
        instantiate_as_supertype(env, s, target.def)
    else {
        return false;
    };
    if target.args.is_empty() {
        // Raw target: any parameterization (or rawness) of the class will do.
        return true;
    }
    if s_args.is_empty() || s_args.len() != target.args.len() {
        return false;
    }
    s_args
        .iter()
        .zip(&target.args)
        .all(|(s_arg, t_arg)| contains_impl(env, t_arg, s_arg, seen))
}

fn is_reference(ty: &Type) -> bool {
    matches!(
        ty,
        Type::Class(_) | Type::Array(_) | Type::Intersection(_) | Type::TypeVar(_) | Type::Null
    )
}

/// Type-argument containment (JLS 4.5.1): does `outer` contain `inner`?
pub fn contains_type_argument(env: &dyn TypeEnv, outer: &Type, inner: &Type) -> bool {
    let mut seen = HashSet::new();
    contains_impl(env, outer, inner, &mut seen)
}

fn contains_impl(
    env: &dyn TypeEnv,
    outer: &Type,
    inner: &Type,
    seen: &mut HashSet<TypeVarId>,
) -> bool {
    if outer == inner {
        return true;
    }
    match outer {
        Type::Wildcard(WildcardBound::Unbounded) => true,
        Type::Wildcard(WildcardBound::Extends(upper)) => match inner {
            // `?` is shorthand for `? extends Object`.
            Type::Wildcard(WildcardBound::Unbounded)
            | Type::Wildcard(WildcardBound::Super(_)) => is_object(env, upper),
            Type::Wildcard(WildcardBound::Extends(inner_upper)) => {
                is_subtype_impl(env, inner_upper, upper, seen)
            }
            _ => is_subtype_impl(env, inner, upper, seen),
        },
        Type::Wildcard(WildcardBound::Super(lower)) => match inner {
            Type::Wildcard(WildcardBound::Super(inner_lower)) => {
                is_subtype_impl(env, lower, inner_lower, seen)
            }
            Type::Wildcard(_) => false,
            _ => is_subtype_impl(env, lower, inner, seen),
        },
        // A non-wildcard argument contains only itself.
        _ => false,
    }
}

pub(crate) fn is_object(env: &dyn TypeEnv, ty: &Type) -> bool {
    matches!(ty, Type::Class(ct) if ct.def == env.well_known().object && ct.args.is_empty())
}

/// Loose invocation compatibility: subtyping plus boxing/unboxing.
pub fn is_loosely_assignable(env: &dyn TypeEnv, s: &Type, t: &Type) -> bool {
    if is_subtype(env, s, t) {
        return true;
    }
    if let Type::Primitive(p) = s {
        return is_subtype(env, &box_primitive(env, *p), t);
    }
    if let Type::Primitive(p) = t {
        return unboxed_primitive(env, s) == Some(*p);
    }
    false
}

pub fn box_primitive(env: &dyn TypeEnv, p: PrimitiveType) -> Type {
    let wk = env.well_known();
    let def = match p {
        PrimitiveType::Boolean => wk.boolean,
        PrimitiveType::Byte => wk.byte,
        PrimitiveType::Short => wk.short,
        PrimitiveType::Char => wk.character,
        PrimitiveType::Int => wk.integer,
        PrimitiveType::Long => wk.long,
        PrimitiveType::Float => wk.float,
        PrimitiveType::Double => wk.double,
    };
    Type::class(def, vec![])
}

pub fn unboxed_primitive(env: &dyn TypeEnv, ty: &Type) -> Option<PrimitiveType> {
    let Type::Class(ClassType { def, args }) = ty else {
        return None;
    };
    if !args.is_empty() {
        return None;
    }
    let wk = env.well_known();
    let p = match *def {
        d if d == wk.boolean => PrimitiveType::Boolean,
        d if d == wk.byte => PrimitiveType::Byte,
        d if d == wk.short => PrimitiveType::Short,
        d if d == wk.character => PrimitiveType::Char,
        d if d == wk.integer => PrimitiveType::Int,
        d if d == wk.long => PrimitiveType::Long,
        d if d == wk.float => PrimitiveType::Float,
        d if d == wk.double => PrimitiveType::Double,
        _ => return None,
    };
    Some(p)
}

/// Raw-type erasure (JLS 4.6).
pub fn erasure(env: &dyn TypeEnv, ty: &Type) -> Type {
    let mut seen = HashSet::new();
    erasure_impl(env, ty, &mut seen)
}

fn erasure_impl(env: &dyn TypeEnv, ty: &Type, seen: &mut HashSet<TypeVarId>) -> Type {
    let object = || Type::class(env.well_known().object, vec![]);
    match ty {
        Type::Class(ClassType { def, .. }) => Type::class(*def, vec![]),
        Type::Array(component) => Type::array(erasure_impl(env, component, seen)),
        Type::Intersection(parts) => match parts.first() {
            Some(first) => erasure_impl(env, first, seen),
            None => object(),
        },
        Type::TypeVar(id) => {
            if !seen.insert(*id) {
                return object();
            }
            let erased = env
                .type_param(*id)
                .and_then(|d| d.upper_bounds.first().cloned())
                .map(|upper| erasure_impl(env, &upper, seen))
                .unwrap_or_else(object);
            seen.remove(id);
            erased
        }
        Type::Wildcard(WildcardBound::Extends(upper)) => erasure_impl(env, upper, seen),
        Type::Wildcard(_) => object(),
        _ => ty.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TypeStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn primitive_arrays_are_cloneable_and_serializable() {
        let env = TypeStore::with_minimal_jdk();
        let int_array = Type::array(Type::int());

        for id in [
            env.well_known().object,
            env.well_known().cloneable,
            env.well_known().serializable,
        ] {
            assert!(is_subtype(&env, &int_array, &Type::class(id, vec![])));
        }
    }

    #[test]
    fn boxing_round_trips() {
        let env = TypeStore::with_minimal_jdk();
        for p in [
            PrimitiveType::Boolean,
            PrimitiveType::Byte,
            PrimitiveType::Short,
            PrimitiveType::Char,
            PrimitiveType::Int,
            PrimitiveType::Long,
            PrimitiveType::Float,
            PrimitiveType::Double,
        ] {
            assert_eq!(unboxed_primitive(&env, &box_primitive(&env, p)), Some(p));
        }
    }

    #[test]
    fn erasure_strips_type_arguments() {
        let env = TypeStore::with_minimal_jdk();
        let list = env.well_known().list;
        let string = Type::class(env.well_known().string, vec![]);

        assert_eq!(
            erasure(&env, &Type::class(list, vec![string])),
            Type::class(list, vec![])
        );
    }

    #[test]
    fn erasure_of_type_variable_uses_leftmost_bound() {
        let mut env = TypeStore::with_minimal_jdk();
        let number = Type::class(env.well_known().number, vec![]);
        let t = env.add_type_param("T", vec![number.clone()]);

        assert_eq!(erasure(&env, &Type::TypeVar(t)), number);
    }
}
