//! Supertype-graph helpers: viewing a type as a parameterization of one of
//! its superclasses, and collecting the erased superclass closure.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use crate::{substitute, ClassId, ClassKind, ClassType, Type, TypeEnv, TypeVarId};

/// Return `ty` viewed as `target` by walking the supertype graph and applying
/// type argument substitution along the way.
///
/// Example: `ArrayList<String>` viewed as `List` returns `List<String>`. Raw
/// uses of generic classes stay raw while walking, so `ArrayList` (raw)
/// viewed as `List` returns raw `List`. Conflicting instantiations reachable
/// through an intersection or a type variable's bounds are ambiguous and
/// return `None`.
pub fn instantiate_as_supertype(env: &dyn TypeEnv, ty: &Type, target: ClassId) -> Option<Type> {
    let mut seen_type_vars = HashSet::new();
    inner(env, ty, target, &mut seen_type_vars)
}

fn inner(
    env: &dyn TypeEnv,
    ty: &Type,
    target: ClassId,
    seen_type_vars: &mut HashSet<TypeVarId>,
) -> Option<Type> {
    match ty {
        Type::Array(_) => {
            let wk = env.well_known();
            if target == wk.object || target == wk.cloneable || target == wk.serializable {
                return Some(Type::class(target, vec![]));
            }
            return None;
        }
        Type::Intersection(parts) => {
            // Members are stored in deterministic order; a single consistent
            // instantiation wins, conflicting ones are ambiguous.
            let mut out: Option<Type> = None;
            for part in parts {
                let Some(found) = inner(env, part, target, seen_type_vars) else {
                    continue;
                };
                match &out {
                    None => out = Some(found),
                    Some(existing) if *existing == found => {}
                    Some(_) => return None,
                }
            }
            return out;
        }
        Type::TypeVar(id) => {
            if !seen_type_vars.insert(*id) {
                return None;
            }
            let mut out: Option<Type> = None;
            if let Some(tp) = env.type_param(*id) {
                for bound in &tp.upper_bounds {
                    let Some(found) = inner(env, bound, target, seen_type_vars) else {
                        continue;
                    };
                    match &out {
                        None => out = Some(found),
                        Some(existing) if *existing == found => {}
                        Some(_) => {
                            seen_type_vars.remove(id);
                            return None;
                        }
                    }
                }
            }
            seen_type_vars.remove(id);
            return out;
        }
        _ => {}
    }

    let Type::Class(ClassType { def, args }) = ty else {
        return None;
    };

    let mut queue: VecDeque<Type> = VecDeque::new();
    let mut seen: HashSet<(ClassId, Vec<Type>)> = HashSet::new();
    queue.push_back(Type::class(*def, args.clone()));

    while let Some(current) = queue.pop_front() {
        let Type::Class(ClassType { def, args }) = current.clone() else {
            continue;
        };
        if !seen.insert((def, args.clone())) {
            continue;
        }

        if def == target {
            return Some(current);
        }

        let Some(class_def) = env.class(def) else {
            continue;
        };

        // A raw instantiation cannot recover type arguments for its
        // supertypes; preserve rawness while walking.
        let raw = args.is_empty() && !class_def.type_params.is_empty();
        if raw {
            if let Some(Type::Class(sc)) = &class_def.super_class {
                queue.push_back(Type::class(sc.def, vec![]));
            }
            for iface in &class_def.interfaces {
                if let Type::Class(ic) = iface {
                    queue.push_back(Type::class(ic.def, vec![]));
                }
            }
            if class_def.kind == ClassKind::Interface {
                queue.push_back(Type::class(env.well_known().object, vec![]));
            }
            continue;
        }

        let mut subst: HashMap<TypeVarId, Type> =
            HashMap::with_capacity(class_def.type_params.len());
        let object = Type::class(env.well_known().object, vec![]);
        for (idx, formal) in class_def.type_params.iter().copied().enumerate() {
            subst.insert(formal, args.get(idx).cloned().unwrap_or_else(|| object.clone()));
        }

        if let Some(sc) = &class_def.super_class {
            queue.push_back(substitute(sc, &subst));
        }
        for iface in &class_def.interfaces {
            queue.push_back(substitute(iface, &subst));
        }
        // Every interface implicitly has Object as a supertype (JLS 4.10.2).
        if class_def.kind == ClassKind::Interface {
            queue.push_back(Type::class(env.well_known().object, vec![]));
        }
    }

    None
}

/// Every class id `ty` can be viewed as, erased: the input's own class, its
/// superclasses, and all transitively implemented interfaces.
///
/// Used to find common supertype candidates when computing least upper
/// bounds. Types with no class view (primitives, null, wildcards) yield an
/// empty set.
pub fn class_closure(env: &dyn TypeEnv, ty: &Type) -> BTreeSet<ClassId> {
    let mut out = BTreeSet::new();
    let mut seen_type_vars = HashSet::new();
    collect(env, ty, &mut out, &mut seen_type_vars);
    out
}

fn collect(
    env: &dyn TypeEnv,
    ty: &Type,
    out: &mut BTreeSet<ClassId>,
    seen_type_vars: &mut HashSet<TypeVarId>,
) {
    match ty {
        Type::Class(ClassType { def, .. }) => {
            let mut queue = VecDeque::from([*def]);
            while let Some(id) = queue.pop_front() {
                if !out.insert(id) {
                    continue;
                }
                let Some(class_def) = env.class(id) else {
                    continue;
                };
                if let Some(Type::Class(sc)) = &class_def.super_class {
                    queue.push_back(sc.def);
                }
                for iface in &class_def.interfaces {
                    if let Type::Class(ic) = iface {
                        queue.push_back(ic.def);
                    }
                }
                if class_def.kind == ClassKind::Interface {
                    queue.push_back(env.well_known().object);
                }
            }
        }
        Type::Array(_) => {
            let wk = env.well_known();
            out.insert(wk.object);
            out.insert(wk.cloneable);
            out.insert(wk.serializable);
        }
        Type::Intersection(parts) => {
            for part in parts {
                collect(env, part, out, seen_type_vars);
            }
        }
        Type::TypeVar(id) => {
            if !seen_type_vars.insert(*id) {
                return;
            }
            if let Some(tp) = env.type_param(*id) {
                for bound in &tp.upper_bounds {
                    collect(env, bound, out, seen_type_vars);
                }
            }
            seen_type_vars.remove(id);
        }
        _ => {}
    }
}
