//! Stable, Java-like rendering of type expressions.
//!
//! Intended for diagnostics and tests: simple class names, `?`-wildcards,
//! `&`-joined intersections. Not meant to be re-parseable.

use crate::{ClassType, InferVarId, Type, TypeEnv, WildcardBound};

/// Render `ty` with default inference-variable names (`α0`, `α1`, ...).
pub fn format_type(env: &dyn TypeEnv, ty: &Type) -> String {
    format_type_with(env, ty, &|_| None)
}

/// Render `ty`, asking `infer_name` for the display name of each inference
/// variable (falling back to `αn`).
pub fn format_type_with(
    env: &dyn TypeEnv,
    ty: &Type,
    infer_name: &dyn Fn(InferVarId) -> Option<String>,
) -> String {
    match ty {
        Type::Primitive(p) => p.name().to_string(),
        Type::Void => "void".to_string(),
        Type::Null => "null".to_string(),
        Type::Class(ClassType { def, args }) => {
            let name = env
                .class(*def)
                .map(|d| simple_name(&d.name).to_string())
                .unwrap_or_else(|| format!("class#{}", def.index()));
            if args.is_empty() {
                name
            } else {
                let args: Vec<String> = args
                    .iter()
                    .map(|a| format_type_with(env, a, infer_name))
                    .collect();
                format!("{}<{}>", name, args.join(", "))
            }
        }
        Type::Array(component) => {
            format!("{}[]", format_type_with(env, component, infer_name))
        }
        Type::Intersection(parts) => {
            let parts: Vec<String> = parts
                .iter()
                .map(|p| format_type_with(env, p, infer_name))
                .collect();
            parts.join(" & ")
        }
        Type::Wildcard(WildcardBound::Unbounded) => "?".to_string(),
        Type::Wildcard(WildcardBound::Extends(bound)) => {
            format!("? extends {}", format_type_with(env, bound, infer_name))
        }
        Type::Wildcard(WildcardBound::Super(bound)) => {
            format!("? super {}", format_type_with(env, bound, infer_name))
        }
        Type::TypeVar(id) => match env.type_param(*id) {
            Some(def) => def.name.clone(),
            None => match id.context_local_index() {
                Some(idx) => format!("CAP#{idx}"),
                None => format!("T#{}", id.index()),
            },
        },
        Type::Infer(id) => {
            infer_name(*id).unwrap_or_else(|| format!("\u{3b1}{}", id.index()))
        }
    }
}

fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}
