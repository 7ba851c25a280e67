//! Constraint formulas and the reduction engine.
//!
//! A formula is an in-flight compatibility assertion between two type
//! expressions. Reduction rewrites it into primitive bounds on inference
//! variables and/or further formulas, following the JLS 18.2 rule tables.
//! Bound additions synchronously derive implied formulas (incorporation,
//! see [`crate::bounds`]); the shared worklist keeps that mutual recursion
//! iterative and deduplicates regenerated formulas, so the fixpoint always
//! terminates.

use std::collections::{HashSet, VecDeque};

use tracing::trace;
use tycho_types::{
    box_primitive, erasure, instantiate_as_supertype, is_loosely_assignable, is_subtype,
    ClassType, Type, TypeEnv, WildcardBound,
};

use crate::{bounds::BoundSet, ctx::InferCtx, error::InferenceError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    Equality,
    Subtype,
    /// Type-argument containment, `from <= to`.
    Containment,
    /// Loose invocation compatibility (subtyping plus boxing and the
    /// unchecked-raw allowance).
    LooseCompatibility,
}

/// A pending compatibility assertion. Ephemeral: formulas are reduced, never
/// stored in a bound set.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConstraintFormula {
    pub kind: ConstraintKind,
    pub from: Type,
    pub to: Type,
}

impl ConstraintFormula {
    pub fn new(kind: ConstraintKind, from: Type, to: Type) -> Self {
        Self { kind, from, to }
    }

    /// Reduce against a copy of `bounds`, leaving the original untouched.
    ///
    /// A contradiction is reported to the caller and discards only the
    /// derived copy; this is the entry point for speculative work.
    pub fn reduce(
        &self,
        ctx: &InferCtx<'_>,
        bounds: &BoundSet,
    ) -> Result<BoundSet, InferenceError> {
        let mut derived = bounds.copy();
        self.reduce_in_place(ctx, &mut derived)?;
        Ok(derived)
    }

    /// Reduce directly into `bounds`, running incorporation to fixpoint.
    pub fn reduce_in_place(
        &self,
        ctx: &InferCtx<'_>,
        bounds: &mut BoundSet,
    ) -> Result<(), InferenceError> {
        let mut work = Worklist::default();
        work.push(self.kind, self.from.clone(), self.to.clone());
        drain(ctx, bounds, &mut work)
    }
}

/// Pending formulas plus the set of everything already reduced this pass.
///
/// The visited set is the recursion guard: incorporation can re-derive a
/// formula that produced it (`α <: β` and `β <: α` regenerate each other),
/// and deduplication is what makes the fixpoint finite.
#[derive(Debug, Default)]
pub(crate) struct Worklist {
    queue: VecDeque<ConstraintFormula>,
    seen: HashSet<ConstraintFormula>,
}

impl Worklist {
    pub(crate) fn push(&mut self, kind: ConstraintKind, from: Type, to: Type) {
        let formula = ConstraintFormula::new(kind, from, to);
        if self.seen.insert(formula.clone()) {
            self.queue.push_back(formula);
        }
    }

    fn pop(&mut self) -> Option<ConstraintFormula> {
        self.queue.pop_front()
    }
}

/// Run every queued formula (and everything they derive) to fixpoint.
pub(crate) fn drain(
    ctx: &InferCtx<'_>,
    bounds: &mut BoundSet,
    work: &mut Worklist,
) -> Result<(), InferenceError> {
    bounds.check_live()?;
    while let Some(formula) = work.pop() {
        if let Err(err) = reduce_step(ctx, &formula, bounds, work) {
            if let InferenceError::Contradiction(msg) = &err {
                bounds.mark_contradiction(msg);
            }
            return Err(err);
        }
    }
    bounds.prune_resolved_captures();
    Ok(())
}

fn reduce_step(
    ctx: &InferCtx<'_>,
    formula: &ConstraintFormula,
    bounds: &mut BoundSet,
    work: &mut Worklist,
) -> Result<(), InferenceError> {
    trace!(
        kind = ?formula.kind,
        from = %bounds.render(ctx, &formula.from),
        to = %bounds.render(ctx, &formula.to),
        "reduce"
    );
    match formula.kind {
        ConstraintKind::Equality => reduce_equality(ctx, bounds, work, &formula.from, &formula.to),
        ConstraintKind::Subtype => reduce_subtype(ctx, bounds, work, &formula.from, &formula.to),
        ConstraintKind::Containment => {
            reduce_containment(ctx, bounds, work, &formula.from, &formula.to)
        }
        ConstraintKind::LooseCompatibility => {
            reduce_loose(ctx, bounds, work, &formula.from, &formula.to)
        }
    }
}

fn contradiction(
    ctx: &InferCtx<'_>,
    bounds: &BoundSet,
    from: &Type,
    relation: &str,
    to: &Type,
) -> InferenceError {
    InferenceError::Contradiction(format!(
        "{} {} {}",
        bounds.render(ctx, from),
        relation,
        bounds.render(ctx, to)
    ))
}

fn reduce_equality(
    ctx: &InferCtx<'_>,
    bounds: &mut BoundSet,
    work: &mut Worklist,
    from: &Type,
    to: &Type,
) -> Result<(), InferenceError> {
    if from == to {
        return Ok(());
    }
    if from.is_proper() && to.is_proper() {
        // Structural equality was the fast path above.
        return Err(contradiction(ctx, bounds, from, "cannot equal", to));
    }
    if let Type::Infer(id) = from {
        return bounds.add_equality(ctx, *id, to.clone(), work);
    }
    if let Type::Infer(id) = to {
        return bounds.add_equality(ctx, *id, from.clone(), work);
    }

    match (from, to) {
        (Type::Wildcard(a), Type::Wildcard(b)) => match (a, b) {
            (WildcardBound::Unbounded, WildcardBound::Unbounded) => Ok(()),
            (WildcardBound::Extends(s), WildcardBound::Extends(t))
            | (WildcardBound::Super(s), WildcardBound::Super(t)) => {
                work.push(ConstraintKind::Equality, (**s).clone(), (**t).clone());
                Ok(())
            }
            _ => Err(contradiction(ctx, bounds, from, "cannot equal", to)),
        },
        (Type::Class(a), Type::Class(b)) if a.def == b.def && a.args.len() == b.args.len() => {
            for (s, t) in a.args.iter().zip(&b.args) {
                work.push(ConstraintKind::Equality, s.clone(), t.clone());
            }
            Ok(())
        }
        (Type::Array(a), Type::Array(b)) => {
            work.push(ConstraintKind::Equality, (**a).clone(), (**b).clone());
            Ok(())
        }
        _ => Err(contradiction(ctx, bounds, from, "cannot equal", to)),
    }
}

fn reduce_subtype(
    ctx: &InferCtx<'_>,
    bounds: &mut BoundSet,
    work: &mut Worklist,
    from: &Type,
    to: &Type,
) -> Result<(), InferenceError> {
    if from == to {
        return Ok(());
    }
    if from.is_proper() && to.is_proper() {
        return if is_subtype(ctx, from, to) {
            Ok(())
        } else {
            Err(contradiction(ctx, bounds, from, "is not a subtype of", to))
        };
    }
    // The null type is below every reference type and nothing is below it.
    if matches!(from, Type::Null) {
        return Ok(());
    }
    if matches!(to, Type::Null) {
        return Err(contradiction(ctx, bounds, from, "is not a subtype of", to));
    }
    if let Type::Infer(id) = from {
        return bounds.add_upper_bound(ctx, *id, to.clone(), work);
    }
    if let Type::Infer(id) = to {
        return bounds.add_lower_bound(ctx, *id, from.clone(), work);
    }
    if matches!(from, Type::Wildcard(_)) {
        return Err(InferenceError::UnsupportedShape {
            context: "subtype constraint",
            rendered: bounds.render(ctx, from),
        });
    }

    match to {
        Type::Class(target) if !target.args.is_empty() => {
            let Some(Type::Class(ClassType { args: from_args, .. })) =
                instantiate_as_supertype(ctx, from, target.def)
            else {
                return Err(contradiction(ctx, bounds, from, "is not a subtype of", to));
            };
            if from_args.len() != target.args.len() {
                // Raw source against a parameterized target has no
                // checked conversion.
                return Err(contradiction(ctx, bounds, from, "is not a subtype of", to));
            }
            for (s_arg, t_arg) in from_args.iter().zip(&target.args) {
                work.push(ConstraintKind::Containment, s_arg.clone(), t_arg.clone());
            }
            Ok(())
        }
        Type::Class(target) => {
            if instantiate_as_supertype(ctx, from, target.def).is_some() {
                Ok(())
            } else {
                Err(contradiction(ctx, bounds, from, "is not a subtype of", to))
            }
        }
        Type::Array(target_component) => match from {
            Type::Array(from_component) => {
                if from_component.is_primitive() || target_component.is_primitive() {
                    if from_component == target_component {
                        Ok(())
                    } else {
                        Err(contradiction(ctx, bounds, from, "is not a subtype of", to))
                    }
                } else {
                    work.push(
                        ConstraintKind::Subtype,
                        (**from_component).clone(),
                        (**target_component).clone(),
                    );
                    Ok(())
                }
            }
            _ => Err(contradiction(ctx, bounds, from, "is not a subtype of", to)),
        },
        Type::TypeVar(id) => {
            // An intersection listing the variable is trivially below it.
            if let Type::Intersection(parts) = from {
                if parts.contains(to) {
                    return Ok(());
                }
            }
            match ctx.type_param(*id).and_then(|d| d.lower_bound.clone()) {
                Some(lower) => {
                    work.push(ConstraintKind::Subtype, from.clone(), lower);
                    Ok(())
                }
                None => Err(contradiction(ctx, bounds, from, "is not a subtype of", to)),
            }
        }
        Type::Intersection(parts) => {
            for part in parts {
                work.push(ConstraintKind::Subtype, from.clone(), part.clone());
            }
            Ok(())
        }
        Type::Wildcard(_) => Err(InferenceError::UnsupportedShape {
            context: "subtype constraint",
            rendered: bounds.render(ctx, to),
        }),
        _ => Err(contradiction(ctx, bounds, from, "is not a subtype of", to)),
    }
}

fn reduce_containment(
    ctx: &InferCtx<'_>,
    bounds: &mut BoundSet,
    work: &mut Worklist,
    from: &Type,
    to: &Type,
) -> Result<(), InferenceError> {
    let object = || Type::class(ctx.well_known().object, vec![]);
    match to {
        // The unbounded wildcard contains every argument.
        Type::Wildcard(WildcardBound::Unbounded) => Ok(()),
        Type::Wildcard(WildcardBound::Extends(t_bound)) => {
            let t_bound = (**t_bound).clone();
            match from {
                Type::Wildcard(WildcardBound::Unbounded) => {
                    work.push(ConstraintKind::Subtype, object(), t_bound);
                    Ok(())
                }
                Type::Wildcard(WildcardBound::Extends(s_bound)) => {
                    work.push(ConstraintKind::Subtype, (**s_bound).clone(), t_bound);
                    Ok(())
                }
                Type::Wildcard(WildcardBound::Super(_)) => {
                    work.push(ConstraintKind::Equality, object(), t_bound);
                    Ok(())
                }
                _ => {
                    work.push(ConstraintKind::Subtype, from.clone(), t_bound);
                    Ok(())
                }
            }
        }
        Type::Wildcard(WildcardBound::Super(t_bound)) => {
            let t_bound = (**t_bound).clone();
            match from {
                Type::Wildcard(WildcardBound::Super(s_bound)) => {
                    work.push(ConstraintKind::Subtype, t_bound, (**s_bound).clone());
                    Ok(())
                }
                Type::Wildcard(_) => {
                    Err(contradiction(ctx, bounds, from, "is not contained by", to))
                }
                _ => {
                    work.push(ConstraintKind::Subtype, t_bound, from.clone());
                    Ok(())
                }
            }
        }
        // A concrete argument contains only an equal concrete argument.
        _ => match from {
            Type::Wildcard(_) => Err(contradiction(ctx, bounds, from, "is not contained by", to)),
            _ => {
                work.push(ConstraintKind::Equality, from.clone(), to.clone());
                Ok(())
            }
        },
    }
}

fn reduce_loose(
    ctx: &InferCtx<'_>,
    bounds: &mut BoundSet,
    work: &mut Worklist,
    from: &Type,
    to: &Type,
) -> Result<(), InferenceError> {
    // Capture an improper parameterized source with wildcard arguments
    // first, so those arguments participate as inference variables.
    let from = match from {
        Type::Class(ct)
            if !from.is_proper() && ct.args.iter().any(|a| matches!(a, Type::Wildcard(_))) =>
        {
            bounds.capture_type_arguments_into(ctx, ct, work)?
        }
        _ => from.clone(),
    };

    if from.is_proper() && to.is_proper() {
        return if is_loosely_assignable(ctx, &from, to) {
            Ok(())
        } else {
            Err(contradiction(ctx, bounds, &from, "is not compatible with", to))
        };
    }
    if let Type::Primitive(p) = &from {
        work.push(
            ConstraintKind::LooseCompatibility,
            box_primitive(ctx, *p),
            to.clone(),
        );
        return Ok(());
    }
    if let Type::Primitive(p) = to {
        work.push(ConstraintKind::Equality, from, box_primitive(ctx, *p));
        return Ok(());
    }
    if unchecked_compatible_only(ctx, &from, to) {
        return Ok(());
    }
    work.push(ConstraintKind::Subtype, from, to.clone());
    Ok(())
}

/// Raw-erasure-only compatibility: assigning to a raw use of a generic class
/// is allowed (with an unchecked warning in a real compiler) whenever the
/// erasures are related.
fn unchecked_compatible_only(env: &dyn TypeEnv, from: &Type, to: &Type) -> bool {
    let Type::Class(ct) = to else {
        return false;
    };
    if !ct.args.is_empty() {
        return false;
    }
    let Some(def) = env.class(ct.def) else {
        return false;
    };
    if def.type_params.is_empty() {
        return false;
    }
    is_subtype(env, &erasure(env, from), to)
}
