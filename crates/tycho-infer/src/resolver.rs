//! The resolver: owns one inference session (a bound set plus its typing
//! context) and computes instantiations.
//!
//! Resolution (JLS 18.4-style) repeatedly picks a minimal independent set of
//! uninstantiated variables, instantiates each from its proper bounds
//! (lub of lower bounds, else glb of upper bounds, else Object), and falls
//! back to synthesizing fresh capture type variables when a capture
//! conversion ties the set together or the plain candidates contradict.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;
use tycho_types::{
    glb_all, is_subtype, lub, substitute, substitute_infer, InferVarId, Type, TypeEnv, TypeVarId,
};

use crate::{
    bounds::BoundSet,
    constraint::{drain, ConstraintFormula, ConstraintKind, Worklist},
    ctx::InferCtx,
    error::InferenceError,
};

/// One self-contained inference session.
///
/// Cloning produces an independent session over the same base environment;
/// speculative work (trying an overload candidate) runs against a
/// [`Resolver::copy`] and is discarded on contradiction without affecting
/// the original.
#[derive(Clone, Debug)]
pub struct Resolver<'env> {
    ctx: InferCtx<'env>,
    bounds: BoundSet,
    /// Declared parameters this session has already allocated variables
    /// for. Nested declarations resolved in the same session reuse them, so
    /// a method's bounds can mention its class's parameters.
    param_vars: HashMap<TypeVarId, InferVarId>,
}

impl<'env> Resolver<'env> {
    pub fn new(env: &'env dyn TypeEnv) -> Self {
        Self {
            ctx: InferCtx::new(env),
            bounds: BoundSet::new(),
            param_vars: HashMap::new(),
        }
    }

    /// An independent duplicate for speculative resolution.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    pub fn bound_set(&self) -> &BoundSet {
        &self.bounds
    }

    /// The session's environment view, including capture variables this
    /// session has synthesized.
    pub fn ctx(&self) -> &InferCtx<'env> {
        &self.ctx
    }

    pub fn new_inference_variable(&mut self, name: Option<&str>) -> InferVarId {
        self.bounds.new_inference_variable(name)
    }

    /// The variable this session already allocated for a declared
    /// parameter, if any.
    pub fn inference_variable_for(&self, param: TypeVarId) -> Option<InferVarId> {
        self.param_vars.get(&param).copied()
    }

    /// One inference variable per declared type parameter, with the declared
    /// bounds installed as upper bounds. Parameters seen before (an
    /// enclosing declaration resolved in this session) keep their existing
    /// variables; every known parameter is substituted by its variable, so
    /// mutually-referential declarations (`T extends Comparable<T>`) and
    /// bounds mentioning enclosing parameters carry over intact.
    pub fn inference_variables_over(
        &mut self,
        params: &[TypeVarId],
    ) -> Result<Vec<InferVarId>, InferenceError> {
        let vars: Vec<InferVarId> = params
            .iter()
            .map(|p| match self.param_vars.get(p) {
                Some(existing) => *existing,
                None => {
                    let name = self.ctx.type_param(*p).map(|d| d.name.clone());
                    let var = self.bounds.new_inference_variable(name.as_deref());
                    self.param_vars.insert(*p, var);
                    var
                }
            })
            .collect();
        let subst: HashMap<TypeVarId, Type> = self
            .param_vars
            .iter()
            .map(|(p, v)| (*p, Type::Infer(*v)))
            .collect();

        let mut work = Worklist::default();
        for (p, v) in params.iter().zip(&vars) {
            let declared: Vec<Type> = self
                .ctx
                .type_param(*p)
                .map(|d| d.upper_bounds.clone())
                .unwrap_or_default();
            for bound in declared {
                work.push(
                    ConstraintKind::Subtype,
                    Type::Infer(*v),
                    substitute(&bound, &subst),
                );
            }
        }
        drain(&self.ctx, &mut self.bounds, &mut work)?;
        Ok(vars)
    }

    /// Issue a constraint formula against this session's bound set.
    pub fn reduce(
        &mut self,
        kind: ConstraintKind,
        from: Type,
        to: Type,
    ) -> Result<(), InferenceError> {
        ConstraintFormula::new(kind, from, to).reduce_in_place(&self.ctx, &mut self.bounds)
    }

    pub fn add_equality(&mut self, a: Type, b: Type) -> Result<(), InferenceError> {
        self.reduce(ConstraintKind::Equality, a, b)
    }

    /// Constrain `ty <: bound`.
    pub fn add_upper_bound(&mut self, ty: Type, bound: Type) -> Result<(), InferenceError> {
        self.reduce(ConstraintKind::Subtype, ty, bound)
    }

    /// Constrain `bound <: ty`.
    pub fn add_lower_bound(&mut self, ty: Type, bound: Type) -> Result<(), InferenceError> {
        self.reduce(ConstraintKind::Subtype, bound, ty)
    }

    pub fn add_loose_compatibility(&mut self, from: Type, to: Type) -> Result<(), InferenceError> {
        self.reduce(ConstraintKind::LooseCompatibility, from, to)
    }

    /// Capture the type arguments of a parameterized type: one fresh
    /// inference variable per declared parameter, tied by a capture
    /// conversion record. Returns `G<α1, ..., αn>`.
    pub fn capture_type_arguments(&mut self, ty: &Type) -> Result<Type, InferenceError> {
        let Type::Class(ct) = ty else {
            return Err(InferenceError::UnsupportedShape {
                context: "capture conversion",
                rendered: self.bounds.render(&self.ctx, ty),
            });
        };
        let mut work = Worklist::default();
        let captured = self
            .bounds
            .capture_type_arguments_into(&self.ctx, ct, &mut work)?;
        drain(&self.ctx, &mut self.bounds, &mut work)?;
        Ok(captured)
    }

    /// Resolve every registered variable.
    pub fn infer_all(&mut self) -> Result<BTreeMap<InferVarId, Type>, InferenceError> {
        let all: Vec<InferVarId> = self.bounds.variables().collect();
        self.infer(&all)
    }

    /// Compute an instantiation for each requested variable (and everything
    /// they depend on), or fail with the bound set's contradiction.
    pub fn infer(
        &mut self,
        vars: &[InferVarId],
    ) -> Result<BTreeMap<InferVarId, Type>, InferenceError> {
        self.bounds.check_live()?;
        for v in vars {
            if !self.bounds.contains(*v) {
                return Err(InferenceError::InvariantViolation(format!(
                    "cannot infer unregistered inference variable \u{3b1}{}",
                    v.index()
                )));
            }
        }

        loop {
            let closure = self.dependency_closure(vars);
            let remaining: BTreeSet<InferVarId> = closure
                .into_iter()
                .filter(|v| self.bounds.instantiation(*v).is_none())
                .collect();
            if remaining.is_empty() {
                break;
            }
            let subset = self.minimal_independent_subset(&remaining);
            debug!(
                subset = ?subset.iter().map(|v| v.index()).collect::<Vec<_>>(),
                "resolving independent set"
            );
            self.resolve_subset(&subset)?;
        }

        let mut out = BTreeMap::new();
        for v in vars {
            let instantiation = self.bounds.instantiation(*v).cloned().ok_or_else(|| {
                InferenceError::InvariantViolation(format!(
                    "resolution finished without instantiating \u{3b1}{}",
                    v.index()
                ))
            })?;
            out.insert(*v, instantiation);
        }
        Ok(out)
    }

    /// Variables the requested ones depend on, transitively: everything
    /// mentioned in their bounds plus co-members of their capture records.
    fn dependency_closure(&self, vars: &[InferVarId]) -> BTreeSet<InferVarId> {
        let mut out: BTreeSet<InferVarId> = vars
            .iter()
            .copied()
            .filter(|v| self.bounds.contains(*v))
            .collect();
        loop {
            let mut grown = out.clone();
            for v in &out {
                if self.bounds.instantiation(*v).is_none() {
                    grown.extend(self.direct_dependencies(*v));
                }
            }
            if grown.len() == out.len() {
                return out;
            }
            out = grown;
        }
    }

    fn direct_dependencies(&self, v: InferVarId) -> BTreeSet<InferVarId> {
        let mut deps = BTreeSet::new();
        if let Some(ledger) = self.bounds.bounds(v) {
            for ty in ledger
                .equalities()
                .iter()
                .chain(ledger.upper_bounds())
                .chain(ledger.lower_bounds())
            {
                ty.collect_infer_vars(&mut deps);
            }
        }
        if let Some(capture) = self.bounds.capture_for(v) {
            deps.extend(capture.vars());
        }
        deps.remove(&v);
        deps
    }

    /// Smallest non-empty subset of `remaining` whose members' remaining
    /// dependencies all lie within the subset.
    fn minimal_independent_subset(&self, remaining: &BTreeSet<InferVarId>) -> BTreeSet<InferVarId> {
        let mut best: Option<BTreeSet<InferVarId>> = None;
        for &start in remaining {
            let mut set = BTreeSet::from([start]);
            let mut stack = vec![start];
            while let Some(v) = stack.pop() {
                for dep in self.direct_dependencies(v) {
                    if remaining.contains(&dep) && set.insert(dep) {
                        stack.push(dep);
                    }
                }
            }
            if best.as_ref().map_or(true, |b| set.len() < b.len()) {
                best = Some(set);
            }
        }
        best.unwrap_or_default()
    }

    fn resolve_subset(&mut self, subset: &BTreeSet<InferVarId>) -> Result<(), InferenceError> {
        let tied = subset.iter().any(|v| self.bounds.capture_for(*v).is_some());
        if !tied {
            match self.try_plain_instantiation(subset) {
                Ok(trial) => {
                    self.bounds = trial;
                    return Ok(());
                }
                Err(err) => {
                    debug!(%err, "plain instantiation failed, attempting capture resolution");
                }
            }
        }
        self.capture_resolution(subset)
    }

    /// Instantiate each subset member from its proper bounds on a trial
    /// copy: lub of proper lower bounds, else glb of proper upper bounds,
    /// else Object.
    fn try_plain_instantiation(
        &self,
        subset: &BTreeSet<InferVarId>,
    ) -> Result<BoundSet, InferenceError> {
        let mut trial = self.bounds.copy();
        let mut work = Worklist::default();
        for &v in subset {
            let lowers: Vec<Type> = trial
                .lower_bounds(v)
                .iter()
                .filter(|t| t.is_proper())
                .cloned()
                .collect();
            let candidate = if !lowers.is_empty() {
                lub(&self.ctx, &lowers)
            } else {
                let uppers: Vec<Type> = trial
                    .upper_bounds(v)
                    .iter()
                    .filter(|t| t.is_proper())
                    .cloned()
                    .collect();
                if uppers.is_empty() {
                    Type::class(self.ctx.well_known().object, vec![])
                } else {
                    glb_all(&self.ctx, &uppers)
                }
            };
            debug!(
                var = %trial.render(&self.ctx, &Type::Infer(v)),
                candidate = %trial.render(&self.ctx, &candidate),
                "instantiation candidate"
            );
            work.push(ConstraintKind::Equality, Type::Infer(v), candidate);
            // Drain per variable so later members see the substituted
            // (now proper) bounds this instantiation implies.
            drain(&self.ctx, &mut trial, &mut work)?;
        }
        Ok(trial)
    }

    /// Break a capture deadlock (or contradictory plain candidates) by
    /// synthesizing one fresh capture type variable per subset member,
    /// dropping the now-resolved capture records, and instantiating each
    /// member to its capture.
    fn capture_resolution(&mut self, subset: &BTreeSet<InferVarId>) -> Result<(), InferenceError> {
        let mut trial = self.bounds.copy();
        trial.remove_captures_involving(subset);

        // Pre-compute the fresh ids so θ can rewrite mutually-referential
        // bounds before the capture variables exist.
        let members: Vec<InferVarId> = subset.iter().copied().collect();
        let base = self.ctx.capture_count() as u32;
        let theta: HashMap<InferVarId, Type> = members
            .iter()
            .enumerate()
            .map(|(k, v)| (*v, Type::TypeVar(TypeVarId::new_context_local(base + k as u32))))
            .collect();

        // Allocate every capture variable before checking inhabitability:
        // a member's bounds may mention a later member's fresh variable.
        for &v in &members {
            let mut uppers: Vec<Type> = Vec::new();
            for u in trial.upper_bounds(v) {
                let u = substitute_infer(u, &theta);
                if u.is_proper() && !uppers.contains(&u) {
                    uppers.push(u);
                }
            }
            if uppers.is_empty() {
                uppers.push(Type::class(self.ctx.well_known().object, vec![]));
            }
            let lowers: Vec<Type> = trial
                .lower_bounds(v)
                .iter()
                .map(|l| substitute_infer(l, &theta))
                .filter(|l| l.is_proper())
                .collect();
            let lower = if lowers.is_empty() {
                None
            } else {
                Some(lub(&self.ctx, &lowers))
            };
            let cap = self.ctx.add_capture_type_param(uppers, lower);
            debug!(
                var = %trial.render(&self.ctx, &Type::Infer(v)),
                capture = %trial.render(&self.ctx, &Type::TypeVar(cap)),
                "capture resolution"
            );
            debug_assert_eq!(theta.get(&v), Some(&Type::TypeVar(cap)));
        }

        // Each fresh variable must be inhabitable.
        for capture in theta.values() {
            let Type::TypeVar(cap) = capture else {
                continue;
            };
            let Some(def) = self.ctx.type_param(*cap).cloned() else {
                continue;
            };
            if let Some(lower) = &def.lower_bound {
                for upper in &def.upper_bounds {
                    if !is_subtype(&self.ctx, lower, upper) {
                        let message = format!(
                            "no type within bounds: {} is not a subtype of {}",
                            trial.render(&self.ctx, lower),
                            trial.render(&self.ctx, upper)
                        );
                        self.bounds.mark_contradiction(&message);
                        return Err(InferenceError::Contradiction(message));
                    }
                }
            }
        }

        let mut work = Worklist::default();
        for &v in &members {
            let capture = theta
                .get(&v)
                .cloned()
                .unwrap_or_else(|| Type::class(self.ctx.well_known().object, vec![]));
            work.push(ConstraintKind::Equality, Type::Infer(v), capture);
        }
        match drain(&self.ctx, &mut trial, &mut work) {
            Ok(()) => {
                self.bounds = trial;
                Ok(())
            }
            Err(err) => {
                if let InferenceError::Contradiction(msg) = &err {
                    self.bounds.mark_contradiction(msg);
                }
                Err(err)
            }
        }
    }
}
