//! The fact store: per-variable bound ledgers, incorporation, and capture
//! bookkeeping.
//!
//! Bounds are only ever added, never retracted. Every addition derives the
//! implied constraint formulas of JLS 18.3 onto the caller's worklist, so a
//! single `add_*` call can cascade into an arbitrary amount of further
//! reduction before the triggering [`crate::ConstraintFormula`] returns.
//! Once a contradiction is recorded the set is terminally invalid.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, trace};
use tycho_types::{
    class_closure, format_type_with, instantiate_as_supertype, substitute, substitute_infer,
    ClassType, InferVarId, Type, TypeEnv, WildcardBound,
};

use crate::{
    capture::{CaptureConversion, CaptureEntry},
    constraint::{drain, ConstraintKind, Worklist},
    ctx::InferCtx,
    error::InferenceError,
};

/// The bound ledger of a single inference variable.
#[derive(Clone, Debug, Default)]
pub struct VariableBounds {
    name: Option<String>,
    equalities: Vec<Type>,
    upper_bounds: Vec<Type>,
    lower_bounds: Vec<Type>,
    /// Index into [`BoundSet::captures`] while an unresolved capture
    /// conversion mentions this variable.
    capture: Option<usize>,
}

impl VariableBounds {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn equalities(&self) -> &[Type] {
        &self.equalities
    }

    pub fn upper_bounds(&self) -> &[Type] {
        &self.upper_bounds
    }

    pub fn lower_bounds(&self) -> &[Type] {
        &self.lower_bounds
    }

    /// The unique proper equality bound, if one has been derived.
    ///
    /// Wildcard equalities (which arise from capture bookkeeping) never count
    /// as an instantiation.
    pub fn instantiation(&self) -> Option<&Type> {
        self.equalities
            .iter()
            .find(|t| t.is_proper() && !matches!(t, Type::Wildcard(_)))
    }
}

/// The accumulated facts of one inference session.
#[derive(Clone, Debug, Default)]
pub struct BoundSet {
    ledgers: BTreeMap<InferVarId, VariableBounds>,
    // Slots go `None` once every captured variable is instantiated, keeping
    // the ledger indices stable.
    captures: Vec<Option<CaptureConversion>>,
    failure: Option<String>,
}

impl BoundSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate and register a fresh inference variable.
    pub fn new_inference_variable(&mut self, name: Option<&str>) -> InferVarId {
        let next = self
            .ledgers
            .keys()
            .next_back()
            .map(|id| id.index() as u32 + 1)
            .unwrap_or(0);
        let id = InferVarId::from_index(next);
        self.ledgers.insert(
            id,
            VariableBounds {
                name: name.map(str::to_string),
                ..VariableBounds::default()
            },
        );
        id
    }

    /// Register `id` with an empty ledger if absent. Idempotent.
    pub fn add_inference_variable(&mut self, id: InferVarId) {
        self.ledgers.entry(id).or_default();
    }

    pub fn contains(&self, id: InferVarId) -> bool {
        self.ledgers.contains_key(&id)
    }

    pub fn variables(&self) -> impl Iterator<Item = InferVarId> + '_ {
        self.ledgers.keys().copied()
    }

    pub fn bounds(&self, id: InferVarId) -> Option<&VariableBounds> {
        self.ledgers.get(&id)
    }

    pub fn upper_bounds(&self, id: InferVarId) -> &[Type] {
        self.ledgers.get(&id).map_or(&[], |l| l.upper_bounds())
    }

    pub fn lower_bounds(&self, id: InferVarId) -> &[Type] {
        self.ledgers.get(&id).map_or(&[], |l| l.lower_bounds())
    }

    pub fn equalities(&self, id: InferVarId) -> &[Type] {
        self.ledgers.get(&id).map_or(&[], |l| l.equalities())
    }

    pub fn instantiation(&self, id: InferVarId) -> Option<&Type> {
        self.ledgers.get(&id).and_then(|l| l.instantiation())
    }

    pub fn captures(&self) -> impl Iterator<Item = &CaptureConversion> {
        self.captures.iter().filter_map(Option::as_ref)
    }

    pub fn capture_for(&self, id: InferVarId) -> Option<&CaptureConversion> {
        let idx = self.ledgers.get(&id)?.capture?;
        self.captures.get(idx)?.as_ref()
    }

    pub(crate) fn capture_entry(&self, id: InferVarId) -> Option<&CaptureEntry> {
        self.capture_for(id)?.entry_for(id)
    }

    pub fn is_contradicted(&self) -> bool {
        self.failure.is_some()
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub(crate) fn mark_contradiction(&mut self, message: &str) {
        if self.failure.is_none() {
            debug!(message, "bound set contradicted");
            self.failure = Some(message.to_string());
        }
    }

    pub(crate) fn check_live(&self) -> Result<(), InferenceError> {
        match &self.failure {
            Some(message) => Err(InferenceError::Contradiction(message.clone())),
            None => Ok(()),
        }
    }

    /// An independent duplicate: mutating the copy never affects `self`.
    pub fn copy(&self) -> BoundSet {
        self.clone()
    }

    /// Render a type with this set's variable display names.
    pub fn render(&self, env: &dyn TypeEnv, ty: &Type) -> String {
        format_type_with(env, ty, &|id| {
            self.ledgers.get(&id).and_then(|l| l.name.clone())
        })
    }

    /// Structurally rewrite every bound, renaming inference variables per
    /// `map`. Produces an independent bound set; variables absent from the
    /// map keep their ids. Used to make unrelated sessions composable before
    /// merging with [`BoundSet::incorporate_from`].
    pub fn with_inference_variable_substitution(
        &self,
        map: &BTreeMap<InferVarId, InferVarId>,
    ) -> BoundSet {
        let type_map: HashMap<InferVarId, Type> = map
            .iter()
            .map(|(old, new)| (*old, Type::Infer(*new)))
            .collect();
        let rewrite = |ty: &Type| substitute_infer(ty, &type_map);

        let ledgers = self
            .ledgers
            .iter()
            .map(|(id, ledger)| {
                let new_id = map.get(id).copied().unwrap_or(*id);
                let new_ledger = VariableBounds {
                    name: ledger.name.clone(),
                    equalities: ledger.equalities.iter().map(rewrite).collect(),
                    upper_bounds: ledger.upper_bounds.iter().map(rewrite).collect(),
                    lower_bounds: ledger.lower_bounds.iter().map(rewrite).collect(),
                    capture: ledger.capture,
                };
                (new_id, new_ledger)
            })
            .collect();

        let captures = self
            .captures
            .iter()
            .map(|slot| {
                slot.as_ref().map(|c| {
                    let entries = c
                        .entries()
                        .iter()
                        .map(|e| CaptureEntry {
                            param: e.param,
                            var: map.get(&e.var).copied().unwrap_or(e.var),
                            argument: rewrite(&e.argument),
                        })
                        .collect();
                    CaptureConversion::new(c.raw(), entries)
                })
            })
            .collect();

        BoundSet {
            ledgers,
            captures,
            failure: self.failure.clone(),
        }
    }

    /// Pull in every bound from `other` related (directly or through shared
    /// mentions or capture records) to `relevant`, re-incorporating each one
    /// here. Variables already registered in `self` keep their identity;
    /// rename `other` first when the sessions are unrelated.
    pub fn incorporate_from(
        &mut self,
        ctx: &InferCtx<'_>,
        other: &BoundSet,
        relevant: &[InferVarId],
    ) -> Result<(), InferenceError> {
        let mut related: BTreeSet<InferVarId> = relevant
            .iter()
            .copied()
            .filter(|id| other.contains(*id))
            .collect();
        loop {
            let before = related.len();
            for id in related.clone() {
                let Some(ledger) = other.bounds(id) else {
                    continue;
                };
                for ty in ledger
                    .equalities
                    .iter()
                    .chain(&ledger.upper_bounds)
                    .chain(&ledger.lower_bounds)
                {
                    ty.collect_infer_vars(&mut related);
                }
            }
            for capture in other.captures() {
                if capture.vars().any(|v| related.contains(&v)) {
                    related.extend(capture.vars());
                }
            }
            if related.len() == before {
                break;
            }
        }

        for id in &related {
            if !self.contains(*id) {
                let name = other.bounds(*id).and_then(|l| l.name.clone());
                self.ledgers.insert(
                    *id,
                    VariableBounds {
                        name,
                        ..VariableBounds::default()
                    },
                );
            }
        }

        let mut work = Worklist::default();
        for capture in other.captures() {
            let vars: Vec<_> = capture.vars().collect();
            if vars.iter().any(|v| related.contains(v))
                && vars.iter().all(|v| self.capture_entry(*v).is_none())
            {
                self.add_capture_conversion(ctx, capture.clone(), &mut work)?;
            }
        }
        for id in &related {
            let Some(ledger) = other.bounds(*id) else {
                continue;
            };
            for e in ledger.equalities() {
                work.push(ConstraintKind::Equality, Type::Infer(*id), e.clone());
            }
            for u in ledger.upper_bounds() {
                work.push(ConstraintKind::Subtype, Type::Infer(*id), u.clone());
            }
            for l in ledger.lower_bounds() {
                work.push(ConstraintKind::Subtype, l.clone(), Type::Infer(*id));
            }
        }
        drain(ctx, self, &mut work)
    }

    fn require_closure(&self, ty: &Type) -> Result<(), InferenceError> {
        let mut vars = BTreeSet::new();
        ty.collect_infer_vars(&mut vars);
        for v in vars {
            if !self.ledgers.contains_key(&v) {
                return Err(InferenceError::InvariantViolation(format!(
                    "bound mentions unregistered inference variable \u{3b1}{}",
                    v.index()
                )));
            }
        }
        Ok(())
    }

    fn ledger_mut(
        &mut self,
        id: InferVarId,
    ) -> Result<&mut VariableBounds, InferenceError> {
        self.ledgers.get_mut(&id).ok_or_else(|| {
            InferenceError::InvariantViolation(format!(
                "inference variable \u{3b1}{} is not registered in this bound set",
                id.index()
            ))
        })
    }

    fn is_instantiation(ty: &Type) -> bool {
        ty.is_proper() && !matches!(ty, Type::Wildcard(_))
    }

    /// Record `α = ty` and derive the implied formulas.
    pub(crate) fn add_equality(
        &mut self,
        ctx: &InferCtx<'_>,
        id: InferVarId,
        ty: Type,
        work: &mut Worklist,
    ) -> Result<(), InferenceError> {
        self.require_closure(&ty)?;
        if ty == Type::Infer(id) {
            return Ok(());
        }
        if self.ledger_mut(id)?.equalities.contains(&ty) {
            return Ok(());
        }

        // Wildcard-captured variables reject proper equalities outright, and
        // equating one with its own original argument is always wrong
        // (JLS 18.3.2). Capture resolution drops the record before it
        // instantiates these variables.
        if let Some(entry) = self.capture_entry(id) {
            if matches!(entry.argument, Type::Wildcard(_))
                && (ty == entry.argument || Self::is_instantiation(&ty))
            {
                return Err(InferenceError::Contradiction(format!(
                    "captured variable {} cannot be instantiated to {} while its capture is unresolved",
                    self.render(ctx, &Type::Infer(id)),
                    self.render(ctx, &ty)
                )));
            }
        }

        if Self::is_instantiation(&ty) {
            if let Some(existing) = self.instantiation(id) {
                if *existing != ty {
                    return Err(InferenceError::Contradiction(format!(
                        "{} cannot be instantiated to both {} and {}",
                        self.render(ctx, &Type::Infer(id)),
                        self.render(ctx, existing),
                        self.render(ctx, &ty)
                    )));
                }
            }
        }

        trace!(
            var = %self.render(ctx, &Type::Infer(id)),
            ty = %self.render(ctx, &ty),
            "add equality bound"
        );
        let ledger = self.ledger_mut(id)?;
        let prior_eq = ledger.equalities.clone();
        let prior_up = ledger.upper_bounds.clone();
        let prior_lo = ledger.lower_bounds.clone();
        ledger.equalities.push(ty.clone());

        // α = S ∧ α = T ⇒ S = T
        for s in prior_eq {
            work.push(ConstraintKind::Equality, s, ty.clone());
        }
        // α = S ∧ α <: T ⇒ S <: T
        for u in prior_up {
            work.push(ConstraintKind::Subtype, ty.clone(), u);
        }
        // α = S ∧ T <: α ⇒ T <: S
        for l in prior_lo {
            work.push(ConstraintKind::Subtype, l, ty.clone());
        }
        // Mirror a variable-variable equality so the other ledger fires too.
        if let Type::Infer(other) = &ty {
            work.push(
                ConstraintKind::Equality,
                Type::Infer(*other),
                Type::Infer(id),
            );
        }

        // A proper instantiation substitutes into every other bound that
        // mentions α (the substitution forms of JLS 18.3.1).
        if Self::is_instantiation(&ty) {
            let mut subst = HashMap::new();
            subst.insert(id, ty.clone());
            let mut implied = Vec::new();
            for (&other_id, other) in &self.ledgers {
                if other_id == id {
                    continue;
                }
                for e in &other.equalities {
                    if e.mentions_infer(id) {
                        implied.push((
                            ConstraintKind::Equality,
                            Type::Infer(other_id),
                            substitute_infer(e, &subst),
                        ));
                    }
                }
                for u in &other.upper_bounds {
                    if u.mentions_infer(id) {
                        implied.push((
                            ConstraintKind::Subtype,
                            Type::Infer(other_id),
                            substitute_infer(u, &subst),
                        ));
                    }
                }
                for l in &other.lower_bounds {
                    if l.mentions_infer(id) {
                        implied.push((
                            ConstraintKind::Subtype,
                            substitute_infer(l, &subst),
                            Type::Infer(other_id),
                        ));
                    }
                }
            }
            for (kind, from, to) in implied {
                work.push(kind, from, to);
            }
        }
        Ok(())
    }

    /// Record `α <: ty` and derive the implied formulas.
    pub(crate) fn add_upper_bound(
        &mut self,
        ctx: &InferCtx<'_>,
        id: InferVarId,
        ty: Type,
        work: &mut Worklist,
    ) -> Result<(), InferenceError> {
        self.require_closure(&ty)?;
        if ty == Type::Infer(id) {
            return Ok(());
        }
        if self.ledger_mut(id)?.upper_bounds.contains(&ty) {
            return Ok(());
        }

        trace!(
            var = %self.render(ctx, &Type::Infer(id)),
            ty = %self.render(ctx, &ty),
            "add upper bound"
        );
        let ledger = self.ledger_mut(id)?;
        let prior_eq = ledger.equalities.clone();
        let prior_up = ledger.upper_bounds.clone();
        let prior_lo = ledger.lower_bounds.clone();
        ledger.upper_bounds.push(ty.clone());

        // α = S ∧ α <: T ⇒ S <: T
        for e in prior_eq {
            work.push(ConstraintKind::Subtype, e, ty.clone());
        }
        // L <: α ∧ α <: T ⇒ L <: T
        for l in prior_lo {
            work.push(ConstraintKind::Subtype, l, ty.clone());
        }
        // An upper bound on α that is itself a variable is a lower bound on
        // that variable.
        if let Type::Infer(other) = &ty {
            self.add_lower_bound(ctx, *other, Type::Infer(id), work)?;
        }

        // Two upper bounds sharing a generic supertype force their
        // corresponding (non-wildcard) type arguments equal.
        self.upper_parameterization_equalities(ctx, &prior_up, &ty, work);

        // Wildcard rule table for bounds against captured variables
        // (JLS 18.3.2): an upper bound flows to the declared bound `Bθ`.
        if let Some(entry) = self.capture_entry(id).cloned() {
            let declared = self.declared_capture_bounds(ctx, &entry, id);
            match &entry.argument {
                Type::Wildcard(WildcardBound::Unbounded)
                | Type::Wildcard(WildcardBound::Super(_)) => {
                    for b in declared {
                        work.push(ConstraintKind::Subtype, b, ty.clone());
                    }
                }
                Type::Wildcard(WildcardBound::Extends(wildcard_upper)) => {
                    let object = Type::class(ctx.well_known().object, vec![]);
                    if declared.iter().all(|b| *b == object) {
                        work.push(
                            ConstraintKind::Subtype,
                            (**wildcard_upper).clone(),
                            ty.clone(),
                        );
                    } else if **wildcard_upper == object {
                        for b in declared {
                            work.push(ConstraintKind::Subtype, b, ty.clone());
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Record `ty <: α` and derive the implied formulas.
    pub(crate) fn add_lower_bound(
        &mut self,
        ctx: &InferCtx<'_>,
        id: InferVarId,
        ty: Type,
        work: &mut Worklist,
    ) -> Result<(), InferenceError> {
        self.require_closure(&ty)?;
        if ty == Type::Infer(id) {
            return Ok(());
        }
        if self.ledger_mut(id)?.lower_bounds.contains(&ty) {
            return Ok(());
        }

        trace!(
            var = %self.render(ctx, &Type::Infer(id)),
            ty = %self.render(ctx, &ty),
            "add lower bound"
        );
        let ledger = self.ledger_mut(id)?;
        let prior_eq = ledger.equalities.clone();
        let prior_up = ledger.upper_bounds.clone();
        ledger.lower_bounds.push(ty.clone());

        // α = S ∧ T <: α ⇒ T <: S
        for e in prior_eq {
            work.push(ConstraintKind::Subtype, ty.clone(), e);
        }
        // T <: α ∧ α <: U ⇒ T <: U
        for u in prior_up {
            work.push(ConstraintKind::Subtype, ty.clone(), u);
        }
        if let Type::Infer(other) = &ty {
            self.add_upper_bound(ctx, *other, Type::Infer(id), work)?;
        }

        // Wildcard rule table (JLS 18.3.2): `?`- and `? extends`-captured
        // variables admit no proper lower bound; `? super T` forwards the
        // bound to the wildcard's lower bound.
        if let Some(entry) = self.capture_entry(id).cloned() {
            match &entry.argument {
                Type::Wildcard(WildcardBound::Unbounded)
                | Type::Wildcard(WildcardBound::Extends(_)) => {
                    if ty.is_proper() {
                        return Err(InferenceError::Contradiction(format!(
                            "captured variable {} cannot have lower bound {}",
                            self.render(ctx, &Type::Infer(id)),
                            self.render(ctx, &ty)
                        )));
                    }
                }
                Type::Wildcard(WildcardBound::Super(wildcard_lower)) => {
                    work.push(
                        ConstraintKind::Subtype,
                        ty.clone(),
                        (**wildcard_lower).clone(),
                    );
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn declared_capture_bounds(
        &self,
        ctx: &InferCtx<'_>,
        entry: &CaptureEntry,
        id: InferVarId,
    ) -> Vec<Type> {
        let Some(capture) = self.capture_for(id) else {
            return Vec::new();
        };
        let theta = capture.substitution();
        ctx.type_param(entry.param)
            .map(|d| {
                d.upper_bounds
                    .iter()
                    .map(|b| substitute(b, &theta))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn upper_parameterization_equalities(
        &self,
        ctx: &InferCtx<'_>,
        existing: &[Type],
        new_upper: &Type,
        work: &mut Worklist,
    ) {
        let new_closure = class_closure(ctx, new_upper);
        for upper in existing {
            let common: Vec<_> = class_closure(ctx, upper)
                .intersection(&new_closure)
                .copied()
                .collect();
            for raw in common {
                let generic = ctx
                    .class(raw)
                    .is_some_and(|def| !def.type_params.is_empty());
                if !generic {
                    continue;
                }
                let Some(Type::Class(ClassType { args: a_args, .. })) =
                    instantiate_as_supertype(ctx, upper, raw)
                else {
                    continue;
                };
                let Some(Type::Class(ClassType { args: b_args, .. })) =
                    instantiate_as_supertype(ctx, new_upper, raw)
                else {
                    continue;
                };
                if a_args.is_empty() || a_args.len() != b_args.len() {
                    continue;
                }
                for (a, b) in a_args.iter().zip(&b_args) {
                    if !matches!(a, Type::Wildcard(_)) && !matches!(b, Type::Wildcard(_)) {
                        work.push(ConstraintKind::Equality, a.clone(), b.clone());
                    }
                }
            }
        }
    }

    /// Register a capture conversion and seed the captured variables' bounds
    /// from the declared parameter bounds and the original arguments.
    pub(crate) fn add_capture_conversion(
        &mut self,
        ctx: &InferCtx<'_>,
        capture: CaptureConversion,
        work: &mut Worklist,
    ) -> Result<(), InferenceError> {
        for entry in capture.entries() {
            if !self.contains(entry.var) {
                return Err(InferenceError::InvariantViolation(format!(
                    "capture conversion mentions unregistered inference variable \u{3b1}{}",
                    entry.var.index()
                )));
            }
            if self.ledgers[&entry.var].capture.is_some() {
                return Err(InferenceError::InvariantViolation(format!(
                    "inference variable \u{3b1}{} is already captured",
                    entry.var.index()
                )));
            }
            self.require_closure(&entry.argument)?;
        }

        let index = self.captures.len();
        let theta = capture.substitution();
        for entry in capture.entries() {
            if let Some(ledger) = self.ledgers.get_mut(&entry.var) {
                ledger.capture = Some(index);
            }
            let declared: Vec<Type> = ctx
                .type_param(entry.param)
                .map(|d| {
                    d.upper_bounds
                        .iter()
                        .map(|b| substitute(b, &theta))
                        .collect()
                })
                .unwrap_or_default();
            let var = Type::Infer(entry.var);
            match &entry.argument {
                Type::Wildcard(WildcardBound::Unbounded) => {
                    for b in declared {
                        work.push(ConstraintKind::Subtype, var.clone(), b);
                    }
                }
                Type::Wildcard(WildcardBound::Extends(upper)) => {
                    for b in declared {
                        work.push(ConstraintKind::Subtype, var.clone(), b);
                    }
                    work.push(ConstraintKind::Subtype, var.clone(), (**upper).clone());
                }
                Type::Wildcard(WildcardBound::Super(lower)) => {
                    for b in declared {
                        work.push(ConstraintKind::Subtype, var.clone(), b);
                    }
                    work.push(ConstraintKind::Subtype, (**lower).clone(), var.clone());
                }
                concrete => {
                    work.push(ConstraintKind::Equality, var.clone(), concrete.clone());
                }
            }
        }
        self.captures.push(Some(capture));
        Ok(())
    }

    /// Capture the arguments of `G<...>`: one fresh inference variable per
    /// declared parameter, tied together by a [`CaptureConversion`]. Returns
    /// `G<α1, ..., αn>`.
    pub(crate) fn capture_type_arguments_into(
        &mut self,
        ctx: &InferCtx<'_>,
        class_type: &ClassType,
        work: &mut Worklist,
    ) -> Result<Type, InferenceError> {
        let Some(def) = ctx.class(class_type.def) else {
            return Err(InferenceError::UnsupportedShape {
                context: "capture conversion",
                rendered: self.render(ctx, &Type::Class(class_type.clone())),
            });
        };
        if def.type_params.len() != class_type.args.len() {
            return Err(InferenceError::UnsupportedShape {
                context: "capture conversion",
                rendered: self.render(ctx, &Type::Class(class_type.clone())),
            });
        }
        let params: Vec<_> = def.type_params.clone();
        let entries: Vec<CaptureEntry> = params
            .iter()
            .zip(&class_type.args)
            .map(|(param, arg)| {
                let name = ctx.type_param(*param).map(|d| d.name.clone());
                let var = self.new_inference_variable(name.as_deref());
                CaptureEntry {
                    param: *param,
                    var,
                    argument: arg.clone(),
                }
            })
            .collect();
        let capture = CaptureConversion::new(class_type.def, entries);
        let captured = capture.captured_type();
        self.add_capture_conversion(ctx, capture, work)?;
        Ok(captured)
    }

    /// Drop capture records whose variables all have proper instantiations.
    pub(crate) fn prune_resolved_captures(&mut self) {
        let resolved: Vec<usize> = self
            .captures
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| {
                let capture = slot.as_ref()?;
                capture
                    .vars()
                    .all(|v| self.instantiation(v).is_some())
                    .then_some(i)
            })
            .collect();
        for i in resolved {
            if let Some(capture) = self.captures[i].take() {
                for var in capture.vars() {
                    if let Some(ledger) = self.ledgers.get_mut(&var) {
                        ledger.capture = None;
                    }
                }
            }
        }
    }

    /// Drop every capture record mentioning one of `vars` (capture
    /// resolution replaces them with fresh capture type variables).
    pub(crate) fn remove_captures_involving(&mut self, vars: &BTreeSet<InferVarId>) {
        for slot in &mut self.captures {
            let involved = slot
                .as_ref()
                .is_some_and(|c| c.vars().any(|v| vars.contains(&v)));
            if involved {
                if let Some(capture) = slot.take() {
                    for var in capture.vars() {
                        if let Some(ledger) = self.ledgers.get_mut(&var) {
                            ledger.capture = None;
                        }
                    }
                }
            }
        }
    }
}
