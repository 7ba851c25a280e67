//! Capture-conversion records.
//!
//! Capturing a parameterized type's arguments (JLS 5.1.10, adapted to
//! inference) allocates one fresh inference variable per declared type
//! parameter and records the association here. The record ties the captured
//! variables together for dependency analysis, feeds the wildcard rule table
//! during incorporation, and is dropped once every captured variable has a
//! proper instantiation.

use std::collections::HashMap;

use tycho_types::{ClassId, InferVarId, Type, TypeVarId};

/// One captured type argument: the declared parameter, the inference
/// variable standing in for it, and the original argument (a wildcard or a
/// concrete type).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureEntry {
    pub param: TypeVarId,
    pub var: InferVarId,
    pub argument: Type,
}

/// A single parameterized-type capture event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureConversion {
    raw: ClassId,
    entries: Vec<CaptureEntry>,
}

impl CaptureConversion {
    pub fn new(raw: ClassId, entries: Vec<CaptureEntry>) -> Self {
        Self { raw, entries }
    }

    pub fn raw(&self) -> ClassId {
        self.raw
    }

    pub fn entries(&self) -> &[CaptureEntry] {
        &self.entries
    }

    pub fn entry_for(&self, var: InferVarId) -> Option<&CaptureEntry> {
        self.entries.iter().find(|e| e.var == var)
    }

    pub fn vars(&self) -> impl Iterator<Item = InferVarId> + '_ {
        self.entries.iter().map(|e| e.var)
    }

    /// The substitution θ mapping each declared parameter to its captured
    /// variable, used to rewrite declared bounds (`Bθ`).
    pub fn substitution(&self) -> HashMap<TypeVarId, Type> {
        self.entries
            .iter()
            .map(|e| (e.param, Type::Infer(e.var)))
            .collect()
    }

    /// The capture result itself: `G<α1, ..., αn>`.
    pub fn captured_type(&self) -> Type {
        Type::class(
            self.raw,
            self.entries.iter().map(|e| Type::Infer(e.var)).collect(),
        )
    }
}
