//! Per-session typing context.
//!
//! Inference sessions synthesize fresh capture variables (during capture
//! resolution, §18.4-style) without mutating the shared [`TypeStore`]. The
//! context allocates them locally and layers them over the base environment,
//! so a session can be cloned for speculative work and discarded wholesale.
//!
//! [`TypeStore`]: tycho_types::TypeStore

use std::fmt;

use tycho_types::{ClassDef, ClassId, Type, TypeEnv, TypeParamDef, TypeVarId, WellKnownTypes};

/// A [`TypeEnv`] layering context-local type parameters (capture variables)
/// over a base environment.
#[derive(Clone)]
pub struct InferCtx<'env> {
    base: &'env dyn TypeEnv,
    locals: Vec<TypeParamDef>,
}

impl fmt::Debug for InferCtx<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferCtx")
            .field("locals", &self.locals)
            .finish_non_exhaustive()
    }
}

impl<'env> InferCtx<'env> {
    pub fn new(base: &'env dyn TypeEnv) -> Self {
        Self {
            base,
            locals: Vec::new(),
        }
    }

    /// Number of capture variables allocated so far; the next allocation
    /// gets `TypeVarId::new_context_local(capture_count())`.
    pub(crate) fn capture_count(&self) -> usize {
        self.locals.len()
    }

    /// Allocate a fresh capture variable (`CAP#n`) local to this context.
    pub fn add_capture_type_param(
        &mut self,
        upper_bounds: Vec<Type>,
        lower_bound: Option<Type>,
    ) -> TypeVarId {
        let idx: u32 = self
            .locals
            .len()
            .try_into()
            .expect("too many context-local type params");
        let id = TypeVarId::new_context_local(idx);
        self.locals.push(TypeParamDef {
            name: format!("CAP#{}", idx),
            upper_bounds,
            lower_bound,
        });
        id
    }
}

impl TypeEnv for InferCtx<'_> {
    fn class(&self, id: ClassId) -> Option<&ClassDef> {
        self.base.class(id)
    }

    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef> {
        if let Some(idx) = id.context_local_index() {
            return self.locals.get(idx);
        }
        self.base.type_param(id)
    }

    fn lookup_class(&self, name: &str) -> Option<ClassId> {
        self.base.lookup_class(name)
    }

    fn well_known(&self) -> &WellKnownTypes {
        self.base.well_known()
    }
}
