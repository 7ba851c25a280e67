//! Constraint-based type inference for Java generics.
//!
//! The engine mirrors the JLS 18 bound/constraint machinery: callers
//! allocate inference variables inside a [`Resolver`]-owned [`BoundSet`],
//! issue [`ConstraintFormula`] reductions against it, and finally ask the
//! resolver for instantiations. Reduction rewrites formulas into primitive
//! bounds; every bound addition synchronously derives the implied formulas
//! (incorporation) until a fixpoint — or a contradiction — is reached.
//!
//! The structural type algebra (subtyping, erasure, lub/glb) lives in
//! `tycho-types`; this crate only adds the unification layer on top of it.
//! A session never mutates the shared [`tycho_types::TypeStore`]: capture
//! variables are allocated context-locally and bound sets are plain values,
//! so speculative work (overload candidates) runs on cheap copies.

pub mod bounds;
pub mod capture;
pub mod constraint;
pub mod ctx;
pub mod error;
pub mod resolver;

pub use bounds::{BoundSet, VariableBounds};
pub use capture::{CaptureConversion, CaptureEntry};
pub use constraint::{ConstraintFormula, ConstraintKind};
pub use ctx::InferCtx;
pub use error::InferenceError;
pub use resolver::Resolver;
