//! Core Java type model and structural type algebra for Tycho.
//!
//! The model is a closed sum type over interned ids: classes and type
//! parameters live in a [`TypeStore`] and are referenced by [`ClassId`] and
//! [`TypeVarId`]. Self-referential generic declarations (`T extends
//! Comparable<T>`) are cycles through ids rather than cyclic owned structure,
//! so recursive algorithms guard on ids instead of chasing pointers.
//!
//! The algebra here is deliberately side-effect free and best-effort: it
//! answers structural questions (subtyping, erasure, lub/glb, substitution)
//! over *proper* types and never allocates into the environment it is given.

pub mod format;
pub mod helpers;
pub mod lub;
pub mod subtyping;

pub use format::{format_type, format_type_with};
pub use helpers::{class_closure, instantiate_as_supertype};
pub use lub::{glb, glb_all, intersection_component_rank, lub, make_intersection, type_sort_key};
pub use subtyping::{
    box_primitive, contains_type_argument, erasure, is_loosely_assignable, is_subtype,
    unboxed_primitive,
};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Interned id of a class or interface declaration.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ClassId(u32);

impl ClassId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Interned id of a declared type parameter (or a context-local capture
/// variable, see [`TypeVarId::new_context_local`]).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TypeVarId(u32);

impl TypeVarId {
    const CONTEXT_LOCAL_BIT: u32 = 1 << 31;

    /// Allocate an id in the context-local namespace.
    ///
    /// Capture conversion and inference synthesize fresh type variables that
    /// must not collide with store-allocated ids; they live behind the high
    /// bit and resolve against the allocating context, not the global store.
    pub fn new_context_local(index: u32) -> Self {
        Self(Self::CONTEXT_LOCAL_BIT | index)
    }

    pub fn context_local_index(self) -> Option<usize> {
        if (self.0 & Self::CONTEXT_LOCAL_BIT) == 0 {
            return None;
        }
        Some((self.0 & !Self::CONTEXT_LOCAL_BIT) as usize)
    }

    pub fn index(self) -> usize {
        (self.0 & !Self::CONTEXT_LOCAL_BIT) as usize
    }
}

/// Id of an inference variable (a unification placeholder).
///
/// Identity is the id: two inference variables are the same variable iff
/// their ids are equal within one resolution session. Display names live in
/// the bound set that owns the variable.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct InferVarId(u32);

impl InferVarId {
    pub fn from_index(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Char => "char",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }
}

/// A class or interface instantiation. `args` is empty both for non-generic
/// classes and for raw uses of generic classes; [`ClassDef::type_params`]
/// disambiguates.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassType {
    pub def: ClassId,
    pub args: Vec<Type>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WildcardBound {
    Unbounded,
    Extends(Box<Type>),
    Super(Box<Type>),
}

/// A Java type expression.
///
/// `Wildcard` is only meaningful as a type argument; the algebra treats a
/// bare wildcard in any other position as an unsupported shape. `Infer` is a
/// unification placeholder owned by the inference engine: a type is *proper*
/// iff no `Infer` occurs anywhere within it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Primitive(PrimitiveType),
    Void,
    /// The null type: a subtype of every reference type.
    Null,
    Class(ClassType),
    Array(Box<Type>),
    /// Intersection of at least one member, deterministically ordered.
    Intersection(Vec<Type>),
    Wildcard(WildcardBound),
    TypeVar(TypeVarId),
    Infer(InferVarId),
}

impl Type {
    pub fn class(def: ClassId, args: Vec<Type>) -> Type {
        Type::Class(ClassType { def, args })
    }

    pub fn array(component: Type) -> Type {
        Type::Array(Box::new(component))
    }

    pub fn int() -> Type {
        Type::Primitive(PrimitiveType::Int)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    /// A type is proper iff no inference variable occurs within it.
    pub fn is_proper(&self) -> bool {
        match self {
            Type::Primitive(_) | Type::Void | Type::Null | Type::TypeVar(_) => true,
            Type::Infer(_) => false,
            Type::Class(ClassType { args, .. }) => args.iter().all(Type::is_proper),
            Type::Array(component) => component.is_proper(),
            Type::Intersection(parts) => parts.iter().all(Type::is_proper),
            Type::Wildcard(WildcardBound::Unbounded) => true,
            Type::Wildcard(WildcardBound::Extends(bound))
            | Type::Wildcard(WildcardBound::Super(bound)) => bound.is_proper(),
        }
    }

    /// Collect every inference variable mentioned within this type.
    pub fn collect_infer_vars(&self, out: &mut std::collections::BTreeSet<InferVarId>) {
        match self {
            Type::Infer(id) => {
                out.insert(*id);
            }
            Type::Class(ClassType { args, .. }) => {
                for arg in args {
                    arg.collect_infer_vars(out);
                }
            }
            Type::Array(component) => component.collect_infer_vars(out),
            Type::Intersection(parts) => {
                for part in parts {
                    part.collect_infer_vars(out);
                }
            }
            Type::Wildcard(WildcardBound::Extends(bound))
            | Type::Wildcard(WildcardBound::Super(bound)) => bound.collect_infer_vars(out),
            _ => {}
        }
    }

    pub fn mentions_infer(&self, id: InferVarId) -> bool {
        match self {
            Type::Infer(other) => *other == id,
            Type::Class(ClassType { args, .. }) => args.iter().any(|a| a.mentions_infer(id)),
            Type::Array(component) => component.mentions_infer(id),
            Type::Intersection(parts) => parts.iter().any(|p| p.mentions_infer(id)),
            Type::Wildcard(WildcardBound::Extends(bound))
            | Type::Wildcard(WildcardBound::Super(bound)) => bound.mentions_infer(id),
            _ => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassKind {
    Class,
    Interface,
}

/// A class or interface declaration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    pub kind: ClassKind,
    pub type_params: Vec<TypeVarId>,
    pub super_class: Option<Type>,
    pub interfaces: Vec<Type>,
}

/// A declared type parameter (or capture variable).
///
/// `lower_bound` is only ever populated for capture variables produced from
/// `? super` wildcards; declared parameters have upper bounds only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParamDef {
    pub name: String,
    pub upper_bounds: Vec<Type>,
    pub lower_bound: Option<Type>,
}

/// Ids of the classes every algorithm in this workspace may assume exist.
#[derive(Clone, Debug)]
pub struct WellKnownTypes {
    pub object: ClassId,
    pub string: ClassId,
    pub number: ClassId,
    pub cloneable: ClassId,
    pub serializable: ClassId,
    pub comparable: ClassId,
    pub iterable: ClassId,
    pub collection: ClassId,
    pub list: ClassId,
    pub array_list: ClassId,
    pub runnable: ClassId,
    pub boolean: ClassId,
    pub byte: ClassId,
    pub short: ClassId,
    pub character: ClassId,
    pub integer: ClassId,
    pub long: ClassId,
    pub float: ClassId,
    pub double: ClassId,
}

/// Read-only view of the type environment.
///
/// Object-safe so algorithm layers can stack context-local environments on
/// top of a shared store (capture variables, inference sessions) without
/// mutating it.
pub trait TypeEnv {
    fn class(&self, id: ClassId) -> Option<&ClassDef>;
    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef>;
    fn lookup_class(&self, name: &str) -> Option<ClassId>;
    fn well_known(&self) -> &WellKnownTypes;
}

/// The owning store behind a [`TypeEnv`].
///
/// Classes can be interned before they are defined so mutually- and
/// self-referential declarations can be built in any order.
#[derive(Clone, Debug)]
pub struct TypeStore {
    classes: Vec<Option<ClassDef>>,
    class_names: HashMap<String, ClassId>,
    type_params: Vec<TypeParamDef>,
    well_known: WellKnownTypes,
}

impl TypeStore {
    /// A store seeded with the handful of `java.lang`/`java.util` classes the
    /// algorithms and tests rely on.
    pub fn with_minimal_jdk() -> TypeStore {
        let mut store = TypeStore {
            classes: Vec::new(),
            class_names: HashMap::new(),
            type_params: Vec::new(),
            // Placeholder ids, patched below once the classes exist.
            well_known: WellKnownTypes {
                object: ClassId(0),
                string: ClassId(0),
                number: ClassId(0),
                cloneable: ClassId(0),
                serializable: ClassId(0),
                comparable: ClassId(0),
                iterable: ClassId(0),
                collection: ClassId(0),
                list: ClassId(0),
                array_list: ClassId(0),
                runnable: ClassId(0),
                boolean: ClassId(0),
                byte: ClassId(0),
                short: ClassId(0),
                character: ClassId(0),
                integer: ClassId(0),
                long: ClassId(0),
                float: ClassId(0),
                double: ClassId(0),
            },
        };

        let object = store.add_class(ClassDef {
            name: "java.lang.Object".to_string(),
            kind: ClassKind::Class,
            type_params: vec![],
            super_class: None,
            interfaces: vec![],
        });
        let object_ty = Type::class(object, vec![]);

        let iface = |name: &str| ClassDef {
            name: name.to_string(),
            kind: ClassKind::Interface,
            type_params: vec![],
            super_class: None,
            interfaces: vec![],
        };
        let cloneable = store.add_class(iface("java.lang.Cloneable"));
        let serializable = store.add_class(iface("java.io.Serializable"));
        let runnable = store.add_class(iface("java.lang.Runnable"));

        // interface Comparable<T>
        let comparable_t = store.add_type_param("T", vec![object_ty.clone()]);
        let comparable = store.add_class(ClassDef {
            name: "java.lang.Comparable".to_string(),
            kind: ClassKind::Interface,
            type_params: vec![comparable_t],
            super_class: None,
            interfaces: vec![],
        });

        let string = store.add_class(ClassDef {
            name: "java.lang.String".to_string(),
            kind: ClassKind::Class,
            type_params: vec![],
            super_class: Some(object_ty.clone()),
            interfaces: vec![Type::class(serializable, vec![])],
        });
        // String implements Comparable<String>; patch once its own id exists.
        if let Some(def) = store.class_mut(string) {
            def.interfaces
                .push(Type::class(comparable, vec![Type::class(string, vec![])]));
        }

        let number = store.add_class(ClassDef {
            name: "java.lang.Number".to_string(),
            kind: ClassKind::Class,
            type_params: vec![],
            super_class: Some(object_ty.clone()),
            interfaces: vec![Type::class(serializable, vec![])],
        });

        let wrapper = |store: &mut TypeStore, name: &str, super_class: Type| {
            let id = store.intern_class_id(name);
            store.define_class(
                id,
                ClassDef {
                    name: name.to_string(),
                    kind: ClassKind::Class,
                    type_params: vec![],
                    super_class: Some(super_class),
                    interfaces: vec![
                        Type::class(serializable, vec![]),
                        Type::class(comparable, vec![Type::class(id, vec![])]),
                    ],
                },
            );
            id
        };
        let number_ty = Type::class(number, vec![]);
        let byte = wrapper(&mut store, "java.lang.Byte", number_ty.clone());
        let short = wrapper(&mut store, "java.lang.Short", number_ty.clone());
        let integer = wrapper(&mut store, "java.lang.Integer", number_ty.clone());
        let long = wrapper(&mut store, "java.lang.Long", number_ty.clone());
        let float = wrapper(&mut store, "java.lang.Float", number_ty.clone());
        let double = wrapper(&mut store, "java.lang.Double", number_ty);
        let boolean = wrapper(&mut store, "java.lang.Boolean", object_ty.clone());
        let character = wrapper(&mut store, "java.lang.Character", object_ty.clone());

        // interface Iterable<T>
        let iterable_t = store.add_type_param("T", vec![object_ty.clone()]);
        let iterable = store.add_class(ClassDef {
            name: "java.lang.Iterable".to_string(),
            kind: ClassKind::Interface,
            type_params: vec![iterable_t],
            super_class: None,
            interfaces: vec![],
        });

        // interface Collection<E> extends Iterable<E>
        let collection_e = store.add_type_param("E", vec![object_ty.clone()]);
        let collection = store.add_class(ClassDef {
            name: "java.util.Collection".to_string(),
            kind: ClassKind::Interface,
            type_params: vec![collection_e],
            super_class: None,
            interfaces: vec![Type::class(iterable, vec![Type::TypeVar(collection_e)])],
        });

        // interface List<E> extends Collection<E>
        let list_e = store.add_type_param("E", vec![object_ty.clone()]);
        let list = store.add_class(ClassDef {
            name: "java.util.List".to_string(),
            kind: ClassKind::Interface,
            type_params: vec![list_e],
            super_class: None,
            interfaces: vec![Type::class(collection, vec![Type::TypeVar(list_e)])],
        });

        // class ArrayList<E> implements List<E>, Cloneable, Serializable
        let array_list_e = store.add_type_param("E", vec![object_ty.clone()]);
        let array_list = store.add_class(ClassDef {
            name: "java.util.ArrayList".to_string(),
            kind: ClassKind::Class,
            type_params: vec![array_list_e],
            super_class: Some(object_ty),
            interfaces: vec![
                Type::class(list, vec![Type::TypeVar(array_list_e)]),
                Type::class(cloneable, vec![]),
                Type::class(serializable, vec![]),
            ],
        });

        store.well_known = WellKnownTypes {
            object,
            string,
            number,
            cloneable,
            serializable,
            comparable,
            iterable,
            collection,
            list,
            array_list,
            runnable,
            boolean,
            byte,
            short,
            character,
            integer,
            long,
            float,
            double,
        };
        store
    }

    /// Intern a class id by name, defining nothing. Idempotent.
    pub fn intern_class_id(&mut self, name: &str) -> ClassId {
        if let Some(id) = self.class_names.get(name) {
            return *id;
        }
        let id = ClassId(self.classes.len() as u32);
        self.classes.push(None);
        self.class_names.insert(name.to_string(), id);
        id
    }

    /// Define (or redefine) the class behind an interned id.
    pub fn define_class(&mut self, id: ClassId, def: ClassDef) {
        self.class_names.insert(def.name.clone(), id);
        self.classes[id.index()] = Some(def);
    }

    pub fn add_class(&mut self, def: ClassDef) -> ClassId {
        let id = self.intern_class_id(&def.name);
        self.define_class(id, def);
        id
    }

    pub fn class_mut(&mut self, id: ClassId) -> Option<&mut ClassDef> {
        self.classes.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub fn add_type_param(&mut self, name: &str, upper_bounds: Vec<Type>) -> TypeVarId {
        let id = TypeVarId(self.type_params.len() as u32);
        self.type_params.push(TypeParamDef {
            name: name.to_string(),
            upper_bounds,
            lower_bound: None,
        });
        id
    }

    /// Redefine a type parameter, e.g. to close a self-referential bound
    /// (`E extends EnumLike<E>`) after the ids involved exist.
    pub fn define_type_param(&mut self, id: TypeVarId, def: TypeParamDef) {
        self.type_params[id.0 as usize] = def;
    }

    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.class_names.get(name).copied()
    }
}

impl Default for TypeStore {
    fn default() -> Self {
        TypeStore::with_minimal_jdk()
    }
}

impl TypeEnv for TypeStore {
    fn class(&self, id: ClassId) -> Option<&ClassDef> {
        self.classes.get(id.index()).and_then(Option::as_ref)
    }

    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef> {
        if id.context_local_index().is_some() {
            return None;
        }
        self.type_params.get(id.0 as usize)
    }

    fn lookup_class(&self, name: &str) -> Option<ClassId> {
        if let Some(id) = self.class_names.get(name) {
            return Some(*id);
        }
        // Implicit `java.lang.*` lookup for unqualified names.
        if !name.contains('.') {
            return self.class_names.get(&format!("java.lang.{name}")).copied();
        }
        None
    }

    fn well_known(&self) -> &WellKnownTypes {
        &self.well_known
    }
}

/// Replace every occurrence of the mapped type variables within `ty`.
pub fn substitute(ty: &Type, subst: &HashMap<TypeVarId, Type>) -> Type {
    match ty {
        Type::TypeVar(id) => subst.get(id).cloned().unwrap_or_else(|| ty.clone()),
        Type::Class(ClassType { def, args }) => Type::class(
            *def,
            args.iter().map(|arg| substitute(arg, subst)).collect(),
        ),
        Type::Array(component) => Type::array(substitute(component, subst)),
        Type::Intersection(parts) => {
            Type::Intersection(parts.iter().map(|p| substitute(p, subst)).collect())
        }
        Type::Wildcard(WildcardBound::Extends(bound)) => {
            Type::Wildcard(WildcardBound::Extends(Box::new(substitute(bound, subst))))
        }
        Type::Wildcard(WildcardBound::Super(bound)) => {
            Type::Wildcard(WildcardBound::Super(Box::new(substitute(bound, subst))))
        }
        _ => ty.clone(),
    }
}

/// Replace every occurrence of the mapped inference variables within `ty`.
pub fn substitute_infer(ty: &Type, subst: &HashMap<InferVarId, Type>) -> Type {
    match ty {
        Type::Infer(id) => subst.get(id).cloned().unwrap_or_else(|| ty.clone()),
        Type::Class(ClassType { def, args }) => Type::class(
            *def,
            args.iter().map(|arg| substitute_infer(arg, subst)).collect(),
        ),
        Type::Array(component) => Type::array(substitute_infer(component, subst)),
        Type::Intersection(parts) => {
            Type::Intersection(parts.iter().map(|p| substitute_infer(p, subst)).collect())
        }
        Type::Wildcard(WildcardBound::Extends(bound)) => Type::Wildcard(WildcardBound::Extends(
            Box::new(substitute_infer(bound, subst)),
        )),
        Type::Wildcard(WildcardBound::Super(bound)) => Type::Wildcard(WildcardBound::Super(
            Box::new(substitute_infer(bound, subst)),
        )),
        _ => ty.clone(),
    }
}
