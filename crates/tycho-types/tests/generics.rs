use tycho_types::{
    contains_type_argument, is_subtype, ClassDef, ClassKind, Type, TypeEnv, TypeParamDef,
    TypeStore, WildcardBound,
};

#[test]
fn inheritance_type_arg_substitution() {
    let env = TypeStore::with_minimal_jdk();

    let array_list = env.class_id("java.util.ArrayList").unwrap();
    let list = env.class_id("java.util.List").unwrap();
    let string = env.well_known().string;
    let object = env.well_known().object;

    let array_list_string = Type::class(array_list, vec![Type::class(string, vec![])]);
    let list_string = Type::class(list, vec![Type::class(string, vec![])]);
    let list_object = Type::class(list, vec![Type::class(object, vec![])]);

    assert!(is_subtype(&env, &array_list_string, &list_string));
    assert!(!is_subtype(&env, &array_list_string, &list_object));
}

#[test]
fn generic_subtyping_remains_invariant_without_wildcards() {
    let env = TypeStore::with_minimal_jdk();
    let list = env.class_id("java.util.List").unwrap();
    let string = env.well_known().string;
    let object = env.well_known().object;

    let list_string = Type::class(list, vec![Type::class(string, vec![])]);
    let list_object = Type::class(list, vec![Type::class(object, vec![])]);

    assert!(!is_subtype(&env, &list_string, &list_object));
}

#[test]
fn wildcard_type_argument_containment_extends() {
    let env = TypeStore::with_minimal_jdk();
    let list = env.class_id("java.util.List").unwrap();
    let string = env.well_known().string;
    let object = env.well_known().object;

    let list_extends_string = Type::class(
        list,
        vec![Type::Wildcard(WildcardBound::Extends(Box::new(
            Type::class(string, vec![]),
        )))],
    );
    let list_extends_object = Type::class(
        list,
        vec![Type::Wildcard(WildcardBound::Extends(Box::new(
            Type::class(object, vec![]),
        )))],
    );

    assert!(is_subtype(&env, &list_extends_string, &list_extends_object));
    assert!(!is_subtype(&env, &list_extends_object, &list_extends_string));
}

#[test]
fn wildcard_type_argument_containment_super() {
    let env = TypeStore::with_minimal_jdk();
    let list = env.class_id("java.util.List").unwrap();
    let string = env.well_known().string;
    let object = env.well_known().object;

    let list_super_object = Type::class(
        list,
        vec![Type::Wildcard(WildcardBound::Super(Box::new(Type::class(
            object,
            vec![],
        ))))],
    );
    let list_super_string = Type::class(
        list,
        vec![Type::Wildcard(WildcardBound::Super(Box::new(Type::class(
            string,
            vec![],
        ))))],
    );

    assert!(is_subtype(&env, &list_super_object, &list_super_string));
    assert!(!is_subtype(&env, &list_super_string, &list_super_object));
}

#[test]
fn unbounded_wildcard_contains_every_argument() {
    let env = TypeStore::with_minimal_jdk();
    let string = Type::class(env.well_known().string, vec![]);
    let unbounded = Type::Wildcard(WildcardBound::Unbounded);

    assert!(contains_type_argument(&env, &unbounded, &string));
    assert!(contains_type_argument(
        &env,
        &unbounded,
        &Type::Wildcard(WildcardBound::Super(Box::new(string)))
    ));
}

#[test]
fn type_variable_reaches_supertypes_through_bounds() {
    let mut env = TypeStore::with_minimal_jdk();
    let number = Type::class(env.well_known().number, vec![]);
    let t = env.add_type_param("T", vec![number.clone()]);

    let object = Type::class(env.well_known().object, vec![]);
    assert!(is_subtype(&env, &Type::TypeVar(t), &number));
    assert!(is_subtype(&env, &Type::TypeVar(t), &object));
    assert!(!is_subtype(&env, &number, &Type::TypeVar(t)));
}

#[test]
fn self_referential_bounds_do_not_loop() {
    let mut env = TypeStore::with_minimal_jdk();
    let object = Type::class(env.well_known().object, vec![]);
    let comparable = env.well_known().comparable;

    // Model `class EnumLike<E extends EnumLike<E>>`.
    let enum_like = env.intern_class_id("com.example.EnumLike");
    let e = env.add_type_param("E", vec![object.clone()]);
    env.define_type_param(
        e,
        TypeParamDef {
            name: "E".to_string(),
            upper_bounds: vec![Type::class(enum_like, vec![Type::TypeVar(e)])],
            lower_bound: None,
        },
    );
    env.define_class(
        enum_like,
        ClassDef {
            name: "com.example.EnumLike".to_string(),
            kind: ClassKind::Class,
            type_params: vec![e],
            super_class: Some(object.clone()),
            interfaces: vec![Type::class(comparable, vec![Type::TypeVar(e)])],
        },
    );

    let e_ty = Type::TypeVar(e);
    assert!(is_subtype(
        &env,
        &e_ty,
        &Type::class(enum_like, vec![e_ty.clone()])
    ));
    assert!(is_subtype(&env, &e_ty, &object));

    // The cycle guard answers (rather than overflowing) even for queries
    // that walk the bound repeatedly.
    assert!(is_subtype(
        &env,
        &e_ty,
        &Type::class(comparable, vec![e_ty.clone()])
    ));
}

#[test]
fn raw_types_erase_supertype_parameterization() {
    let env = TypeStore::with_minimal_jdk();
    let array_list = env.class_id("java.util.ArrayList").unwrap();
    let list = env.class_id("java.util.List").unwrap();
    let string = env.well_known().string;

    let raw_array_list = Type::class(array_list, vec![]);
    let raw_list = Type::class(list, vec![]);
    let list_string = Type::class(list, vec![Type::class(string, vec![])]);

    assert!(is_subtype(&env, &raw_array_list, &raw_list));
    // Raw to parameterized needs an unchecked conversion, not subtyping.
    assert!(!is_subtype(&env, &raw_array_list, &list_string));
    // Parameterized to raw erases fine.
    assert!(is_subtype(&env, &list_string, &raw_list));
}
