use tycho_types::{is_subtype, Type, TypeEnv, TypeStore};

#[test]
fn minimal_jdk_interfaces_are_subtypes_of_object() {
    let env = TypeStore::with_minimal_jdk();

    let object = Type::class(env.well_known().object, vec![]);

    let list = env
        .class_id("java.util.List")
        .expect("List must exist in minimal JDK");
    let string = env.well_known().string;
    let list_string = Type::class(list, vec![Type::class(string, vec![])]);
    assert!(is_subtype(&env, &list_string, &object));

    let cloneable = Type::class(env.well_known().cloneable, vec![]);
    assert!(is_subtype(&env, &cloneable, &object));
}

#[test]
fn wrappers_sit_below_number() {
    let env = TypeStore::with_minimal_jdk();
    let number = Type::class(env.well_known().number, vec![]);

    for id in [
        env.well_known().byte,
        env.well_known().short,
        env.well_known().integer,
        env.well_known().long,
        env.well_known().float,
        env.well_known().double,
    ] {
        assert!(is_subtype(&env, &Type::class(id, vec![]), &number));
    }

    let boolean = Type::class(env.well_known().boolean, vec![]);
    assert!(!is_subtype(&env, &boolean, &number));
}

#[test]
fn null_is_below_every_reference_type() {
    let env = TypeStore::with_minimal_jdk();
    let string = Type::class(env.well_known().string, vec![]);

    assert!(is_subtype(&env, &Type::Null, &string));
    assert!(is_subtype(&env, &Type::Null, &Type::array(string.clone())));
    assert!(!is_subtype(&env, &string, &Type::Null));
    assert!(!is_subtype(&env, &Type::Null, &Type::int()));
}
