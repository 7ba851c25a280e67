use tycho_infer::{InferenceError, Resolver};
use tycho_types::{is_subtype, Type, TypeEnv, TypeStore};

use pretty_assertions::assert_eq;

#[test]
fn unconstrained_variable_resolves_to_object() {
    let env = TypeStore::with_minimal_jdk();
    let object = Type::class(env.well_known().object, vec![]);

    let mut resolver = Resolver::new(&env);
    let alpha = resolver.new_inference_variable(Some("T"));

    let inferred = resolver.infer(&[alpha]).expect("nothing constrains T");
    assert_eq!(inferred.get(&alpha), Some(&object));
}

#[test]
fn lower_bounds_resolve_to_their_least_upper_bound() {
    let env = TypeStore::with_minimal_jdk();
    let object = Type::class(env.well_known().object, vec![]);
    let number = Type::class(env.well_known().number, vec![]);
    let integer = Type::class(env.well_known().integer, vec![]);
    let double = Type::class(env.well_known().double, vec![]);

    let mut resolver = Resolver::new(&env);
    let alpha = resolver.new_inference_variable(Some("T"));
    resolver
        .add_lower_bound(Type::Infer(alpha), integer.clone())
        .expect("Integer <: T");
    resolver
        .add_lower_bound(Type::Infer(alpha), double.clone())
        .expect("Double <: T");

    let inferred = resolver.infer(&[alpha]).expect("lub must exist");
    let instantiation = &inferred[&alpha];

    // Assignable from both lower bounds, and tighter than Object because a
    // closer common supertype (Number) exists.
    assert!(is_subtype(&env, &integer, instantiation));
    assert!(is_subtype(&env, &double, instantiation));
    assert!(is_subtype(&env, instantiation, &number));
    assert_ne!(*instantiation, object);
}

#[test]
fn dependent_variables_resolve_in_dependency_order() {
    let env = TypeStore::with_minimal_jdk();
    let number = Type::class(env.well_known().number, vec![]);

    let mut resolver = Resolver::new(&env);
    let alpha = resolver.new_inference_variable(Some("T"));
    let beta = resolver.new_inference_variable(Some("U"));

    resolver
        .add_upper_bound(Type::Infer(alpha), number.clone())
        .expect("T <: Number");
    resolver
        .add_upper_bound(Type::Infer(beta), Type::Infer(alpha))
        .expect("U <: T");

    let inferred = resolver.infer(&[alpha, beta]).expect("both must resolve");
    assert!(is_subtype(&env, &inferred[&beta], &number));
    assert!(is_subtype(&env, &inferred[&alpha], &number));
}

#[test]
fn equality_chains_propagate_instantiations() {
    let env = TypeStore::with_minimal_jdk();
    let string = Type::class(env.well_known().string, vec![]);

    let mut resolver = Resolver::new(&env);
    let alpha = resolver.new_inference_variable(Some("T"));
    let beta = resolver.new_inference_variable(Some("U"));

    resolver
        .add_equality(Type::Infer(alpha), Type::Infer(beta))
        .expect("T = U");
    resolver
        .add_equality(Type::Infer(beta), string.clone())
        .expect("U = String");

    let inferred = resolver.infer(&[alpha, beta]).expect("chain must resolve");
    assert_eq!(inferred[&alpha], string);
    assert_eq!(inferred[&beta], string);
}

#[test]
fn upper_bounds_resolve_to_their_greatest_lower_bound() {
    let env = TypeStore::with_minimal_jdk();
    let cloneable = Type::class(env.well_known().cloneable, vec![]);
    let serializable = Type::class(env.well_known().serializable, vec![]);

    let mut resolver = Resolver::new(&env);
    let alpha = resolver.new_inference_variable(Some("T"));
    resolver
        .add_upper_bound(Type::Infer(alpha), cloneable.clone())
        .expect("T <: Cloneable");
    resolver
        .add_upper_bound(Type::Infer(alpha), serializable.clone())
        .expect("T <: Serializable");

    let inferred = resolver.infer(&[alpha]).expect("glb must exist");
    let instantiation = &inferred[&alpha];
    assert!(is_subtype(&env, instantiation, &cloneable));
    assert!(is_subtype(&env, instantiation, &serializable));
}

#[test]
fn declared_parameter_bounds_carry_into_inference() {
    let env = TypeStore::with_minimal_jdk();
    let list = env.well_known().list;
    let number = Type::class(env.well_known().number, vec![]);
    let object = Type::class(env.well_known().object, vec![]);

    // <T extends Number, S extends List<T>>
    let mut store = env.clone();
    let t = store.add_type_param("T", vec![number.clone()]);
    let s = store.add_type_param("S", vec![object.clone()]);
    store.define_type_param(
        s,
        tycho_types::TypeParamDef {
            name: "S".to_string(),
            upper_bounds: vec![Type::class(list, vec![Type::TypeVar(t)])],
            lower_bound: None,
        },
    );

    let mut resolver = Resolver::new(&store);
    let vars = resolver
        .inference_variables_over(&[t, s])
        .expect("declared bounds must be consistent");
    let (alpha, beta) = (vars[0], vars[1]);

    let inferred = resolver.infer(&vars).expect("both must resolve");
    assert_eq!(inferred[&alpha], number);
    assert_eq!(inferred[&beta], Type::class(list, vec![number.clone()]));
}

#[test]
fn nested_declarations_reuse_enclosing_variables() {
    let env = TypeStore::with_minimal_jdk();
    let list = env.well_known().list;
    let object = Type::class(env.well_known().object, vec![]);

    // class C<T> { <S extends List<T>> void m(...) }
    let mut store = env.clone();
    let t = store.add_type_param("T", vec![object]);
    let s = store.add_type_param(
        "S",
        vec![Type::class(list, vec![Type::TypeVar(t)])],
    );

    let mut resolver = Resolver::new(&store);
    let outer = resolver
        .inference_variables_over(&[t])
        .expect("class declaration");
    let inner = resolver
        .inference_variables_over(&[t, s])
        .expect("method declaration sharing the class context");

    // The enclosing parameter keeps its variable, and the method bound
    // mentions it rather than the raw declared parameter.
    assert_eq!(outer[0], inner[0]);
    assert_eq!(resolver.inference_variable_for(t), Some(outer[0]));
    assert!(resolver
        .bound_set()
        .upper_bounds(inner[1])
        .iter()
        .any(|u| u.mentions_infer(outer[0])));
}

#[test]
fn overload_candidates_fail_independently() {
    let env = TypeStore::with_minimal_jdk();
    let number = Type::class(env.well_known().number, vec![]);
    let string = Type::class(env.well_known().string, vec![]);
    let integer = Type::class(env.well_known().integer, vec![]);
    let object = Type::class(env.well_known().object, vec![]);

    let mut shared = Resolver::new(&env);
    let alpha = shared.new_inference_variable(Some("T"));

    // Candidate one: String <: T <: Number. Contradicts, and only its own
    // copy sees the failure.
    let mut first = shared.copy();
    first
        .add_lower_bound(Type::Infer(alpha), string)
        .expect("String <: T is fine on its own");
    let err = first
        .add_upper_bound(Type::Infer(alpha), number.clone())
        .expect_err("String <: T <: Number must contradict");
    assert!(matches!(err, InferenceError::Contradiction(_)));
    assert!(first.bound_set().is_contradicted());

    // Candidate two: Integer <: T <: Number resolves.
    let mut second = shared.copy();
    second
        .add_lower_bound(Type::Infer(alpha), integer.clone())
        .expect("Integer <: T");
    second
        .add_upper_bound(Type::Infer(alpha), number)
        .expect("T <: Number");
    let inferred = second.infer(&[alpha]).expect("second candidate resolves");
    assert_eq!(inferred[&alpha], integer);

    // The shared session never saw either candidate's bounds.
    assert!(!shared.bound_set().is_contradicted());
    let inferred = shared.infer(&[alpha]).expect("shared session unconstrained");
    assert_eq!(inferred[&alpha], object);
}

#[test]
fn contradicted_sessions_are_terminal() {
    let env = TypeStore::with_minimal_jdk();
    let string = Type::class(env.well_known().string, vec![]);
    let integer = Type::class(env.well_known().integer, vec![]);

    let mut resolver = Resolver::new(&env);
    let alpha = resolver.new_inference_variable(Some("T"));
    resolver
        .add_equality(Type::Infer(alpha), string)
        .expect("T = String");
    let first = resolver
        .add_equality(Type::Infer(alpha), integer.clone())
        .expect_err("T = Integer must contradict T = String");

    // Every further operation surfaces the same contradiction.
    let second = resolver
        .add_lower_bound(Type::Infer(alpha), integer)
        .expect_err("contradicted sessions reject further constraints");
    assert_eq!(first, second);
    assert!(matches!(
        resolver.infer(&[alpha]),
        Err(InferenceError::Contradiction(_))
    ));
}
