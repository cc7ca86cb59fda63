use ferrous_ioc::{
    Autowired, ComponentCollection, ComponentDefinition, ContainerConfig, DiError, ResolutionObserver, Resolver,
};
use std::sync::Arc;

#[derive(Default, Debug)]
struct A {
    b: Autowired<B>,
}

#[derive(Default)]
struct B {
    a: Autowired<A>,
}

#[derive(Default)]
struct Node {
    next: Autowired<Node>,
}

fn field_pair(config: ContainerConfig) -> ComponentCollection {
    let mut components = ComponentCollection::with_config(config);
    components
        .register(ComponentDefinition::builder::<A>("a").with_default().autowire::<B, _>("b", |a| &a.b).build())
        .unwrap()
        .register(ComponentDefinition::builder::<B>("b").with_default().autowire::<A, _>("a", |b| &b.a).build())
        .unwrap();
    components
}

fn node(name: &str, next: &str) -> ComponentDefinition {
    ComponentDefinition::builder::<Node>(name)
        .with_default()
        .autowire::<Node, _>(next, |n| &n.next)
        .build()
}

#[test]
fn field_cycle_is_wired_with_early_references() {
    let container = field_pair(ContainerConfig::default()).build().unwrap();

    let a = container.get::<A>("a").unwrap();
    let b = container.get::<B>("b").unwrap();
    assert!(Arc::ptr_eq(&a.b.get_required(), &b));
    assert!(Arc::ptr_eq(&b.a.get_required(), &a));
}

#[test]
fn field_cycle_resolves_from_either_entry_point() {
    let container = field_pair(ContainerConfig::default().with_eager_init(false)).build().unwrap();

    let b = container.get::<B>("b").unwrap();
    assert_eq!(container.singleton_names(), ["a", "b"]);
    let a = container.get::<A>("a").unwrap();
    assert!(Arc::ptr_eq(&b.a.get_required(), &a));
}

#[test]
fn three_way_field_cycle() {
    let mut components = ComponentCollection::new();
    components
        .register(node("x", "y"))
        .unwrap()
        .register(node("y", "z"))
        .unwrap()
        .register(node("z", "x"))
        .unwrap();
    let container = components.build().unwrap();

    let x = container.get::<Node>("x").unwrap();
    let around = x.next.get_required().next.get_required().next.get_required();
    assert!(Arc::ptr_eq(&x, &around));
}

#[test]
fn self_reference_through_a_field() {
    let mut components = ComponentCollection::new();
    components.register(node("me", "me")).unwrap();
    let container = components.build().unwrap();

    let me = container.get::<Node>("me").unwrap();
    assert!(Arc::ptr_eq(&me, &me.next.get_required()));
}

#[test]
fn field_cycle_fails_when_circular_references_are_disabled() {
    let config = ContainerConfig::default().with_circular_references(false).with_eager_init(false);
    let container = field_pair(config).build().unwrap();

    match container.get::<A>("a") {
        Err(DiError::Circular { chain }) => assert_eq!(chain, ["a", "b", "a"]),
        other => panic!("expected Circular, got {other:?}"),
    }
    assert!(container.singleton_names().is_empty());
}

#[test]
fn constructor_cycle_is_an_error() {
    let mut components = ComponentCollection::new();
    components
        .register(ComponentDefinition::builder::<u8>("a").constructor_arg("b").constructor(|_| Ok(1)).build())
        .unwrap()
        .register(ComponentDefinition::builder::<u8>("b").constructor_arg("a").constructor(|_| Ok(2)).build())
        .unwrap();

    match components.build() {
        Err(DiError::Circular { chain }) => assert_eq!(chain, ["a", "b", "a"]),
        other => panic!("expected Circular, got {other:?}"),
    }
}

#[test]
fn depends_on_cycle_is_an_error() {
    let mut components = ComponentCollection::with_config(ContainerConfig::default().with_eager_init(false));
    components
        .register(ComponentDefinition::builder::<u8>("a").depends_on("b").constructor(|_| Ok(1)).build())
        .unwrap()
        .register(ComponentDefinition::builder::<u8>("b").depends_on("a").constructor(|_| Ok(2)).build())
        .unwrap();
    let container = components.build().unwrap();

    assert!(matches!(container.get::<u8>("b"), Err(DiError::Circular { .. })));
    // nothing half-built is left behind
    assert!(matches!(container.get::<u8>("a"), Err(DiError::Circular { .. })));
    assert!(container.singleton_names().is_empty());
}

#[derive(Default, Debug)]
struct Late {
    early: Autowired<Early>,
}

#[derive(Debug)]
struct Early {
    late: Arc<Late>,
}

fn mixed_cycle() -> ComponentCollection {
    let mut components = ComponentCollection::with_config(ContainerConfig::default().with_eager_init(false));
    components
        .register(
            ComponentDefinition::builder::<Early>("early")
                .constructor_arg("late")
                .constructor(|args| Ok(Early { late: args.get::<Late>("late")? }))
                .build(),
        )
        .unwrap()
        .register(
            ComponentDefinition::builder::<Late>("late")
                .with_default()
                .autowire::<Early, _>("early", |l| &l.early)
                .build(),
        )
        .unwrap();
    components
}

#[test]
fn mixed_cycle_resolves_when_entered_through_the_field_side() {
    let container = mixed_cycle().build().unwrap();

    let late = container.get::<Late>("late").unwrap();
    let early = container.get::<Early>("early").unwrap();
    assert!(Arc::ptr_eq(&early.late, &late));
    assert!(Arc::ptr_eq(&late.early.get_required(), &early));
}

#[test]
fn mixed_cycle_fails_when_entered_through_the_constructor_side() {
    let container = mixed_cycle().build().unwrap();

    match container.get::<Early>("early") {
        Err(DiError::Circular { chain }) => assert_eq!(chain, ["early", "late", "early"]),
        other => panic!("expected Circular, got {other:?}"),
    }
    // the failed attempt left no trace; the other entry point still works
    assert!(container.get::<Late>("late").is_ok());
    assert!(container.get::<Early>("early").is_ok());
}

#[derive(Default)]
struct EarlyCounter(parking_lot::Mutex<Vec<String>>);

impl ResolutionObserver for EarlyCounter {
    fn early_reference_exposed(&self, name: &str) {
        self.0.lock().push(name.to_string());
    }
}

#[test]
fn early_reference_is_built_once_per_cycle() {
    let observer = Arc::new(EarlyCounter::default());
    let mut components = field_pair(ContainerConfig::default());
    components.add_observer(observer.clone());
    let _container = components.build().unwrap();

    assert_eq!(*observer.0.lock(), ["a"]);
}

#[test]
fn acyclic_components_never_expose_early_references() {
    let observer = Arc::new(EarlyCounter::default());
    let mut components = ComponentCollection::new();
    components.add_observer(observer.clone());
    components
        .register(node("head", "tail"))
        .unwrap()
        .register(ComponentDefinition::builder::<Node>("tail").with_default().build())
        .unwrap();
    let _container = components.build().unwrap();

    assert!(observer.0.lock().is_empty());
}
