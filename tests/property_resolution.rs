/// Property-based tests for resolution
///
/// Random component graphs are generated and the container is checked to
/// create each singleton once and wire every slot to the named singleton,
/// whatever the shape of the graph and the order of lookups.

use ferrous_ioc::{Autowired, ComponentCollection, ComponentDefinition, ContainerConfig, Resolver};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Node {
    slots: Vec<Autowired<Node>>,
}

fn name(i: usize) -> String {
    format!("n{i}")
}

/// Adjacency lists over `0..n`, edges may point anywhere (cycles included).
fn graphs() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1usize..8).prop_flat_map(|n| prop::collection::vec(prop::collection::vec(0..n, 0..4), n))
}

fn field_graph(edges: &[Vec<usize>], created: &Arc<AtomicUsize>, eager: bool) -> ComponentCollection {
    let mut components = ComponentCollection::with_config(ContainerConfig::default().with_eager_init(eager));
    for (i, targets) in edges.iter().enumerate() {
        let slots = targets.len();
        let created = created.clone();
        let mut builder = ComponentDefinition::builder::<Node>(name(i)).constructor(move |_| {
            created.fetch_add(1, Ordering::SeqCst);
            Ok(Node { slots: (0..slots).map(|_| Autowired::new()).collect() })
        });
        for (k, target) in targets.iter().enumerate() {
            builder = builder.autowire::<Node, _>(name(*target), move |node| &node.slots[k]);
        }
        components.register(builder.build()).unwrap();
    }
    components
}

proptest! {
    #[test]
    fn field_graphs_always_resolve(edges in graphs(), start in any::<prop::sample::Index>()) {
        let created = Arc::new(AtomicUsize::new(0));
        let container = field_graph(&edges, &created, false).build().unwrap();

        let first = start.index(edges.len());
        container.get::<Node>(&name(first)).unwrap();
        for i in 0..edges.len() {
            container.get::<Node>(&name(i)).unwrap();
        }
        prop_assert_eq!(created.load(Ordering::SeqCst), edges.len());

        for (i, targets) in edges.iter().enumerate() {
            let node = container.get::<Node>(&name(i)).unwrap();
            for (k, target) in targets.iter().enumerate() {
                let expected = container.get::<Node>(&name(*target)).unwrap();
                prop_assert!(Arc::ptr_eq(&node.slots[k].get_required(), &expected));
            }
        }
    }

    #[test]
    fn eager_build_creates_every_component_once(edges in graphs()) {
        let created = Arc::new(AtomicUsize::new(0));
        let container = field_graph(&edges, &created, true).build().unwrap();

        prop_assert_eq!(created.load(Ordering::SeqCst), edges.len());
        prop_assert_eq!(container.singleton_names().len(), edges.len());
    }

    #[test]
    fn constructor_dags_resolve_in_any_registration_order(
        order in Just((0usize..6).collect::<Vec<_>>()).prop_shuffle(),
        deps in prop::collection::vec(prop::collection::vec(any::<bool>(), 6), 6),
    ) {
        // i may depend on j only when j < i, so the graph is acyclic
        let mut components = ComponentCollection::new();
        for &i in &order {
            let mut builder = ComponentDefinition::builder::<usize>(name(i));
            for j in (0..i).filter(|&j| deps[i][j]) {
                builder = builder.constructor_arg(name(j));
            }
            let builder = builder.constructor(move |args| {
                let mut sum = 1;
                for arg in args.arg_names() {
                    sum += *args.get::<usize>(arg)?;
                }
                Ok(sum)
            });
            components.register(builder.build()).unwrap();
        }
        let container = components.build().unwrap();

        let mut expected = vec![0usize; 6];
        for i in 0..6 {
            expected[i] = 1 + (0..i).filter(|&j| deps[i][j]).map(|j| expected[j]).sum::<usize>();
            prop_assert_eq!(*container.get::<usize>(&name(i)).unwrap(), expected[i]);
        }
    }
}
