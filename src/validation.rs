//! Static validation of a component collection.
//!
//! Checks the declared dependency graph before anything is created:
//!
//! - every referenced name is registered (and `&name` references a producer)
//! - no cycle runs only through constructor arguments / `depends_on`; such a
//!   cycle always fails at runtime
//! - cycles mixing hard edges and field edges are reported as warnings, since
//!   whether they resolve depends on which component is requested first
//! - pure field cycles are fine, unless circular references are disabled

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use indexmap::IndexMap;

use crate::config::ContainerConfig;
use crate::naming::RequestedName;
use crate::registration::Registry;

/// A problem that makes resolution fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{component} depends on unregistered component {dependency}")]
    MissingDependency { component: String, dependency: String },

    #[error("{component} depends on abstract component {dependency}")]
    AbstractDependency { component: String, dependency: String },

    #[error("{component} requests producer {dependency} but it is not a producer")]
    NotAProducer { component: String, dependency: String },

    #[error("constructor/depends_on cycle: {}", cycle.join(" -> "))]
    HardCycle { cycle: Vec<String> },

    #[error("field cycle with circular references disabled: {}", cycle.join(" -> "))]
    FieldCycleDisallowed { cycle: Vec<String> },
}

/// A configuration that may work but deserves a look.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// Cycle mixing constructor and field edges; resolves only from some entry points.
    OrderDependentCycle { cycle: Vec<String> },
    /// Lazy hook components are still created eagerly.
    LazyHook { component: String },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::OrderDependentCycle { cycle } => {
                write!(f, "cycle resolves only from some entry points: {}", cycle.join(" -> "))
            }
            ValidationWarning::LazyHook { component } => {
                write!(f, "hook component {component} is marked lazy but is created at build time")
            }
        }
    }
}

/// Findings of [`ComponentCollection::validate`](crate::ComponentCollection::validate).
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{ComponentCollection, ComponentDefinition, ValidationError};
///
/// #[derive(Default)]
/// struct A;
///
/// let mut components = ComponentCollection::new();
/// components
///     .register(ComponentDefinition::builder::<A>("a").with_default().constructor_arg("a2").build())
///     .unwrap();
///
/// let report = components.validate();
/// assert!(!report.is_valid());
/// assert!(matches!(report.errors[0], ValidationError::MissingDependency { .. }));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The first error, if any.
    pub fn into_result(self) -> Result<(), ValidationError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeKind {
    Hard,
    Field,
}

type Cycle = (Vec<String>, Vec<EdgeKind>);

struct Graph<'a> {
    edges: IndexMap<&'a str, Vec<(&'a str, EdgeKind)>>,
}

impl<'a> Graph<'a> {
    /// One shortest hard-only cycle per group of components that can never be built,
    /// plus every component lying on such a cycle.
    fn hard_cycles(&self) -> (Vec<Vec<String>>, HashSet<&'a str>) {
        let mut cycles = Vec::new();
        let mut on_cycle = HashSet::new();
        for &node in self.edges.keys() {
            if on_cycle.contains(node) {
                continue;
            }
            if let Some(cycle) = self.hard_cycle_through(node) {
                on_cycle.extend(cycle.iter().copied());
                cycles.push(cycle.iter().map(|n| n.to_string()).collect());
            }
        }
        (cycles, on_cycle)
    }

    /// Breadth-first search back to `start` over hard edges only.
    fn hard_cycle_through(&self, start: &'a str) -> Option<Vec<&'a str>> {
        let mut previous: HashMap<&'a str, &'a str> = HashMap::new();
        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            for &(dependency, kind) in self.edges.get(node).into_iter().flatten() {
                if kind != EdgeKind::Hard {
                    continue;
                }
                if dependency == start {
                    let mut path = vec![node];
                    let mut cursor = node;
                    while let Some(&before) = previous.get(cursor) {
                        path.push(before);
                        cursor = before;
                    }
                    path.reverse();
                    path.push(start);
                    return Some(path);
                }
                if !previous.contains_key(dependency) {
                    previous.insert(dependency, node);
                    queue.push_back(dependency);
                }
            }
        }
        None
    }

    /// Cycles closed by back edges of a depth-first walk over all edges.
    fn cycles(&self) -> Vec<Cycle> {
        let mut done = HashSet::new();
        let mut path = Vec::new();
        let mut kinds = Vec::new();
        let mut cycles = Vec::new();
        for &node in self.edges.keys() {
            self.visit(node, &mut path, &mut kinds, &mut done, &mut cycles);
        }
        cycles
    }

    fn visit(
        &self,
        node: &'a str,
        path: &mut Vec<&'a str>,
        kinds: &mut Vec<EdgeKind>,
        done: &mut HashSet<&'a str>,
        cycles: &mut Vec<Cycle>,
    ) {
        if let Some(start) = path.iter().position(|&n| n == node) {
            let mut names: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
            names.push(node.to_string());
            cycles.push((names, kinds[start..].to_vec()));
            return;
        }
        if !done.insert(node) {
            return;
        }
        path.push(node);
        for &(dependency, kind) in self.edges.get(node).into_iter().flatten() {
            kinds.push(kind);
            self.visit(dependency, path, kinds, done, cycles);
            kinds.pop();
        }
        path.pop();
    }
}

pub(crate) fn validate(registry: &Registry, config: &ContainerConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut graph = Graph { edges: IndexMap::new() };

    for def in registry.iter() {
        if def.is_hook() && def.is_lazy() {
            report.warnings.push(ValidationWarning::LazyHook { component: def.name.clone() });
        }

        let hard_count = def.depends_on().len() + def.constructor_args().len();
        let mut edges = Vec::new();
        for (index, requested) in def.all_dependencies().enumerate() {
            let kind = if index < hard_count { EdgeKind::Hard } else { EdgeKind::Field };
            let parsed = RequestedName::parse(requested);
            let Some(target) = registry.get(parsed.canonical) else {
                report.errors.push(ValidationError::MissingDependency {
                    component: def.name.clone(),
                    dependency: requested.to_string(),
                });
                continue;
            };
            if target.is_abstract() {
                report.errors.push(ValidationError::AbstractDependency {
                    component: def.name.clone(),
                    dependency: requested.to_string(),
                });
            }
            if parsed.wants_producer && !target.is_producer() {
                report.errors.push(ValidationError::NotAProducer {
                    component: def.name.clone(),
                    dependency: requested.to_string(),
                });
            }
            edges.push((target.name.as_str(), kind));
        }
        graph.edges.insert(def.name.as_str(), edges);
    }

    let (hard_cycles, unbuildable) = graph.hard_cycles();
    report.errors.extend(hard_cycles.into_iter().map(|cycle| ValidationError::HardCycle { cycle }));

    for (cycle, kinds) in graph.cycles() {
        // anything through an unbuildable component is already reported
        if cycle.iter().any(|name| unbuildable.contains(name.as_str())) {
            continue;
        }
        if kinds.contains(&EdgeKind::Hard) {
            report.warnings.push(ValidationWarning::OrderDependentCycle { cycle });
        } else if !config.allow_circular_references {
            report.errors.push(ValidationError::FieldCycleDisallowed { cycle });
        }
    }

    report
}
