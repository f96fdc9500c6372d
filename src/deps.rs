//! Class dependency graph
//!
//! Nodes are the classes defined in the module; an edge `A -> B` means some
//! signature of `A` mentions `B`. Forward-declared classes are external and
//! never become nodes.

use crate::hir::{ClassOrigin, Module};
use indexmap::IndexMap;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    nodes: IndexMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub fn build(module: &Module) -> Self {
        let mut deps = Self::default();
        let classes: Vec<_> = module.classes().into_iter().filter(|c| !c.forward_only).collect();

        for class in &classes {
            let name = class.qualified_name();
            let idx = deps.graph.add_node(name.clone());
            deps.nodes.insert(name, idx);
        }

        for class in &classes {
            let from = deps.nodes[&class.qualified_name()];
            for ty in class.type_refs() {
                if ty.origin != Some(ClassOrigin::Declared) {
                    continue;
                }
                if let Some(&to) = deps.nodes.get(&ty.qualified_name()) {
                    if from != to && deps.graph.find_edge(from, to).is_none() {
                        deps.graph.add_edge(from, to, ());
                    }
                }
            }
        }

        tracing::debug!(
            classes = deps.graph.node_count(),
            edges = deps.graph.edge_count(),
            "built dependency graph"
        );
        deps
    }

    /// Classes that `qualified_name` mentions, in declaration order
    pub fn dependencies_of(&self, qualified_name: &str) -> Vec<&str> {
        let Some(&idx) = self.nodes.get(qualified_name) else {
            return Vec::new();
        };
        let mut out: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        out.sort();
        out.into_iter().map(|n| self.graph[n].as_str()).collect()
    }

    /// Classes that mention `qualified_name`
    pub fn dependents_of(&self, qualified_name: &str) -> Vec<&str> {
        let Some(&idx) = self.nodes.get(qualified_name) else {
            return Vec::new();
        };
        let mut out: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Incoming)
            .collect();
        out.sort();
        out.into_iter().map(|n| self.graph[n].as_str()).collect()
    }

    /// Order in which bindings can be generated: every class comes after the
    /// classes it depends on. Mutually dependent classes share one group.
    pub fn generation_order(&self) -> Vec<Vec<&str>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .map(|mut group| {
                group.sort();
                group.into_iter().map(|n| self.graph[n].as_str()).collect()
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_and_resolve;

    const SRC: &str = "class Ext;
namespace geo {
class Point2 {
  Point2();
  double x() const;
};
class Pose2 {
  Pose2(const geo::Point2& t);
  geo::Point2 translation() const;
  geo::Pose2 compose(const geo::Pose2& other) const;
};
class Graph {
  Graph();
  void add(const geo::Pose2& p);
  Ext* external();
};
}///\\namespace geo
";

    #[test]
    fn test_dependencies() {
        let module = parse_and_resolve(SRC).unwrap();
        let deps = DependencyGraph::build(&module);
        assert_eq!(deps.len(), 3);
        assert_eq!(deps.dependencies_of("geo::Pose2"), vec!["geo::Point2"]);
        assert_eq!(deps.dependencies_of("geo::Graph"), vec!["geo::Pose2"]);
        assert_eq!(deps.dependents_of("geo::Point2"), vec!["geo::Pose2"]);
        assert!(deps.dependencies_of("Ext").is_empty());
    }

    #[test]
    fn test_generation_order_puts_dependencies_first() {
        let module = parse_and_resolve(SRC).unwrap();
        let graph = DependencyGraph::build(&module);
        let order = graph.generation_order();
        let flat: Vec<&str> = order.into_iter().flatten().collect();
        assert_eq!(flat, vec!["geo::Point2", "geo::Pose2", "geo::Graph"]);
    }

    #[test]
    fn test_cycle_is_one_group() {
        let src = "class A {\n  A();\n  B toB() const;\n};\nclass B {\n  B();\n  A toA() const;\n};\n";
        let module = parse_and_resolve(src).unwrap();
        let graph = DependencyGraph::build(&module);
        let order = graph.generation_order();
        assert_eq!(order, vec![vec!["A", "B"]]);
    }
}
