//! Service dependency graph using `petgraph`.
//!
//! Checks that every `depends_on` entry names an assembled service and that
//! the dependencies form a DAG, and yields a start order.

use std::collections::HashMap;

use emulation_common::error::{EmulationError, Result};
use petgraph::graph::{DiGraph, NodeIndex};

use crate::service::BuiltService;

/// A dependency graph of services keyed by service name.
#[derive(Debug, Default)]
pub struct ServiceGraph {
    graph: DiGraph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
}

impl ServiceGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph of `services`.
    ///
    /// # Errors
    ///
    /// Returns a dependency error if a service depends on an unknown name.
    pub fn from_services<'a>(
        services: impl IntoIterator<Item = (&'a str, &'a BuiltService)> + Clone,
    ) -> Result<Self> {
        let mut graph = Self::new();
        for (name, _) in services.clone() {
            let _ = graph.add_service(name);
        }
        for (name, service) in services {
            for dependency in service.depends_on.iter().flatten() {
                graph.add_dependency(name, dependency)?;
            }
        }
        Ok(graph)
    }

    /// Adds a service node, returning the existing node for a known name.
    pub fn add_service(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        let _ = self.nodes.insert(name.to_string(), idx);
        idx
    }

    /// Records that `dependent` depends on `dependency`.
    ///
    /// The edge points from `dependency` to `dependent` so that a
    /// topological sort yields dependencies first.
    ///
    /// # Errors
    ///
    /// Returns a dependency error if either name is not a service.
    pub fn add_dependency(&mut self, dependent: &str, dependency: &str) -> Result<()> {
        let to = self.node(dependent, dependent)?;
        let from = self.node(dependent, dependency)?;
        let _ = self.graph.add_edge(from, to, ());
        Ok(())
    }

    fn node(&self, referrer: &str, name: &str) -> Result<NodeIndex> {
        self.nodes
            .get(name)
            .copied()
            .ok_or_else(|| EmulationError::Dependency {
                message: format!("\"{referrer}\" depends on unknown service \"{name}\""),
            })
    }

    /// Returns service names with dependencies before their dependents.
    ///
    /// # Errors
    ///
    /// Returns a dependency error naming a service on a cycle.
    pub fn start_order(&self) -> Result<Vec<String>> {
        petgraph::algo::toposort(&self.graph, None)
            .map(|indices| {
                indices
                    .into_iter()
                    .filter_map(|idx| self.graph.node_weight(idx).cloned())
                    .collect()
            })
            .map_err(|cycle| EmulationError::Dependency {
                message: format!(
                    "cyclic dependency involving \"{}\"",
                    self.graph
                        .node_weight(cycle.node_id())
                        .map_or("?", String::as_str)
                ),
            })
    }
}

/// Checks the `depends_on` entries of `services`.
///
/// # Errors
///
/// Returns a dependency error for dangling references or cycles.
pub fn check_dependencies<'a>(
    services: impl IntoIterator<Item = (&'a str, &'a BuiltService)> + Clone,
) -> Result<Vec<String>> {
    ServiceGraph::from_services(services)?.start_order()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn service(name: &str, depends_on: &[&str]) -> (String, BuiltService) {
        let svc = BuiltService {
            container_name: name.into(),
            image: "img".into(),
            build: None,
            tty: true,
            volumes: Vec::new(),
            networks: vec!["local-network".into()],
            ports: None,
            command: None,
            depends_on: if depends_on.is_empty() {
                None
            } else {
                Some(depends_on.iter().map(ToString::to_string).collect())
            },
            env_vars: BTreeMap::new(),
            health_check: None,
        };
        (name.to_string(), svc)
    }

    fn order(services: &[(String, BuiltService)]) -> Result<Vec<String>> {
        check_dependencies(services.iter().map(|(n, s)| (n.as_str(), s)))
    }

    #[test]
    fn empty_graph_resolves_to_empty() {
        let order = ServiceGraph::new().start_order().expect("should resolve");
        assert!(order.is_empty());
    }

    #[test]
    fn dependencies_start_first() {
        let services = [
            service("ot2", &["emulator-proxy", "smoothie"]),
            service("emulator-proxy", &[]),
            service("smoothie", &[]),
            service("tc", &["emulator-proxy"]),
        ];
        let order = order(&services).expect("should resolve");
        let pos = |name: &str| order.iter().position(|n| n == name).expect(name);
        assert!(pos("emulator-proxy") < pos("ot2"));
        assert!(pos("smoothie") < pos("ot2"));
        assert!(pos("emulator-proxy") < pos("tc"));
    }

    #[test]
    fn dangling_reference_fails() {
        let services = [service("ot2", &["smoothie"])];
        let err = order(&services).expect_err("should fail");
        assert!(err.to_string().contains("unknown service \"smoothie\""), "got: {err}");
    }

    #[test]
    fn cycle_detection() {
        let services = [service("a", &["b"]), service("b", &["c"]), service("c", &["a"])];
        let err = order(&services).expect_err("should fail");
        assert!(err.to_string().contains("cyclic"), "got: {err}");
    }

    #[test]
    fn add_service_is_idempotent() {
        let mut graph = ServiceGraph::new();
        let first = graph.add_service("proxy");
        let second = graph.add_service("proxy");
        assert_eq!(first, second);
        assert_eq!(graph.start_order().expect("resolve"), vec!["proxy"]);
    }
}
