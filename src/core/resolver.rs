//! # Dependency Resolver
//!
//! Orders targets so that every dependency runs before its dependents.
//!
//! The walk is a depth-first search with three states per target: absent from
//! the state map (unvisited), `Visiting` (on the current path) and `Visited`
//! (finished and appended to the output). Reaching a `Visiting` target again
//! means a cycle.
//!
//! After the requested root is ordered, every other declared target is walked
//! as well so that a broken graph anywhere in the project fails the build
//! before a single task runs. Only the root's own prefix of the order is
//! returned.

use crate::core::{
    error::{BuildError, BuildResult},
    target::Target,
};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Visiting,
    Visited,
}

/// Holds the DFS state for one resolution.
#[derive(Debug)]
pub struct DependencyResolver<'a> {
    targets: &'a HashMap<String, Arc<Target>>,
    declaration_order: &'a [String],
    state: HashMap<&'a str, VisitState>,
    visiting: Vec<&'a str>,
    order: Vec<Arc<Target>>,
}

impl<'a> DependencyResolver<'a> {
    /// Creates a resolver over `targets`, using `declaration_order` for the
    /// validation pass.
    pub fn new(targets: &'a HashMap<String, Arc<Target>>, declaration_order: &'a [String]) -> Self {
        Self {
            targets,
            declaration_order,
            state: HashMap::new(),
            visiting: Vec::new(),
            order: Vec::new(),
        }
    }

    /// Computes the execution order for `root`, ending with `root` itself.
    ///
    /// # Errors
    /// `UnknownTarget` if `root` or any target reachable from anywhere in the
    /// project is missing, `CircularDependency` if any cycle exists.
    pub fn resolve(mut self, root: &str) -> BuildResult<Vec<Arc<Target>>> {
        let targets = self.targets;
        let root_target = targets
            .get_key_value(root)
            .ok_or_else(|| BuildError::UnknownTarget {
                name: root.to_string(),
                parent: None,
            })?;
        self.visit(root_target.0.as_str())?;
        let root_len = self.order.len();

        let declaration_order = self.declaration_order;
        for name in declaration_order {
            if !self.state.contains_key(name.as_str()) {
                self.visit(name.as_str())?;
            }
        }

        let mut order = self.order;
        order.truncate(root_len);
        log::debug!(
            "Build sequence for target '{}' is [{}]",
            root,
            order
                .iter()
                .map(|t| t.name())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(order)
    }

    fn visit(&mut self, name: &'a str) -> BuildResult<()> {
        self.state.insert(name, VisitState::Visiting);
        self.visiting.push(name);

        let targets = self.targets;
        let target = match targets.get(name) {
            Some(target) => target,
            None => {
                // The name on top of the stack is `name` itself; its referrer sits below it.
                let parent = self
                    .visiting
                    .len()
                    .checked_sub(2)
                    .and_then(|i| self.visiting.get(i))
                    .map(|p| p.to_string());
                return Err(BuildError::UnknownTarget {
                    name: name.to_string(),
                    parent,
                });
            }
        };

        for dependency in target.dependencies() {
            match self.state.get(dependency.as_str()).copied() {
                None => self.visit(dependency.as_str())?,
                Some(VisitState::Visiting) => {
                    return Err(self.circular_error(dependency));
                }
                Some(VisitState::Visited) => {}
            }
        }

        match self.visiting.pop() {
            Some(top) if top == name => {}
            other => {
                return Err(BuildError::Internal {
                    message: format!(
                        "Unexpected target '{}' on the visiting stack while finishing '{}'.",
                        other.unwrap_or("<empty>"),
                        name
                    ),
                });
            }
        }
        self.state.insert(name, VisitState::Visited);
        self.order.push(target.clone());
        Ok(())
    }

    /// Builds the cycle path from the first occurrence of `repeated` on the stack.
    fn circular_error(&self, repeated: &str) -> BuildError {
        let start = self
            .visiting
            .iter()
            .position(|n| *n == repeated)
            .unwrap_or(0);
        let mut path: Vec<String> = self
            .visiting
            .iter()
            .skip(start)
            .map(|n| n.to_string())
            .collect();
        path.push(repeated.to_string());
        BuildError::CircularDependency { path }
    }
}

/// Convenience wrapper around [`DependencyResolver::resolve`].
pub fn resolve(
    targets: &HashMap<String, Arc<Target>>,
    declaration_order: &[String],
    root: &str,
) -> BuildResult<Vec<Arc<Target>>> {
    DependencyResolver::new(targets, declaration_order).resolve(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &[&str])]) -> (HashMap<String, Arc<Target>>, Vec<String>) {
        let mut targets = HashMap::new();
        let mut order = Vec::new();
        for (name, deps) in edges {
            let mut target = Target::new(*name);
            for dep in *deps {
                target.add_dependency(*dep);
            }
            targets.insert(name.to_string(), Arc::new(target));
            order.push(name.to_string());
        }
        (targets, order)
    }

    fn names(order: &[Arc<Target>]) -> Vec<&str> {
        order.iter().map(|t| t.name()).collect()
    }

    #[test]
    fn test_linear_chain() {
        let (targets, order) = graph(&[
            ("clean", &[]),
            ("compile", &["clean"]),
            ("test", &["compile"]),
        ]);
        let sorted = resolve(&targets, &order, "test").unwrap();
        assert_eq!(names(&sorted), vec!["clean", "compile", "test"]);
    }

    #[test]
    fn test_diamond_runs_shared_dependency_once() {
        let (targets, order) = graph(&[
            ("init", &[]),
            ("a", &["init"]),
            ("b", &["init"]),
            ("all", &["a", "b"]),
        ]);
        let sorted = resolve(&targets, &order, "all").unwrap();
        assert_eq!(names(&sorted), vec!["init", "a", "b", "all"]);
    }

    #[test]
    fn test_dependency_declaration_order_breaks_ties() {
        let (targets, order) = graph(&[
            ("x", &[]),
            ("y", &[]),
            ("z", &[]),
            ("root", &["z", "x", "y"]),
        ]);
        let sorted = resolve(&targets, &order, "root").unwrap();
        assert_eq!(names(&sorted), vec!["z", "x", "y", "root"]);
    }

    #[test]
    fn test_result_is_minimal_and_root_last() {
        let (targets, order) = graph(&[
            ("unrelated", &[]),
            ("base", &[]),
            ("app", &["base"]),
            ("docs", &["unrelated"]),
        ]);
        let sorted = resolve(&targets, &order, "app").unwrap();
        assert_eq!(names(&sorted), vec!["base", "app"]);
    }

    #[test]
    fn test_every_dependency_precedes_dependent() {
        let (targets, order) = graph(&[
            ("a", &["b", "c"]),
            ("b", &["d"]),
            ("c", &["d", "e"]),
            ("d", &[]),
            ("e", &["d"]),
        ]);
        let sorted = resolve(&targets, &order, "a").unwrap();
        let position: HashMap<&str, usize> = names(&sorted)
            .into_iter()
            .enumerate()
            .map(|(i, n)| (n, i))
            .collect();
        for target in &sorted {
            for dep in target.dependencies() {
                assert!(position[dep.as_str()] < position[target.name()]);
            }
        }
        assert_eq!(sorted.last().unwrap().name(), "a");
    }

    #[test]
    fn test_cycle_reports_full_path() {
        let (targets, order) = graph(&[("A", &["B"]), ("B", &["C"]), ("C", &["A"])]);
        let err = resolve(&targets, &order, "A").unwrap_err();
        match err {
            BuildError::CircularDependency { path } => {
                assert_eq!(path, vec!["A", "B", "C", "A"]);
            }
            other => panic!("expected a cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let (targets, order) = graph(&[("loop", &["loop"])]);
        assert!(matches!(
            resolve(&targets, &order, "loop"),
            Err(BuildError::CircularDependency { .. })
        ));
    }

    #[test]
    fn test_unknown_root() {
        let (targets, order) = graph(&[("a", &[])]);
        let err = resolve(&targets, &order, "X").unwrap_err();
        assert!(matches!(err, BuildError::UnknownTarget { ref name, parent: None } if name == "X"));
    }

    #[test]
    fn test_unknown_dependency_names_parent() {
        let (targets, order) = graph(&[("a", &["ghost"])]);
        let err = resolve(&targets, &order, "a").unwrap_err();
        assert!(matches!(
            err,
            BuildError::UnknownTarget { ref name, parent: Some(ref p) } if name == "ghost" && p == "a"
        ));
    }

    #[test]
    fn test_broken_graph_elsewhere_fails_fast() {
        let (targets, order) = graph(&[
            ("ok", &[]),
            ("bad", &["worse"]),
            ("worse", &["bad"]),
        ]);
        assert!(matches!(
            resolve(&targets, &order, "ok"),
            Err(BuildError::CircularDependency { .. })
        ));
    }

    #[test]
    fn test_resolution_is_repeatable() {
        let (targets, order) = graph(&[
            ("a", &[]),
            ("b", &["a"]),
            ("c", &["a", "b"]),
        ]);
        let first = names(&resolve(&targets, &order, "c").unwrap())
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();
        let second = names(&resolve(&targets, &order, "c").unwrap())
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();
        assert_eq!(first, second);
    }
}
