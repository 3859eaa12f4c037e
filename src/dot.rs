//! Diagram to DOT (Graphviz) conversion.
//!
//! The generated DOT output follows these conventions:
//! - **Terminal nodes** are squares at the bottom (sink rank). BDDs show
//!   `0` and `1`, ZDDs show the empty family `0` and the base `1`, ADDs show
//!   one square per leaf value.
//! - **Internal nodes** are circles, grouped by level and labeled with the
//!   variable name if one was set, `x<i>` otherwise.
//! - **Edges**: solid for then-branches, dashed for else-branches, dotted
//!   with a hollow circle for complemented BDD edges.
//! - **Roots** are rectangles at the top (source rank), labeled with the
//!   names given by the caller.
//!
//! # Examples
//!
//! ```
//! use dd_rs::manager::Manager;
//!
//! let mgr = Manager::new(2, 0, None);
//! let f = mgr.and(&mgr.var(0).unwrap(), &mgr.var(1).unwrap()).unwrap();
//! let dot = mgr.to_dot(&[&f], &["f"]).unwrap();
//! assert!(dot.starts_with("digraph {"));
//! // Write to a file and render with: dot -Tpng output.dot -o output.png
//! ```

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::error::{DdError, DdResult};
use crate::handle::{reachable, Diagram, DiagramKind};
use crate::manager::{Core, Manager};
use crate::reference::Ref;
use crate::table::BDD_ONE;
use crate::types::{Kind, Level, NodeId};

/// Configuration options for DOT output generation.
///
/// ```
/// use dd_rs::dot::DotConfig;
///
/// let config = DotConfig {
///     node_shape: "ellipse",
///     ..DotConfig::default()
/// };
/// assert!(config.use_html_labels);
/// ```
#[derive(Debug, Clone)]
pub struct DotConfig {
    /// Shape for internal nodes (default: "circle")
    pub node_shape: &'static str,
    /// Shape for terminal nodes (default: "square")
    pub terminal_shape: &'static str,
    /// Shape for root nodes (default: "rect")
    pub root_shape: &'static str,
    /// Style for then-edges (default: "solid")
    pub high_edge_style: &'static str,
    /// Style for else-edges (default: "dashed")
    pub low_edge_style: &'static str,
    /// Style for complemented edges (default: "dotted")
    pub negated_edge_style: &'static str,
    /// Whether unnamed variables get subscripts (default: true)
    pub use_html_labels: bool,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            node_shape: "circle",
            terminal_shape: "square",
            root_shape: "rect",
            high_edge_style: "solid",
            low_edge_style: "dashed",
            negated_edge_style: "dotted",
            use_html_labels: true,
        }
    }
}

/// DOT identifier of the node an edge points to. Complemented edges into a
/// BDD terminal go straight to `0`.
fn target(kind: Kind, r: Ref) -> String {
    if kind == Kind::Bdd && r.id() == BDD_ONE.id() {
        if r.is_negated() { "0".to_string() } else { "1".to_string() }
    } else {
        format!("n{}", r.id())
    }
}

fn edge_attrs(kind: Kind, r: Ref, style: &str, config: &DotConfig) -> String {
    if kind == Kind::Bdd && r.is_negated() && r.id() != BDD_ONE.id() {
        format!("style={}, arrowhead=odot", config.negated_edge_style)
    } else {
        format!("style={}", style)
    }
}

impl Core {
    fn render_dot(&self, kind: Kind, roots: &[Ref], names: &[&str], config: &DotConfig) -> Result<String, std::fmt::Error> {
        let mut ids: Vec<NodeId> = reachable(self, kind, roots.iter().copied()).into_iter().collect();
        ids.sort();

        let table = self.forest(kind).table.borrow();
        let var_names = self.space(kind.space()).names.borrow();

        let mut dot = String::new();
        writeln!(dot, "digraph {{")?;
        writeln!(dot, "node [shape={}];", config.node_shape)?;

        writeln!(dot, "{{ rank=sink;")?;
        match kind {
            Kind::Bdd => {
                writeln!(dot, "0 [shape={}, label=\"0\"];", config.terminal_shape)?;
                writeln!(dot, "1 [shape={}, label=\"1\"];", config.terminal_shape)?;
            }
            Kind::Add | Kind::Zdd => {
                for &id in ids.iter().filter(|&&id| table.node(id).is_terminal()) {
                    let label = match table.value(Ref::positive(id)) {
                        Some(value) => value.to_string(),
                        None => id.to_string(),
                    };
                    writeln!(dot, "n{} [shape={}, label=\"{}\"];", id, config.terminal_shape, label)?;
                }
            }
        }
        writeln!(dot, "}}")?;

        // Internal nodes grouped by level, so that Graphviz ranks them together.
        let mut levels = BTreeMap::<Level, Vec<NodeId>>::new();
        for &id in ids.iter().filter(|&&id| !table.node(id).is_terminal()) {
            let var = table.node(id).var;
            levels.entry(self.var_level(kind.space(), var)).or_default().push(id);
        }
        for level in levels.values() {
            writeln!(dot, "{{ rank=same;")?;
            for &id in level {
                let var = table.node(id).var;
                let label = match var_names.get(var.as_usize()).and_then(|n| n.as_deref()) {
                    Some(name) => format!("\"{}\"", name),
                    None if config.use_html_labels => format!("<x<SUB>{}</SUB>>", var.index()),
                    None => format!("\"{}\"", var),
                };
                writeln!(dot, "n{} [label={}];", id, label)?;
            }
            writeln!(dot, "}}")?;
        }

        for level in levels.values() {
            for &id in level {
                let node = table.node(id);
                writeln!(dot, "n{} -> {} [{}];", id, target(kind, node.high), edge_attrs(kind, node.high, config.high_edge_style, config))?;
                writeln!(dot, "n{} -> {} [{}];", id, target(kind, node.low), edge_attrs(kind, node.low, config.low_edge_style, config))?;
            }
        }

        writeln!(dot, "{{ rank=source;")?;
        for (i, _) in roots.iter().enumerate() {
            let name = names.get(i).map(|s| s.to_string()).unwrap_or_else(|| format!("f{}", i));
            writeln!(dot, "r{} [shape={}, label=\"{}\"];", i, config.root_shape, name)?;
        }
        writeln!(dot, "}}")?;
        for (i, &root) in roots.iter().enumerate() {
            writeln!(dot, "r{} -> {} [{}];", i, target(kind, root), edge_attrs(kind, root, "solid", config))?;
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }
}

impl Manager {
    /// Renders the diagrams rooted at `roots` as one DOT graph. Shared nodes
    /// appear once. `names` labels the roots; missing names become `f<i>`.
    pub fn to_dot<K: DiagramKind>(&self, roots: &[&Diagram<K>], names: &[&str]) -> DdResult<String> {
        self.to_dot_with_config(roots, names, &DotConfig::default())
    }

    /// Like [`Manager::to_dot`], with custom styling.
    pub fn to_dot_with_config<K: DiagramKind>(
        &self,
        roots: &[&Diagram<K>],
        names: &[&str],
        config: &DotConfig,
    ) -> DdResult<String> {
        let refs = roots.iter().map(|f| self.check(*f)).collect::<DdResult<Vec<Ref>>>()?;
        self.query(|core| {
            core.render_dot(K::KIND, &refs, names, config)
                .map_err(|e| DdError::invalid(format!("cannot render DOT: {}", e)))
        })
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::types::Var;

    #[test]
    fn test_to_dot_basic() {
        let mgr = Manager::new(3, 0, None);
        let f = mgr.cube(&[Var::new(0).neg(), Var::new(1).pos(), Var::new(2).pos()]).unwrap();
        let dot = mgr.to_dot(&[&f], &["f"]).unwrap();
        assert!(dot.starts_with("digraph {"));
        assert!(dot.ends_with("}\n"));
        assert!(dot.contains("label=\"f\""));
        assert_eq!(dot.matches("<x<SUB>").count(), 3);
    }

    #[test]
    fn test_to_dot_shares_nodes_between_roots() {
        let mgr = Manager::new(2, 0, None);
        let x = mgr.var(0).unwrap();
        let y = mgr.var(1).unwrap();
        let and = mgr.and(&x, &y).unwrap();
        let nand = !&and;
        let dot = mgr.to_dot(&[&and, &nand, &mgr.zero()], &["and", "nand"]).unwrap();
        assert_eq!(dot.matches("<x<SUB>").count(), 2);
        assert!(dot.contains("label=\"f2\""));
        assert!(dot.contains("arrowhead=odot"));
        assert!(dot.contains("r2 -> 0"));
    }

    #[test]
    fn test_to_dot_variable_names() {
        let mgr = Manager::new(1, 0, None);
        mgr.set_var_name(Var::new(0), "req").unwrap();
        let x = mgr.var(0).unwrap();
        let config = DotConfig {
            use_html_labels: false,
            ..DotConfig::default()
        };
        let dot = mgr.to_dot_with_config(&[&x], &[], &config).unwrap();
        assert!(dot.contains("label=\"req\""));
    }

    #[test]
    fn test_to_dot_add_leaves() {
        let mgr = Manager::new(1, 0, None);
        let x = mgr.add_var(0).unwrap();
        let c = mgr.add_const(2.5).unwrap();
        let f = mgr.add_times(&x, &c).unwrap();
        let dot = mgr.to_dot(&[&f], &["f"]).unwrap();
        assert!(dot.contains("label=\"2.5\""));
        assert!(dot.contains("label=\"0\""));
    }

    #[test]
    fn test_to_dot_zdd() {
        let mgr = Manager::new(0, 2, None);
        let f = mgr.zdd_from_sets(&[vec![Var::new(0)], vec![Var::new(1)]]).unwrap();
        let dot = mgr.to_dot(&[&f], &["family"]).unwrap();
        assert_eq!(dot.matches("<x<SUB>").count(), 2);
        assert!(dot.contains("label=\"family\""));
    }

    #[test]
    fn test_to_dot_rejects_foreign_handles() {
        let a = Manager::new(1, 0, None);
        let b = Manager::new(1, 0, None);
        let x = b.var(0).unwrap();
        assert_eq!(a.to_dot(&[&x], &[]), Err(DdError::CrossManager));
    }
}
