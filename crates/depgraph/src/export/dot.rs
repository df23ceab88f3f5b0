//! DOT format export for Graphviz visualization.
//!
//! Projects become nodes labelled with their coordinate; relationships become
//! edges labelled with their type.

use crate::model::{ProjectVersionRef, Relationship, RelationshipType};
use std::collections::{BTreeSet, HashMap};
use std::fmt::Write;

/// Options for styling DOT export
#[derive(Debug, Clone)]
pub struct DotOptions {
    /// Edge colors by relationship type (hex color codes)
    pub edge_colors: HashMap<RelationshipType, String>,
    /// Fill color of root projects
    pub root_color: String,
    /// Fill color of other projects
    pub node_color: String,
    /// Graph layout direction: LR, TB, RL, BT
    pub rankdir: String,
    /// Draw managed relationships dashed
    pub dash_managed: bool,
}

impl Default for DotOptions {
    fn default() -> Self {
        let mut edge_colors = HashMap::new();
        edge_colors.insert(RelationshipType::Parent, "#6D4C41".to_string());
        edge_colors.insert(RelationshipType::Bom, "#8E24AA".to_string());
        edge_colors.insert(RelationshipType::Dependency, "#1E88E5".to_string());
        edge_colors.insert(RelationshipType::Plugin, "#43A047".to_string());
        edge_colors.insert(RelationshipType::PluginDependency, "#7CB342".to_string());
        edge_colors.insert(RelationshipType::Extension, "#FB8C00".to_string());

        DotOptions {
            edge_colors,
            root_color: "#FFE082".to_string(),
            node_color: "#E0E0E0".to_string(),
            rankdir: "LR".to_string(),
            dash_managed: true,
        }
    }
}

/// Render relationships as a Graphviz digraph.
pub fn export_dot(relationships: &[Relationship], roots: &BTreeSet<ProjectVersionRef>) -> String {
    export_dot_styled(relationships, roots, &DotOptions::default())
}

/// Render relationships as a Graphviz digraph with custom styling.
pub fn export_dot_styled(
    relationships: &[Relationship],
    roots: &BTreeSet<ProjectVersionRef>,
    options: &DotOptions,
) -> String {
    let mut projects: BTreeSet<&ProjectVersionRef> = roots.iter().collect();
    for rel in relationships {
        projects.insert(rel.declaring());
        projects.insert(rel.target());
    }
    let ids: HashMap<&ProjectVersionRef, usize> =
        projects.iter().enumerate().map(|(i, p)| (*p, i)).collect();

    let mut output = String::new();
    output.push_str("digraph relationship_graph {\n");
    let _ = writeln!(output, "    rankdir={};", options.rankdir);
    output.push_str("    node [shape=box, style=filled];\n\n");

    for (project, id) in projects.iter().zip(0..) {
        let color = if roots.contains(*project) {
            &options.root_color
        } else {
            &options.node_color
        };
        let _ = writeln!(
            output,
            "    n{id} [label=\"{}\", fillcolor=\"{color}\"];",
            escape_dot_label(&project.to_string())
        );
    }

    output.push('\n');

    for rel in relationships {
        let (Some(from), Some(to)) = (ids.get(rel.declaring()), ids.get(rel.target())) else {
            continue;
        };
        let color = options
            .edge_colors
            .get(&rel.kind())
            .map(|c| format!(", color=\"{c}\""))
            .unwrap_or_default();
        let style = if rel.is_managed() && options.dash_managed {
            ", style=dashed"
        } else {
            ""
        };
        let _ = writeln!(
            output,
            "    n{from} -> n{to} [label=\"{}\"{color}{style}];",
            rel.kind()
        );
    }

    output.push_str("}\n");
    output
}

/// Escape special characters for DOT labels
fn escape_dot_label(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
