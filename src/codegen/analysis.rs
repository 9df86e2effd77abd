//! Reference Graph Analysis
//!
//! Builds a directed graph of definition -> definition `$ref` edges and
//! computes strongly connected components, so cyclic models can be reported
//! before resolution starts. The report is advisory; resolution terminates
//! on cycles regardless.

use std::collections::HashMap;

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use crate::schema::{ref_key, Schema, SwaggerDocument};

use super::diagnostics::Diagnostics;

/// How one definition points at another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// A property `$ref`
    Property,
    /// An array `items` `$ref`, at any depth
    Items,
    /// An `additionalProperties` value `$ref`
    MapValue,
}

/// A group of definitions that reference each other
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleGroup {
    /// Definition keys, sorted
    pub members: Vec<String>,
    pub is_self_referential: bool,
}

/// Definition reference graph of one document
#[derive(Debug)]
pub struct ReferenceGraph {
    graph: DiGraph<String, EdgeKind>,
    indices: HashMap<String, NodeIndex>,
}

impl ReferenceGraph {
    /// Build the graph; references to missing definitions are skipped
    pub fn from_document(document: &SwaggerDocument) -> Self {
        let count = document.definitions.len();
        let mut graph = DiGraph::with_capacity(count, count * 2);
        let mut indices = HashMap::with_capacity(count);

        for key in document.definitions.keys() {
            indices.insert(key.clone(), graph.add_node(key.clone()));
        }

        for (key, definition) in &document.definitions {
            let mut refs = Vec::new();
            for property in definition.properties.values() {
                collect_refs(property, EdgeKind::Property, &mut refs);
            }
            let from = indices[key];
            for (target, kind) in refs {
                if let Some(&to) = indices.get(ref_key(&target)) {
                    graph.add_edge(from, to, kind);
                }
            }
        }

        Self { graph, indices }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Keys `key` references directly
    pub fn references(&self, key: &str) -> Vec<&str> {
        let Some(&idx) = self.indices.get(key) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .filter_map(|e| self.graph.node_weight(e.target()).map(String::as_str))
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Strongly connected components with more than one member, plus
    /// single definitions that reference themselves. Sorted by first member.
    pub fn cycles(&self) -> Vec<CycleGroup> {
        let mut groups: Vec<CycleGroup> = kosaraju_scc(&self.graph)
            .into_iter()
            .filter_map(|scc| {
                let is_self_referential = scc.len() == 1
                    && self
                        .graph
                        .edges_directed(scc[0], Direction::Outgoing)
                        .any(|e| e.target() == scc[0]);
                if scc.len() < 2 && !is_self_referential {
                    return None;
                }
                let mut members: Vec<String> = scc
                    .iter()
                    .filter_map(|idx| self.graph.node_weight(*idx).cloned())
                    .collect();
                members.sort();
                Some(CycleGroup {
                    members,
                    is_self_referential,
                })
            })
            .collect();
        groups.sort_by(|a, b| a.members.cmp(&b.members));
        groups
    }
}

fn collect_refs(schema: &Schema, kind: EdgeKind, out: &mut Vec<(String, EdgeKind)>) {
    if let Some(reference) = &schema.reference {
        out.push((reference.clone(), kind));
    }
    if let Some(items) = &schema.items {
        collect_refs(items, EdgeKind::Items, out);
    }
    if let Some(values) = schema.additional_properties.as_ref().and_then(|a| a.schema()) {
        collect_refs(values, EdgeKind::MapValue, out);
    }
    for property in schema.properties.values() {
        collect_refs(property, kind, out);
    }
}

/// Record every reference cycle of `document` as an info diagnostic
pub fn report_cycles(document: &SwaggerDocument, diagnostics: &mut Diagnostics) -> Vec<CycleGroup> {
    let cycles = ReferenceGraph::from_document(document).cycles();
    for group in &cycles {
        tracing::debug!(members = ?group.members, "reference cycle");
        diagnostics.reference_cycle(&group.members);
    }
    cycles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::diagnostics::DiagnosticCode;
    use serde_json::json;

    fn document(definitions: serde_json::Value) -> SwaggerDocument {
        let value = json!({ "swagger": "2.0", "definitions": definitions });
        SwaggerDocument::from_str(&value.to_string()).unwrap()
    }

    #[test]
    fn test_acyclic_document() {
        let doc = document(json!({
            "Order": { "properties": { "user": { "$ref": "#/definitions/User" } } },
            "User": { "properties": { "id": { "type": "integer" } } }
        }));
        let graph = ReferenceGraph::from_document(&doc);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.references("Order"), vec!["User"]);
        assert!(graph.cycles().is_empty());
    }

    #[test]
    fn test_mutual_and_self_cycles() {
        let doc = document(json!({
            "Department": { "properties": { "head": { "$ref": "#/definitions/Employee" } } },
            "Employee": {
                "properties": {
                    "department": { "$ref": "#/definitions/Department" }
                }
            },
            "Node": {
                "properties": {
                    "children": { "type": "array", "items": { "$ref": "#/definitions/Node" } }
                }
            },
            "Missing": { "properties": { "x": { "$ref": "#/definitions/Nowhere" } } }
        }));
        let mut diagnostics = Diagnostics::new();
        let cycles = report_cycles(&doc, &mut diagnostics);

        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[0].members, vec!["Department", "Employee"]);
        assert!(!cycles[0].is_self_referential);
        assert_eq!(cycles[1].members, vec!["Node"]);
        assert!(cycles[1].is_self_referential);

        assert_eq!(diagnostics.with_code(DiagnosticCode::ReferenceCycle).count(), 2);
        assert_eq!(diagnostics.warning_count(), 0);
    }

    #[test]
    fn test_map_value_edges() {
        let doc = document(json!({
            "Catalog": {
                "properties": {
                    "byTag": {
                        "type": "object",
                        "additionalProperties": { "$ref": "#/definitions/Tag" }
                    }
                }
            },
            "Tag": {}
        }));
        let graph = ReferenceGraph::from_document(&doc);
        assert_eq!(graph.references("Catalog"), vec!["Tag"]);
    }
}
