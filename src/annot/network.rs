//! Network/Diagram Assembler: the cycle network annotated with cohort coverage.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::annot::CohortAggregate;
use crate::annot::abundance::{AbundanceTable, WeightedMatrix};
use crate::db::CycleNetwork;

pub const NODE_METABOLITE: &str = "metabolite";
pub const NODE_FUNCTION: &str = "function";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Float(f64),
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(flatten)]
    pub attrs: BTreeMap<String, AttrValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(flatten)]
    pub attrs: BTreeMap<String, AttrValue>,
}

/// Serializes as node-link JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleGraph {
    pub directed: bool,
    pub multigraph: bool,
    pub graph: BTreeMap<String, AttrValue>,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl CycleGraph {
    fn new(directed: bool) -> Self {
        Self {
            directed,
            multigraph: false,
            graph: BTreeMap::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    fn add_node(&mut self, id: &str, kind: Option<&str>) {
        if self.nodes.iter().any(|n| n.id == id) {
            return;
        }
        let mut attrs = BTreeMap::new();
        if let Some(kind) = kind {
            attrs.insert("type".to_string(), AttrValue::from(kind));
        }
        self.nodes.push(GraphNode {
            id: id.to_string(),
            attrs,
        });
    }

    fn add_edge(&mut self, source: &str, target: &str, attrs: BTreeMap<String, AttrValue>) {
        if self
            .edges
            .iter()
            .any(|e| e.source == source && e.target == target)
        {
            return;
        }
        self.edges.push(GraphEdge {
            source: source.to_string(),
            target: target.to_string(),
            attrs,
        });
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Network edge ids with no aggregate row, sorted and unique; they are drawn
/// with zero coverage.
pub fn missing_pathways(network: &CycleNetwork, totals: &[CohortAggregate]) -> Vec<String> {
    network
        .edges
        .iter()
        .filter(|e| !totals.iter().any(|t| t.name == e.id))
        .map(|e| e.id.clone())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}

fn coverage_of(totals: &[CohortAggregate], pathway: &str) -> (usize, f64) {
    totals
        .iter()
        .find(|t| t.name == pathway)
        .map_or((0, 0.0), |t| (t.count, t.coverage))
}

fn coverage_attrs(pathway: &str, totals: &[CohortAggregate]) -> BTreeMap<String, AttrValue> {
    let (count, coverage) = coverage_of(totals, pathway);
    let mut attrs = BTreeMap::new();
    attrs.insert("id".to_string(), AttrValue::from(pathway));
    attrs.insert("count".to_string(), AttrValue::Int(count as i64));
    attrs.insert("weight".to_string(), AttrValue::Float(coverage));
    attrs
}

/// Metabolites as nodes, one edge per pathway step with its cohort coverage.
/// Repeated source/target pairs keep the first edge.
pub fn coverage_graph(network: &CycleNetwork, totals: &[CohortAggregate]) -> CycleGraph {
    let mut graph = CycleGraph::new(network.directed);
    for node in &network.nodes {
        graph.add_node(&node.id, None);
    }
    for edge in &network.edges {
        graph.add_edge(&edge.source, &edge.target, coverage_attrs(&edge.id, totals));
    }
    graph
}

/// Metabolite and function nodes; every pathway step becomes
/// `source -> function -> target`.
pub fn bipartite_graph(network: &CycleNetwork, totals: &[CohortAggregate]) -> CycleGraph {
    let mut graph = CycleGraph::new(true);
    for node in &network.nodes {
        graph.add_node(&node.id, Some(NODE_METABOLITE));
    }
    for edge in &network.edges {
        if graph.node(&edge.id).is_none() {
            graph.add_node(&edge.id, Some(NODE_FUNCTION));
            let (count, coverage) = coverage_of(totals, &edge.id);
            if let Some(node) = graph.nodes.last_mut() {
                node.attrs
                    .insert("count".to_string(), AttrValue::Int(count as i64));
                node.attrs
                    .insert("coverage".to_string(), AttrValue::Float(coverage));
            }
        }
        graph.add_edge(&edge.source, &edge.id, BTreeMap::new());
        graph.add_edge(&edge.id, &edge.target, BTreeMap::new());
    }
    graph
}

/// Adds one attribute per sample: weighted abundance on function nodes and,
/// when given, raw measurements on metabolite nodes.
pub fn annotate_abundance(
    graph: &mut CycleGraph,
    abundance: &WeightedMatrix,
    measures: Option<&AbundanceTable>,
) {
    for node in &mut graph.nodes {
        let kind = match node.attrs.get("type") {
            Some(AttrValue::Str(kind)) => kind.clone(),
            _ => continue,
        };
        if kind == NODE_FUNCTION {
            let values = abundance.row(&node.id);
            for (s, sample) in abundance.samples.iter().enumerate() {
                let v = values.map_or(0.0, |row| row[s]);
                node.attrs.insert(sample.clone(), AttrValue::Float(v));
            }
        } else if kind == NODE_METABOLITE {
            let Some(measures) = measures else {
                continue;
            };
            if let Some(values) = measures.get(&node.id) {
                for (sample, v) in measures.samples.iter().zip(values) {
                    node.attrs.insert(sample.clone(), AttrValue::Float(*v));
                }
            }
        }
    }
}
