use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Node-link description of a cycle: metabolites as nodes, pathway steps as edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleNetwork {
    #[serde(default = "default_directed")]
    pub directed: bool,
    #[serde(default)]
    pub nodes: Vec<NetworkNode>,
    pub edges: Vec<NetworkEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkNode {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub hmm: Option<String>,
}

fn default_directed() -> bool {
    true
}

pub fn load_network(path: &Path) -> Result<CycleNetwork> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read cycle network {}", path.display()))?;
    parse_network(&content).with_context(|| format!("invalid cycle network {}", path.display()))
}

pub fn parse_network(content: &str) -> Result<CycleNetwork> {
    let mut network: CycleNetwork = serde_json::from_str(content)?;
    // Edge endpoints missing from the node list are added in first-seen order.
    let mut known: Vec<String> = network.nodes.iter().map(|n| n.id.clone()).collect();
    for edge in &network.edges {
        if edge.id.trim().is_empty() {
            bail!("edge {} -> {} has an empty id", edge.source, edge.target);
        }
        for endpoint in [&edge.source, &edge.target] {
            if !known.contains(endpoint) {
                known.push(endpoint.clone());
                network.nodes.push(NetworkNode {
                    id: endpoint.clone(),
                });
            }
        }
    }
    Ok(network)
}
