//! GraphML writer for cycle graphs.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use anyhow::Result;

use crate::annot::network::{AttrValue, CycleGraph};
use crate::io::write_atomic;

pub fn write_graphml(path: &Path, graph: &CycleGraph) -> Result<()> {
    write_atomic(path, |w| {
        w.write_all(render_graphml(graph).as_bytes())?;
        Ok(())
    })
}

fn attr_type(value: &AttrValue) -> &'static str {
    match value {
        AttrValue::Str(_) => "string",
        AttrValue::Int(_) => "long",
        AttrValue::Float(_) => "double",
    }
}

fn attr_text(value: &AttrValue) -> String {
    match value {
        AttrValue::Str(s) => xml_escape(s),
        AttrValue::Int(i) => i.to_string(),
        AttrValue::Float(f) => format!("{:.6}", f),
    }
}

pub fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Keys are declared once per (domain, name); the first value seen sets the type.
fn collect_keys(graph: &CycleGraph) -> BTreeMap<(&'static str, String), (String, &'static str)> {
    let mut specs: BTreeMap<(&'static str, String), &'static str> = BTreeMap::new();
    for node in &graph.nodes {
        for (name, value) in &node.attrs {
            specs
                .entry(("node", name.clone()))
                .or_insert_with(|| attr_type(value));
        }
    }
    for edge in &graph.edges {
        for (name, value) in &edge.attrs {
            specs
                .entry(("edge", name.clone()))
                .or_insert_with(|| attr_type(value));
        }
    }
    specs
        .into_iter()
        .enumerate()
        .map(|(i, (key, ty))| (key, (format!("d{}", i), ty)))
        .collect()
}

pub fn render_graphml(graph: &CycleGraph) -> String {
    let keys = collect_keys(graph);
    let mut out = String::new();
    out.push_str("<?xml version='1.0' encoding='utf-8'?>\n");
    out.push_str(
        "<graphml xmlns=\"http://graphml.graphdrawing.org/xmlns\" \
         xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" \
         xsi:schemaLocation=\"http://graphml.graphdrawing.org/xmlns \
         http://graphml.graphdrawing.org/xmlns/1.0/graphml.xsd\">\n",
    );
    for ((domain, name), (id, ty)) in &keys {
        out.push_str(&format!(
            "  <key id=\"{}\" for=\"{}\" attr.name=\"{}\" attr.type=\"{}\" />\n",
            id,
            domain,
            xml_escape(name),
            ty
        ));
    }
    let edgedefault = if graph.directed { "directed" } else { "undirected" };
    out.push_str(&format!("  <graph edgedefault=\"{}\">\n", edgedefault));

    for node in &graph.nodes {
        if node.attrs.is_empty() {
            out.push_str(&format!("    <node id=\"{}\" />\n", xml_escape(&node.id)));
            continue;
        }
        out.push_str(&format!("    <node id=\"{}\">\n", xml_escape(&node.id)));
        for (name, value) in &node.attrs {
            let (id, _) = &keys[&("node", name.clone())];
            out.push_str(&format!(
                "      <data key=\"{}\">{}</data>\n",
                id,
                attr_text(value)
            ));
        }
        out.push_str("    </node>\n");
    }

    for edge in &graph.edges {
        let open = format!(
            "    <edge source=\"{}\" target=\"{}\"",
            xml_escape(&edge.source),
            xml_escape(&edge.target)
        );
        if edge.attrs.is_empty() {
            out.push_str(&open);
            out.push_str(" />\n");
            continue;
        }
        out.push_str(&open);
        out.push_str(">\n");
        for (name, value) in &edge.attrs {
            let (id, _) = &keys[&("edge", name.clone())];
            out.push_str(&format!(
                "      <data key=\"{}\">{}</data>\n",
                id,
                attr_text(value)
            ));
        }
        out.push_str("    </edge>\n");
    }

    out.push_str("  </graph>\n</graphml>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annot::CohortAggregate;
    use crate::annot::network::{bipartite_graph, coverage_graph};
    use crate::db::parse_network;

    fn network() -> crate::db::CycleNetwork {
        parse_network(
            r#"{"edges": [{"id": "S & N <coupling>", "source": "H2S", "target": "SO4", "hmm": "dsrA.hmm"}]}"#,
        )
        .unwrap()
    }

    #[test]
    fn escapes_ids_and_declares_keys() {
        let totals = vec![CohortAggregate {
            name: "S & N <coupling>".to_string(),
            count: 1,
            coverage: 1.0,
        }];
        let xml = render_graphml(&coverage_graph(&network(), &totals));
        assert!(xml.contains("<graph edgedefault=\"directed\">"));
        assert!(xml.contains("attr.name=\"weight\" attr.type=\"double\""));
        assert!(xml.contains(">S &amp; N &lt;coupling&gt;</data>"));
        assert!(xml.contains(">1.000000</data>"));
        assert!(xml.contains("<node id=\"H2S\" />"));
    }

    #[test]
    fn bipartite_types() {
        let xml = render_graphml(&bipartite_graph(&network(), &[]));
        assert!(xml.contains("for=\"node\" attr.name=\"type\" attr.type=\"string\""));
        assert!(xml.contains(">metabolite</data>"));
        assert!(xml.contains(">function</data>"));
        assert!(xml.contains("<edge source=\"H2S\" target=\"S &amp; N &lt;coupling&gt;\" />"));
    }
}
