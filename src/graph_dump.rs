//! Machine-readable dump of the ranked graph structure: the same rank
//! assignment and edge filtering the DOT renderer uses, serialized as JSON
//! instead of rendered as text.

use crate::dot::{assign_ranks, DotContext, DotOpts};
use crate::graph::{Graph, GraphError};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct GraphDump {
    pub ranks: Vec<RankDump>,
    pub edges: Vec<EdgeDump>,
    pub cycles: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct RankDump {
    pub rank: usize,
    pub nodes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: String,
    pub to: String,
}

impl GraphDump {
    /// Captures tiers, edges and cycles exactly as the DOT renderer would
    /// emit them, including the stop at the first empty rank.
    pub fn from_graph(graph: &Graph, opts: &DotOpts) -> Result<Self, GraphError> {
        let cycles = graph.cycles();
        let ctx = DotContext {
            opts,
            cycles: &cycles,
        };
        let assignment = assign_ranks(graph, &ctx)?;

        let mut ranks = Vec::new();
        let mut edges = Vec::new();
        let mut rank = 0usize;
        while let Some(members) = assignment.buckets.get(&rank) {
            for name in members {
                for target in graph.down_edges(name) {
                    if assignment.ranks.contains_key(target) {
                        edges.push(EdgeDump {
                            from: name.clone(),
                            to: target.to_string(),
                        });
                    }
                }
            }
            ranks.push(RankDump {
                rank,
                nodes: members.clone(),
            });
            rank += 1;
        }

        Ok(GraphDump {
            ranks,
            edges,
            cycles,
        })
    }
}

pub fn write_graph_dump(dump: &GraphDump, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)?;
            let writer = BufWriter::new(file);
            serde_json::to_writer_pretty(writer, dump)?;
        }
        None => {
            let text = serde_json::to_string_pretty(dump)?;
            println!("{text}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_depgraph;

    #[test]
    fn dump_matches_renderer_semantics() {
        let out = parse_depgraph(
            "db [rank=0]\n\
             api -> db\n\
             ghost [hidden]\n\
             ghost -> db\n\
             web -> api\n\
             web -> ghost\n",
        )
        .unwrap();

        let dump = GraphDump::from_graph(&out.graph, &DotOpts::default()).unwrap();
        assert_eq!(dump.ranks.len(), 3);
        assert_eq!(dump.ranks[0].nodes, vec!["db".to_string()]);
        assert_eq!(dump.ranks[1].nodes, vec!["api".to_string()]);
        assert_eq!(dump.ranks[2].nodes, vec!["web".to_string()]);

        // The edge into the hidden vertex is filtered out, like in DOT.
        let pairs: Vec<(String, String)> = dump
            .edges
            .into_iter()
            .map(|edge| (edge.from, edge.to))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("api".to_string(), "db".to_string()),
                ("web".to_string(), "api".to_string())
            ]
        );
        assert!(dump.cycles.is_empty());
    }
}
