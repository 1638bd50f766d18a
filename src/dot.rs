//! Graphviz DOT rendering of a dependency graph.
//!
//! Rendering runs in three phases over one shared [`DotContext`]: rank
//! assignment (reverse depth-first walk from the rank-0 seeds), tier-by-tier
//! emission of `subgraph rankN` blocks with their edges, and an optional
//! cycle overlay that re-draws each cycle's wrap-around edges in a
//! highlight color. Output is deterministic: tier members and edge targets
//! are sorted by vertex name, cycle edges are sorted within each cycle.

use std::collections::{BTreeMap, HashMap};

use crate::graph::{Graph, GraphError};
use crate::theme::Theme;

/// Text-rendering capability. The returned string may span multiple lines,
/// each emitted as one indented statement inside the vertex's tier block.
/// An empty string excludes the vertex from the entire render.
pub trait Dotter {
    fn dot(&self, name: &str, ctx: &DotContext<'_>) -> String;
}

/// Explicit-rank capability; the reported rank replaces traversal depth.
pub trait DotRanked {
    fn dot_rank(&self) -> usize;
}

/// Options for a single render.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotOpts {
    /// Passed through to vertices that only show themselves in verbose
    /// renders; the renderer itself never interprets it.
    pub verbose: bool,

    /// Re-draw cycle edges with highlight styling after the tier blocks.
    pub draw_cycles: bool,
}

/// Read-only state shared by all render phases and handed to every
/// vertex's [`Dotter::dot`] call.
pub struct DotContext<'a> {
    pub opts: &'a DotOpts,
    pub cycles: &'a [Vec<String>],
}

pub(crate) struct RankAssignment {
    /// Final rank per renderable vertex.
    pub ranks: HashMap<String, usize>,
    /// Rank -> members sorted by name.
    pub buckets: BTreeMap<usize, Vec<String>>,
}

/// Walks the graph backward from the rank-0 seeds and assigns each
/// reachable, renderable vertex its rank: distance from the nearest seed,
/// unless the vertex overrides it. Vertices without a rendering capability
/// or with an empty label are left out of the mapping but do not stop the
/// walk from continuing past them.
pub(crate) fn assign_ranks(
    graph: &Graph,
    ctx: &DotContext<'_>,
) -> Result<RankAssignment, GraphError> {
    let seeds: Vec<&str> = graph
        .vertices()
        .filter(|v| v.as_ranked().is_some_and(|r| r.dot_rank() == 0))
        .map(|v| v.name())
        .collect();

    let mut ranks: HashMap<String, usize> = HashMap::new();
    graph.reverse_depth_first_walk(&seeds, |name, depth| {
        let Some(vertex) = graph.vertex(name) else {
            return Ok(());
        };
        let Some(dotter) = vertex.as_dotter() else {
            return Ok(());
        };
        if dotter.dot(name, ctx).is_empty() {
            return Ok(());
        }

        let rank = match vertex.as_ranked() {
            Some(ranked) => ranked.dot_rank(),
            None => depth,
        };
        ranks.insert(name.to_string(), rank);
        Ok(())
    })?;

    let mut buckets: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    for (name, rank) in &ranks {
        buckets.entry(*rank).or_default().push(name.clone());
    }
    for members in buckets.values_mut() {
        members.sort_unstable();
    }

    Ok(RankAssignment { ranks, buckets })
}

/// Renders `graph` as a Graphviz DOT document.
///
/// Tier blocks are emitted in ascending rank order starting at 0 and stop
/// at the first rank with no members; rank 0 carries `rank = sink`, every
/// other tier `rank = same`. Edges follow their source tier's block and
/// only point at vertices that passed the renderable filter. Fails only
/// when the traversal fails, returning no partial output.
pub fn render_dot(graph: &Graph, opts: &DotOpts, theme: &Theme) -> Result<String, GraphError> {
    let mut buf = String::new();
    buf.push_str("digraph {\n");
    buf.push_str("\tcompound = true;\n");

    let cycles = graph.cycles();
    let ctx = DotContext {
        opts,
        cycles: &cycles,
    };

    let assignment = assign_ranks(graph, &ctx)?;

    let mut rank = 0usize;
    while let Some(members) = assignment.buckets.get(&rank) {
        buf.push_str(&format!("\tsubgraph rank{rank} {{\n"));
        if rank == 0 {
            buf.push_str("\t\trank = sink;\n");
        } else {
            buf.push_str("\t\trank = same;\n");
        }

        for name in members {
            let Some(dotter) = graph.vertex(name).and_then(|v| v.as_dotter()) else {
                continue;
            };
            for line in dotter.dot(name, &ctx).lines() {
                buf.push_str("\t\t");
                buf.push_str(line);
                buf.push('\n');
            }
        }

        // Edges must come outside the rank block.
        buf.push_str("\t}\n");

        for name in members {
            for target in graph.down_edges(name) {
                if !assignment.ranks.contains_key(target) {
                    continue;
                }
                buf.push_str(&format!("\t\"{name}\" -> \"{target}\";\n"));
            }
        }

        rank += 1;
    }

    if opts.draw_cycles && !theme.cycle_palette.is_empty() {
        for (idx, cycle) in ctx.cycles.iter().enumerate() {
            let color = &theme.cycle_palette[idx % theme.cycle_palette.len()];
            let mut cycle_edges = Vec::with_capacity(cycle.len());
            for (pos, from) in cycle.iter().enumerate() {
                // The last edge wraps back to the start of the cycle.
                let to = &cycle[(pos + 1) % cycle.len()];
                cycle_edges.push(format!(
                    "\t\"{from}\" -> \"{to}\" [color={color}, penwidth={:.1}];\n",
                    theme.cycle_penwidth
                ));
            }
            cycle_edges.sort_unstable();
            for edge in cycle_edges {
                buf.push_str(&edge);
            }
        }
    }

    buf.push_str("}\n");
    Ok(buf)
}

/// Escapes a string for use inside a double-quoted DOT attribute value.
pub fn escape_label(label: &str) -> String {
    label
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
