use std::collections::{BTreeMap, BTreeSet, HashMap};

use thiserror::Error;

use crate::dot::{escape_label, DotContext, DotRanked, Dotter};

#[derive(Debug, Error)]
pub enum GraphError {
    /// An edge names a vertex that is not (or no longer) part of the graph.
    #[error("edge references missing vertex: \"{from}\" -> \"{to}\"")]
    MissingVertex { from: String, to: String },

    /// A walk callback asked for the traversal to stop.
    #[error("walk aborted at \"{vertex}\": {message}")]
    WalkAborted { vertex: String, message: String },
}

/// A graph vertex. Identity is the stable display name; optional behaviors
/// are exposed through the capability accessors, which a concrete vertex
/// type may or may not override.
pub trait Vertex {
    fn name(&self) -> &str;

    /// Text-rendering capability. `None` means the vertex never appears in
    /// rendered output.
    fn as_dotter(&self) -> Option<&dyn Dotter> {
        None
    }

    /// Explicit-rank capability. A vertex reporting rank 0 is a seed for the
    /// reverse traversal; any reported rank overrides traversal depth.
    fn as_ranked(&self) -> Option<&dyn DotRanked> {
        None
    }
}

/// A directed dependency: `from` depends on `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

/// Default vertex used by the parser. Capabilities are driven by its fields:
/// `hidden` drops the rendering capability entirely, `rank` enables the
/// rank override, and `verbose_only` makes the label empty outside verbose
/// renders.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub name: String,
    pub label: String,
    pub rank: Option<usize>,
    pub hidden: bool,
    pub verbose_only: bool,
}

impl GraphNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            label: name.to_string(),
            rank: None,
            hidden: false,
            verbose_only: false,
        }
    }
}

impl Vertex for GraphNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_dotter(&self) -> Option<&dyn Dotter> {
        if self.hidden {
            None
        } else {
            Some(self)
        }
    }

    fn as_ranked(&self) -> Option<&dyn DotRanked> {
        self.rank.map(|_| self as &dyn DotRanked)
    }
}

impl Dotter for GraphNode {
    fn dot(&self, name: &str, ctx: &DotContext<'_>) -> String {
        if self.verbose_only && !ctx.opts.verbose {
            return String::new();
        }
        format!("\"{}\" [label = \"{}\"];", name, escape_label(&self.label))
    }
}

impl DotRanked for GraphNode {
    fn dot_rank(&self) -> usize {
        self.rank.unwrap_or(0)
    }
}

/// Directed dependency graph over trait-object vertices. Vertices are keyed
/// by name in a `BTreeMap`, so enumeration order is deterministic no matter
/// the insertion order.
#[derive(Default)]
pub struct Graph {
    vertices: BTreeMap<String, Box<dyn Vertex>>,
    edges: Vec<Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a vertex, replacing any existing vertex with the same name.
    pub fn add(&mut self, vertex: Box<dyn Vertex>) {
        self.vertices.insert(vertex.name().to_string(), vertex);
    }

    /// Removes a vertex. Edges mentioning it are kept; a later walk across
    /// one of them fails the consistency check.
    pub fn remove(&mut self, name: &str) {
        self.vertices.remove(name);
    }

    /// Records the dependency `from -> to`.
    pub fn connect(&mut self, from: &str, to: &str) {
        self.edges.push(Edge {
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    pub fn vertex(&self, name: &str) -> Option<&dyn Vertex> {
        self.vertices.get(name).map(|v| &**v)
    }

    /// All vertices in name order.
    pub fn vertices(&self) -> impl Iterator<Item = &dyn Vertex> {
        self.vertices.values().map(|v| &**v)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Outgoing dependency targets of `name`, sorted and deduplicated.
    pub fn down_edges(&self, name: &str) -> Vec<&str> {
        let targets: BTreeSet<&str> = self
            .edges
            .iter()
            .filter(|edge| edge.from == name)
            .map(|edge| edge.to.as_str())
            .collect();
        targets.into_iter().collect()
    }

    /// Depth-first walk from `seeds` following reverse dependency edges
    /// ("is depended upon by"). The callback receives each reached vertex
    /// with its depth; when a vertex turns out to be reachable through a
    /// shorter path the callback fires again with the smaller depth, so the
    /// last invocation per vertex always carries its distance from the
    /// nearest seed regardless of expansion order.
    ///
    /// Fails when an edge on the walk names a vertex that is not in the
    /// graph, or when the callback itself fails; either aborts the walk.
    pub fn reverse_depth_first_walk<'g, F>(
        &'g self,
        seeds: &[&'g str],
        mut visit: F,
    ) -> Result<(), GraphError>
    where
        F: FnMut(&str, usize) -> Result<(), GraphError>,
    {
        let mut up: HashMap<&str, BTreeSet<&str>> = HashMap::new();
        for edge in &self.edges {
            up.entry(edge.to.as_str())
                .or_default()
                .insert(edge.from.as_str());
        }

        let mut best: HashMap<&'g str, usize> = HashMap::new();
        let mut stack: Vec<(&'g str, usize)> = seeds.iter().map(|s| (*s, 0)).collect();

        while let Some((name, depth)) = stack.pop() {
            if best.get(name).is_some_and(|&seen| seen <= depth) {
                continue;
            }
            best.insert(name, depth);
            visit(name, depth)?;

            if let Some(dependents) = up.get(name) {
                for &dependent in dependents {
                    if !self.vertices.contains_key(dependent) {
                        return Err(GraphError::MissingVertex {
                            from: dependent.to_string(),
                            to: name.to_string(),
                        });
                    }
                    stack.push((dependent, depth + 1));
                }
            }
        }

        Ok(())
    }

    /// Strongly connected components of size two or more, in deterministic
    /// order. Each component is listed in depth-first discovery order, so
    /// consecutive entries (wrapping at the end) are joined by dependency
    /// edges.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let names: Vec<&str> = self.vertices.keys().map(String::as_str).collect();
        let index_of: HashMap<&str, usize> = names
            .iter()
            .enumerate()
            .map(|(idx, name)| (*name, idx))
            .collect();

        let mut adj: Vec<Vec<usize>> = vec![Vec::new(); names.len()];
        for edge in &self.edges {
            if let (Some(&from), Some(&to)) = (
                index_of.get(edge.from.as_str()),
                index_of.get(edge.to.as_str()),
            ) {
                adj[from].push(to);
            }
        }
        for list in &mut adj {
            list.sort_unstable();
            list.dedup();
        }

        let n = names.len();
        let mut index = vec![usize::MAX; n];
        let mut low = vec![0usize; n];
        let mut on_stack = vec![false; n];
        let mut stack: Vec<usize> = Vec::new();
        let mut call: Vec<(usize, usize)> = Vec::new();
        let mut next_index = 0usize;
        let mut components: Vec<Vec<usize>> = Vec::new();

        for root in 0..n {
            if index[root] != usize::MAX {
                continue;
            }
            index[root] = next_index;
            low[root] = next_index;
            next_index += 1;
            stack.push(root);
            on_stack[root] = true;
            call.push((root, 0));

            while let Some(frame) = call.last_mut() {
                let v = frame.0;
                if frame.1 < adj[v].len() {
                    let w = adj[v][frame.1];
                    frame.1 += 1;
                    if index[w] == usize::MAX {
                        index[w] = next_index;
                        low[w] = next_index;
                        next_index += 1;
                        stack.push(w);
                        on_stack[w] = true;
                        call.push((w, 0));
                    } else if on_stack[w] {
                        low[v] = low[v].min(index[w]);
                    }
                } else {
                    call.pop();
                    if let Some(parent) = call.last() {
                        low[parent.0] = low[parent.0].min(low[v]);
                    }
                    if low[v] == index[v] {
                        let mut component = Vec::new();
                        while let Some(w) = stack.pop() {
                            on_stack[w] = false;
                            component.push(w);
                            if w == v {
                                break;
                            }
                        }
                        if component.len() > 1 {
                            component.reverse();
                            components.push(component);
                        }
                    }
                }
            }
        }

        components
            .into_iter()
            .map(|component| {
                component
                    .into_iter()
                    .map(|idx| names[idx].to_string())
                    .collect()
            })
            .collect()
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("vertices", &self.vertices.keys().collect::<Vec<_>>())
            .field("edges", &self.edges)
            .finish()
    }
}
