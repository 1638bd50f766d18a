//! Parser for the line-oriented `.dep` dependency description format.
//!
//! ```text
//! # comment
//! @init { drawCycles: true }
//! db [rank=0, label="postgres 15"]
//! api -> db
//! "load balancer" -> api
//! ghost [hidden]
//! tracing [verbose]
//! ```
//!
//! A bare name declares a vertex; `from -> to` records a dependency and
//! auto-declares both endpoints. Node attributes: `rank=N`, `label="..."`
//! (supports `\n`, `\"`, `\\` escapes), `hidden` (never rendered) and
//! `verbose` (rendered only in verbose mode). The optional `@init` block is
//! a JSON5 value merged over the loaded configuration.

use crate::graph::{Graph, GraphNode};
use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static INIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^@init\s+(\{.*\})\s*$").unwrap());
static EDGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?P<from>"[^"]*"|[\w./:\-]+)\s*->\s*(?P<to>"[^"]*"|[\w./:\-]+)$"#).unwrap()
});
static NODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?P<name>"[^"]*"|[\w./:\-]+)\s*(?:\[(?P<attrs>.*)\])?$"#).unwrap()
});

#[derive(Debug, Default)]
pub struct ParseOutput {
    pub graph: Graph,
    pub init_config: Option<serde_json::Value>,
}

pub fn parse_depgraph(input: &str) -> Result<ParseOutput> {
    let mut nodes: BTreeMap<String, GraphNode> = BTreeMap::new();
    let mut edges: Vec<(String, String)> = Vec::new();
    let mut init_config = None;

    for (idx, raw_line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(caps) = INIT_RE.captures(line) {
            let value: serde_json::Value = json5::from_str(&caps[1])
                .with_context(|| format!("line {line_no}: invalid @init block"))?;
            init_config = Some(value);
            continue;
        }

        if let Some(caps) = EDGE_RE.captures(line) {
            let from = unquote_name(&caps["from"]);
            let to = unquote_name(&caps["to"]);
            ensure_node(&mut nodes, &from);
            ensure_node(&mut nodes, &to);
            edges.push((from, to));
            continue;
        }

        if let Some(caps) = NODE_RE.captures(line) {
            let name = unquote_name(&caps["name"]);
            let node = ensure_node(&mut nodes, &name);
            if let Some(attrs) = caps.name("attrs") {
                apply_attrs(node, attrs.as_str(), line_no)?;
            }
            continue;
        }

        bail!("line {line_no}: unrecognized statement: {line}");
    }

    let mut graph = Graph::new();
    for node in nodes.into_values() {
        graph.add(Box::new(node));
    }
    for (from, to) in edges {
        graph.connect(&from, &to);
    }

    Ok(ParseOutput { graph, init_config })
}

fn ensure_node<'a>(nodes: &'a mut BTreeMap<String, GraphNode>, name: &str) -> &'a mut GraphNode {
    nodes
        .entry(name.to_string())
        .or_insert_with(|| GraphNode::new(name))
}

fn apply_attrs(node: &mut GraphNode, attrs: &str, line_no: usize) -> Result<()> {
    for part in split_attrs(attrs) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match part.split_once('=') {
            None => match part {
                "hidden" => node.hidden = true,
                "verbose" => node.verbose_only = true,
                other => bail!("line {line_no}: unknown node attribute `{other}`"),
            },
            Some((key, value)) => {
                let key = key.trim();
                let value = value.trim();
                match key {
                    "rank" => {
                        node.rank = Some(value.parse().with_context(|| {
                            format!("line {line_no}: rank must be a non-negative integer")
                        })?);
                    }
                    "label" => node.label = unquote_value(value),
                    other => bail!("line {line_no}: unknown node attribute `{other}`"),
                }
            }
        }
    }
    Ok(())
}

/// Splits an attribute list on commas, ignoring commas inside quoted
/// values.
fn split_attrs(attrs: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for ch in attrs.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_quotes => {
                current.push(ch);
                escaped = true;
            }
            '"' => {
                current.push(ch);
                in_quotes = !in_quotes;
            }
            ',' if !in_quotes => {
                parts.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    parts.push(current);
    parts
}

fn unquote_name(token: &str) -> String {
    token
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(token)
        .to_string()
}

fn unquote_value(token: &str) -> String {
    let Some(inner) = token
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return token.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dot::{DotContext, DotOpts};

    fn dot_of(output: &ParseOutput, name: &str) -> String {
        let opts = DotOpts::default();
        let ctx = DotContext {
            opts: &opts,
            cycles: &[],
        };
        output
            .graph
            .vertex(name)
            .expect("vertex present")
            .as_dotter()
            .expect("vertex renderable")
            .dot(name, &ctx)
    }

    #[test]
    fn parses_nodes_edges_and_attributes() {
        let out = parse_depgraph(
            "# service chain\n\
             db [rank=0, label=\"postgres 15\"]\n\
             api -> db\n\
             web -> api\n",
        )
        .unwrap();

        let db = out.graph.vertex("db").unwrap();
        assert_eq!(db.as_ranked().unwrap().dot_rank(), 0);
        assert_eq!(dot_of(&out, "db"), "\"db\" [label = \"postgres 15\"];");

        // Edge endpoints are auto-declared with their name as label.
        assert_eq!(dot_of(&out, "web"), "\"web\" [label = \"web\"];");
        assert_eq!(out.graph.down_edges("api"), vec!["db"]);
        assert_eq!(out.graph.down_edges("web"), vec!["api"]);
    }

    #[test]
    fn parses_quoted_names_and_escaped_labels() {
        let out = parse_depgraph(
            "\"load balancer\" [rank=0, label=\"front \\\"edge\\\"\\ntier\"]\n\
             web -> \"load balancer\"\n",
        )
        .unwrap();

        assert!(out.graph.vertex("load balancer").is_some());
        assert_eq!(
            dot_of(&out, "load balancer"),
            "\"load balancer\" [label = \"front \\\"edge\\\"\\ntier\"];"
        );
        assert_eq!(out.graph.down_edges("web"), vec!["load balancer"]);
    }

    #[test]
    fn later_declaration_updates_auto_declared_node() {
        let out = parse_depgraph(
            "api -> db\n\
             db [rank=0]\n",
        )
        .unwrap();
        assert_eq!(
            out.graph
                .vertex("db")
                .unwrap()
                .as_ranked()
                .unwrap()
                .dot_rank(),
            0
        );
    }

    #[test]
    fn hidden_nodes_lose_render_capability() {
        let out = parse_depgraph("ghost [hidden]\n").unwrap();
        assert!(out.graph.vertex("ghost").unwrap().as_dotter().is_none());
    }

    #[test]
    fn verbose_nodes_render_empty_unless_verbose() {
        let out = parse_depgraph("tracing [verbose]\n").unwrap();
        let vertex = out.graph.vertex("tracing").unwrap();

        let quiet = DotOpts::default();
        let ctx = DotContext {
            opts: &quiet,
            cycles: &[],
        };
        assert_eq!(vertex.as_dotter().unwrap().dot("tracing", &ctx), "");

        let verbose = DotOpts {
            verbose: true,
            draw_cycles: false,
        };
        let ctx = DotContext {
            opts: &verbose,
            cycles: &[],
        };
        assert_eq!(
            vertex.as_dotter().unwrap().dot("tracing", &ctx),
            "\"tracing\" [label = \"tracing\"];"
        );
    }

    #[test]
    fn parses_json5_init_block() {
        let out = parse_depgraph("@init { drawCycles: true, cyclePenwidth: 3 }\nroot [rank=0]\n")
            .unwrap();
        let init = out.init_config.expect("init parsed");
        assert_eq!(init["drawCycles"], serde_json::json!(true));
    }

    #[test]
    fn rejects_unknown_attribute() {
        let err = parse_depgraph("db [shape=box]\n").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn rejects_negative_rank() {
        assert!(parse_depgraph("db [rank=-1]\n").is_err());
    }

    #[test]
    fn rejects_garbage_statement() {
        let err = parse_depgraph("a -> b -> c\n").unwrap_err();
        assert!(err.to_string().contains("unrecognized"));
    }

    #[test]
    fn label_commas_do_not_split_attributes() {
        let out = parse_depgraph("db [label=\"a, b\", rank=0]\n").unwrap();
        assert_eq!(dot_of(&out, "db"), "\"db\" [label = \"a, b\"];");
        assert_eq!(
            out.graph
                .vertex("db")
                .unwrap()
                .as_ranked()
                .unwrap()
                .dot_rank(),
            0
        );
    }
}
