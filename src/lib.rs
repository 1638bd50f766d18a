#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod dot;
pub mod graph;
pub mod graph_dump;
pub mod parser;
pub mod theme;

pub use config::{load_config, merge_init_config, Config};
pub use dot::{render_dot, DotContext, DotOpts, DotRanked, Dotter};
pub use graph::{Graph, GraphError, GraphNode, Vertex};
pub use parser::{parse_depgraph, ParseOutput};
pub use theme::Theme;

#[cfg(feature = "cli")]
pub use cli::run;
