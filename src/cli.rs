use crate::config::{load_config, merge_init_config};
use crate::dot::render_dot;
use crate::graph_dump::{write_graph_dump, GraphDump};
use crate::parser::parse_depgraph;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "depdot",
    version,
    about = "Render a dependency graph description as Graphviz DOT"
)]
pub struct Args {
    /// Input file (.dep) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "dot")]
    pub output_format: OutputFormat,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Render vertices that only show themselves in verbose mode
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Re-draw cycle edges with highlight styling
    #[arg(long = "draw-cycles")]
    pub draw_cycles: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Dot,
    Json,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    if args.verbose {
        config.opts.verbose = true;
    }
    if args.draw_cycles {
        config.opts.draw_cycles = true;
    }

    let input = read_input(args.input.as_deref())?;
    let parsed = parse_depgraph(&input)?;
    if let Some(init) = parsed.init_config.clone() {
        config = merge_init_config(config, init);
    }

    match args.output_format {
        OutputFormat::Dot => {
            let dot = render_dot(&parsed.graph, &config.opts, &config.theme)?;
            write_output(&dot, args.output.as_deref())?;
        }
        OutputFormat::Json => {
            let dump = GraphDump::from_graph(&parsed.graph, &config.opts)?;
            write_graph_dump(&dump, args.output.as_deref())?;
        }
    }

    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            return Ok(buf);
        }
        return Ok(std::fs::read_to_string(path)?);
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn write_output(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text)?;
        }
        None => {
            print!("{}", text);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let args =
            Args::try_parse_from(["depdot", "-i", "graph.dep", "--draw-cycles", "-v"]).unwrap();
        assert_eq!(args.input.as_deref(), Some(Path::new("graph.dep")));
        assert!(args.draw_cycles);
        assert!(args.verbose);
        assert!(matches!(args.output_format, OutputFormat::Dot));
    }

    #[test]
    fn selects_json_output_format() {
        let args = Args::try_parse_from(["depdot", "-e", "json"]).unwrap();
        assert!(matches!(args.output_format, OutputFormat::Json));
    }
}
