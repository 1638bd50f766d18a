use crate::dot::DotOpts;
use crate::theme::Theme;
use serde::Deserialize;
use std::path::Path;

/// Resolved render configuration: styling plus the default options a
/// render starts from. CLI flags and inline `@init` overrides are layered
/// on top by the caller.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub opts: DotOpts,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ConfigFile {
    theme: Option<String>,
    cycle_palette: Option<Vec<String>>,
    cycle_penwidth: Option<f32>,
    verbose: Option<bool>,
    draw_cycles: Option<bool>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = serde_json::from_str(&contents)?;
    apply_config_file(&mut config, parsed);
    Ok(config)
}

fn apply_config_file(config: &mut Config, parsed: ConfigFile) {
    if let Some(theme_name) = parsed.theme.as_deref() {
        if theme_name == "modern" {
            config.theme = Theme::modern();
        } else if theme_name == "classic" || theme_name == "default" {
            config.theme = Theme::classic();
        }
    }
    if let Some(palette) = parsed.cycle_palette {
        config.theme.cycle_palette = palette;
    }
    if let Some(width) = parsed.cycle_penwidth {
        config.theme.cycle_penwidth = width;
    }
    if let Some(verbose) = parsed.verbose {
        config.opts.verbose = verbose;
    }
    if let Some(draw_cycles) = parsed.draw_cycles {
        config.opts.draw_cycles = draw_cycles;
    }
}

/// Applies an inline `@init { ... }` value from the graph source over the
/// loaded configuration.
pub fn merge_init_config(mut config: Config, init: serde_json::Value) -> Config {
    if let Some(name) = init.get("theme").and_then(|v| v.as_str()) {
        if name == "modern" {
            config.theme = Theme::modern();
        } else if name == "classic" || name == "default" {
            config.theme = Theme::classic();
        }
    }
    if let Some(palette) = init.get("cyclePalette").and_then(|v| v.as_array()) {
        let colors: Vec<String> = palette
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::to_string)
            .collect();
        if !colors.is_empty() {
            config.theme.cycle_palette = colors;
        }
    }
    if let Some(width) = init.get("cyclePenwidth").and_then(|v| v.as_f64()) {
        config.theme.cycle_penwidth = width as f32;
    }
    if let Some(verbose) = init.get("verbose").and_then(|v| v.as_bool()) {
        config.opts.verbose = verbose;
    }
    if let Some(draw_cycles) = init.get("drawCycles").and_then(|v| v.as_bool()) {
        config.opts.draw_cycles = draw_cycles;
    }
    config
}
