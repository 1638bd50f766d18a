use serde::{Deserialize, Serialize};

/// Styling data for the DOT output. The palette colors cycle-highlight
/// edges; entries must be valid unquoted DOT color names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub cycle_palette: Vec<String>,
    pub cycle_penwidth: f32,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            cycle_palette: vec![
                "red".to_string(),
                "green".to_string(),
                "blue".to_string(),
            ],
            cycle_penwidth: 2.0,
        }
    }

    pub fn modern() -> Self {
        Self {
            cycle_palette: vec![
                "crimson".to_string(),
                "seagreen".to_string(),
                "steelblue".to_string(),
                "darkorange".to_string(),
            ],
            cycle_penwidth: 2.4,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
