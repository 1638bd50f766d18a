use std::path::Path;

use depdot::{load_config, merge_init_config, parse_depgraph, render_dot};

fn render_fixture(path: &Path) -> String {
    let input = std::fs::read_to_string(path).expect("fixture read failed");
    let parsed = parse_depgraph(&input).expect("parse failed");
    let mut config = load_config(None).expect("default config");
    if let Some(init) = parsed.init_config.clone() {
        config = merge_init_config(config, init);
    }
    render_dot(&parsed.graph, &config.opts, &config.theme).expect("render failed")
}

#[test]
fn render_all_fixtures() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures");

    // Keep this list explicit so new fixtures must be added intentionally.
    let candidates = ["chain", "cycle", "hidden", "verbose"];

    for name in candidates {
        let dep = root.join(format!("{name}.dep"));
        let golden = root.join(format!("{name}.dot"));
        assert!(dep.exists(), "fixture missing: {name}.dep");
        let actual = render_fixture(&dep);
        let expected = std::fs::read_to_string(&golden).expect("golden read failed");
        assert_eq!(actual, expected, "{name}: DOT output drifted from golden");
        // Rendering the same fixture twice must be byte-identical.
        assert_eq!(actual, render_fixture(&dep), "{name}: output not stable");
    }
}
