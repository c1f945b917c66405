mod script;

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::script::Script;

const DEMO_SCRIPT: &str = include_str!("../scripts/match_report.json");

fn main() -> Result<()> {
    setup_tracing();

    let script = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => {
            let source = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read script {}", path.display()))?;
            Script::from_json_str(&source)
                .with_context(|| format!("invalid script {}", path.display()))?
        }
        None => Script::from_json_str(DEMO_SCRIPT).context("invalid built-in demo script")?,
    };

    let report = script.run()?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn setup_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("blog_editor_core=info,blog_editor_story=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
