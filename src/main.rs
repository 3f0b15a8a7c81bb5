use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use differs::{Body, DiffConfig, DiffOutput, Strategy, decode_bodies, run_strategy};
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[command(name = "pagediff")]
#[command(about = "Compare two captures of a web page")]
#[command(version)]
struct Cli {
    /// One of: length, identical_bytes, side_by_side_text, html_text_diff,
    /// html_source_diff, html_diff_render, html_tree_diff, html_differ,
    /// pagefreezer
    strategy: Strategy,
    /// Old capture: a file path, or a URL for pagefreezer
    a: String,
    /// New capture: a file path, or a URL for pagefreezer
    b: String,
    #[arg(long, value_name = "PATH", help = "TOML settings file")]
    config: Option<PathBuf>,
    #[arg(long, help = "Write rendered HTML without indentation")]
    compact: bool,
    #[arg(long, help = "Print HTML results as a JSON string too")]
    json: bool,
}

fn read(path: &str) -> Result<Vec<u8>> {
    let bytes = fs::read(path).with_context(|| format!("reading {path}"))?;
    log::debug!(target: "pagediff", "read {} bytes from {path}", bytes.len());
    Ok(bytes)
}

fn load_config(path: Option<&Path>) -> Result<DiffConfig> {
    let mut config = match path {
        Some(path) => DiffConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DiffConfig::default(),
    };
    config.apply_env();
    config.validate().context("invalid settings after environment overrides")?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if cli.compact {
        config.pretty_output = false;
    }

    let (a, b) = if cli.strategy.takes_urls() {
        (Body::Text(cli.a.clone()), Body::Text(cli.b.clone()))
    } else {
        decode_bodies(cli.strategy, read(&cli.a)?, read(&cli.b)?)
    };

    let output = run_strategy(cli.strategy, a.payload(), b.payload(), &config)
        .with_context(|| format!("{} failed", cli.strategy))?;

    let mut stdout = io::stdout().lock();
    match (&output, cli.json) {
        (DiffOutput::Html(html), false) => stdout.write_all(html.as_bytes())?,
        _ => {
            serde_json::to_writer(&mut stdout, &output)?;
            stdout.write_all(b"\n")?;
        }
    }
    stdout.flush()?;
    Ok(())
}
