use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use ddb_core::diagnostics::TracingDiagnostics;
use ddb_fetch::{CharacterFetcher, ENDPOINT_ENV, FetchConfig};
use ddb_render::{
    ConvertOptions, Locale, Rendered, SectionSelection, convert_bytes, convert_value,
    render_json_selected, render_text_selected,
};
use tracing_subscriber::EnvFilter;

const STDIN_SOURCE: &str = "-";

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Character JSON file, `-` for stdin, or with --fetch a character id or
    /// dndbeyond.com profile link.
    #[arg(value_name = "SOURCE")]
    source: String,
    #[arg(long)]
    fetch: bool,
    #[arg(long, env = ENDPOINT_ENV, value_name = "URL")]
    endpoint: Option<String>,
    #[arg(long = "timeout-secs", value_name = "SECS", default_value_t = 30)]
    timeout_secs: u64,
    #[arg(long)]
    statblock: bool,
    #[arg(long)]
    attacks: bool,
    #[arg(long)]
    spells: bool,
    #[arg(long)]
    features: bool,
    #[arg(long)]
    inventory: bool,
    #[arg(long)]
    json: bool,
    #[arg(long, value_name = "TEXT")]
    memo: Option<String>,
    #[arg(long, value_name = "NAME")]
    player: Option<String>,
    #[arg(long, value_name = "en|ko", default_value = "en")]
    locale: Locale,
    /// Adds mode, range and property notes under each weapon attack.
    #[arg(long = "attack-notes")]
    attack_notes: bool,
    /// Writes the output document to PATH.
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn sections(&self) -> SectionSelection {
        SectionSelection {
            statblock: self.statblock,
            attacks: self.attacks,
            spells: self.spells,
            features: self.features,
            inventory: self.inventory,
        }
    }

    fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            locale: self.locale,
            memo: self.memo.clone(),
            player_name: self.player.clone(),
            include_attack_notes: self.attack_notes,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.fetch && cli.source == STDIN_SOURCE {
        eprintln!("--fetch expects a character id or profile link, not `-`");
        process::exit(2);
    }
    if cli.timeout_secs == 0 {
        eprintln!("--timeout-secs must be at least 1");
        process::exit(2);
    }

    if let Err(e) = run(&cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: &Cli) -> Result<()> {
    let rendered = load_and_convert(cli).await?;
    let sections = cli.sections();

    if let Some(path) = &cli.output {
        let json = rendered.output_json()?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        if !cli.json && !sections.is_any_selected() {
            println!("Wrote output document to {}", path.display());
            return Ok(());
        }
    }

    if cli.json {
        let selection = if sections.is_any_selected() {
            sections
        } else {
            SectionSelection::all()
        };
        let value = render_json_selected(&rendered.conversion, &selection)?;
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if sections.is_any_selected() {
        println!("{}", render_text_selected(&rendered, &sections));
        return Ok(());
    }

    println!("{}", rendered.output_json()?);
    Ok(())
}

async fn load_and_convert(cli: &Cli) -> Result<Rendered> {
    let options = cli.convert_options();
    let diag = TracingDiagnostics;

    if cli.fetch {
        let mut config =
            FetchConfig::from_env().with_timeout(Duration::from_secs(cli.timeout_secs));
        if let Some(endpoint) = cli.endpoint.as_deref().filter(|e| !e.trim().is_empty()) {
            config.endpoint = endpoint.to_string();
        }
        let fetcher = CharacterFetcher::new(config)?;
        let document = fetcher
            .fetch(&cli.source)
            .await
            .with_context(|| format!("fetching character `{}`", cli.source))?;
        return Ok(convert_value(document, &options, &diag)?);
    }

    let bytes = if cli.source == STDIN_SOURCE {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .context("reading character JSON from stdin")?;
        buf
    } else {
        fs::read(&cli.source).with_context(|| format!("reading {}", cli.source))?
    };
    convert_bytes(&bytes, &options, &diag)
        .with_context(|| format!("converting {}", source_label(&cli.source)))
}

fn source_label(source: &str) -> &str {
    if source == STDIN_SOURCE { "stdin" } else { source }
}
