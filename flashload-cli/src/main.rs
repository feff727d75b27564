use anyhow::{bail, Context};
use clap::Parser;
use flashload::executor::HttpExecutor;
use flashload::LoadTest;
use flashload_core::{Preset, ProfileKind, RunConfig, EXIT_CONFIG_ERROR};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Run synthetic traffic against a flash-sale precheck endpoint and judge it against thresholds.
///
/// Exits 0 when every threshold holds, 99 on a threshold breach and 104 when the run could not
/// be configured.
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    /// JSON run configuration.
    #[arg(short, long, conflicts_with = "preset")]
    config: Option<PathBuf>,

    /// Built-in scenario (see `--list-presets`).
    #[arg(short, long)]
    preset: Option<Preset>,

    /// Target base URL; overrides the configuration.
    #[arg(short, long)]
    base_url: Option<String>,

    /// Seed of every random choice; overrides the configuration.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Replace the configured pattern profiles with these, using their defaults. Repeatable.
    #[arg(long = "profile")]
    profiles: Vec<ProfileKind>,

    /// Print the report as JSON instead of a table.
    #[arg(long)]
    json: bool,

    /// Serve Prometheus metrics on this address while running.
    #[arg(long)]
    prometheus: Option<SocketAddr>,

    /// Print the built-in presets and exit.
    #[arg(long)]
    list_presets: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("flashload=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.list_presets {
        for preset in Preset::ALL {
            println!("{preset}");
        }
        return ExitCode::SUCCESS;
    }

    let (test, json) = match prepare(cli) {
        Ok(prepared) => prepared,
        Err(e) => {
            error!("{e:#}");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let report = test.await;
    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(out) => println!("{out}"),
            Err(e) => error!("Failed to serialize the report: {e}"),
        }
    } else {
        println!("{report}");
    }

    ExitCode::from(report.verdict.exit_code())
}

fn prepare(cli: Cli) -> anyhow::Result<(LoadTest<HttpExecutor>, bool)> {
    let base_url = cli.base_url.as_deref();

    let mut config = match (&cli.config, cli.preset) {
        (Some(path), _) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let config = RunConfig::from_json(&raw)
                .with_context(|| format!("parsing {}", path.display()))?;
            match base_url {
                Some(url) => config.base_url(url),
                None => config,
            }
        }
        (None, Some(preset)) => preset.config(base_url.unwrap_or(DEFAULT_BASE_URL)),
        (None, None) => bail!("one of --config or --preset is required"),
    };

    if let Some(seed) = cli.seed {
        config = config.seed(seed);
    }

    if !cli.profiles.is_empty() {
        config.pattern.profiles = cli.profiles.iter().map(ProfileKind::default_config).collect();
    }

    if let Some(addr) = cli.prometheus {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("installing the Prometheus exporter")?;
        info!("Serving metrics on {addr}");
    }

    debug!("Run configuration: {config:?}");
    let test = LoadTest::new(config)?;
    Ok((test, cli.json))
}
