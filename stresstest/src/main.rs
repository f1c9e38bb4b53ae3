//! This is a stresstest binary which compares how two logging backends cope with many
//! concurrent users.
//!
//! Without a configuration file, it simulates between 2000 and 8000 users, each logging 20
//! messages three seconds apart, into a JSON log and a plain text log under `logs/`. The size of
//! both files is sampled every second and rendered into `logFileSizeChart.html`.
//!
//! See [`stresstest::config`] for the configuration file format.

use std::path::PathBuf;

use anyhow::Context;
use argh::FromArgs;
use stresstest::config::Config;
use stresstest::observability::initialize_tracing;
use stresstest::summary::print_summary;
use stresstest::{ChartReporter, OrchestrationError, Stresstest};
use tokio_util::sync::CancellationToken;

/// Stresstester comparing the output growth of two logging backends
#[derive(Debug, FromArgs)]
pub struct Args {
    /// path to the yaml configuration file
    #[argh(option, short = 'c')]
    pub config: Option<PathBuf>,

    /// path of the comparison chart (.html, .svg or .json)
    #[argh(option, short = 'o')]
    pub output: Option<PathBuf>,

    /// seed for the actor count and message contents
    #[argh(option)]
    pub seed: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Args = argh::from_env();
    initialize_tracing();

    let mut config = match args.config {
        Some(path) => {
            let config_file =
                std::fs::File::open(path).context("failed to open config file")?;
            serde_yaml::from_reader(config_file).context("failed to parse config YAML")?
        }
        None => Config::default(),
    };
    if let Some(output) = args.output {
        config.output = output;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let [a, b] = &config.backends;
    let backends = [
        a.open()
            .await
            .with_context(|| format!("failed to open backend `{}`", a.name))?,
        b.open()
            .await
            .with_context(|| format!("failed to open backend `{}`", b.name))?,
    ];

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted, aborting remaining actors");
                shutdown.cancel();
            }
        }
    });

    let result = Stresstest::new(config.run_config(), backends)
        .with_shutdown(shutdown)
        .with_progress(true)
        .run(&ChartReporter, &config.output)
        .await;

    match result {
        Ok(result) => {
            print_summary(&result);
            println!();
            println!("Chart saved to {}", config.output.display());
            Ok(())
        }
        Err(OrchestrationError::Render { result, source }) => {
            print_summary(&result);
            Err(source).context("failed to render chart")
        }
        Err(error) => Err(error.into()),
    }
}
