use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use stampede::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_VIRTUAL_USERS};
use stampede::prelude::*;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

/// Saturating load test of an Ollama server, one model after the other.
#[derive(Parser, Debug)]
#[command(version = "0.1")]
struct Cli {
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Virtual users per model.
    #[arg(short, long, default_value_t = DEFAULT_VIRTUAL_USERS)]
    users: usize,

    /// Load window per model, e.g. `10m` or `90s`.
    #[arg(short, long, value_parser = humantime::parse_duration, default_value = "10m")]
    duration: Duration,

    /// Per-request timeout.
    #[arg(short, long, value_parser = humantime::parse_duration, default_value = "60s")]
    timeout: Duration,

    /// Log a countdown line at this interval.
    #[arg(long, value_parser = humantime::parse_duration)]
    progress: Option<Duration>,

    /// Directory receiving one `api_metrics_<model>.txt` per model.
    #[arg(short, long, default_value = "./result")]
    out: PathBuf,

    /// Full JSON test plan. Takes precedence over every other option but `--out`.
    #[arg(long)]
    plan: Option<PathBuf>,

    /// Models to test, in order.
    #[arg(short('m'), long = "model", default_values_t = vec!["llama3.1:latest".to_string()])]
    models: Vec<String>,
}

impl Cli {
    fn test_plan(&self) -> Result<TestPlan> {
        if let Some(path) = &self.plan {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            return Ok(TestPlan::from_json(&json)?);
        }

        let mut config = RunConfig::new()
            .virtual_users(self.users)
            .test_duration(self.duration)
            .http_timeout(self.timeout)
            .endpoint(Endpoint::new(&self.host, self.port));
        if let Some(every) = self.progress {
            config = config.progress_interval(every);
        }

        Ok(self.models.iter().fold(TestPlan::new(config), |plan, model| {
            let template = json!({
                "model": model,
                "messages": [{"role": "user", "content": "how r u?"}],
                "stream": false,
            });
            plan.group(TestGroup::new(model, vec![template]))
        }))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    FmtSubscriber::builder()
        .with_env_filter("stampede=info,ollama=info")
        .init();

    let cli = Cli::parse();
    let plan = cli.test_plan()?;

    let transport = HttpTransport::new(&plan.config.endpoint)?;
    transport.log_reachability().await;

    let test = LoadTest::new(plan, transport, FileSink::new(&cli.out)?);
    let shutdown = test.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, ending the current model early and skipping the rest");
            shutdown.cancel();
        }
    });

    let reports = test.await?;
    info!("Saved {} report(s) to {}", reports.len(), cli.out.display());
    Ok(())
}
