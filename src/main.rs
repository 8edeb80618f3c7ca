use anyhow::Result;
use clap::Parser;
use pro_search_rs::cli;
use pro_search_rs::research::workflow::{launch, render_outcome};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let args = cli::Args::parse();
    let config = args.into_config()?;

    // RUST_LOG优先，其次按verbose选择级别；日志输出到stderr，stdout只输出回答
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if config.verbose { "debug" } else { "info" }));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(filter);
    tracing_subscriber::registry().with(stderr_layer).init();

    let outcome = launch(&config, args.research_request()).await?;

    print!("{}", render_outcome(&outcome));
    Ok(())
}
