use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use social_transcript::{output, utils, ApifyClient, Cli, Config, Orchestrator};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (stderr, so stdout stays the report)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "social_transcript=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Missing credentials are fatal before anything else happens
    let config = Config::load()?;
    let backend = Arc::new(ApifyClient::from_config(&config.apify)?);
    let orchestrator = Orchestrator::from_config(&config, backend)?;

    let url = match cli.url {
        Some(url) => url,
        None => match prompt_for_url()? {
            Some(url) => url,
            None => {
                println!("No URL provided. Exiting.");
                return Ok(());
            }
        },
    };

    if !utils::has_http_scheme(&url) {
        println!("Warning: URL doesn't start with http:// or https://");
        println!("Attempting to process anyway...");
    }

    // Processing errors are reported, never turned into a failing exit code
    if let Err(e) = run(&orchestrator, &config, &url).await {
        println!("\nError in orchestrator: {e:#}");
        println!("Please check your URL and try again.");
    }

    Ok(())
}

async fn run(orchestrator: &Orchestrator, config: &Config, url: &str) -> Result<()> {
    println!("{}", "-".repeat(40));
    println!("Processing URL: {}", url);

    let progress = ProgressBar::new_spinner();
    progress.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    progress.set_message("Extracting transcript...");
    progress.enable_steady_tick(Duration::from_millis(120));

    let record = orchestrator.process(url).await;
    progress.finish_and_clear();

    println!("Processing complete!");
    println!("{}", "=".repeat(60));
    println!("{}", output::summary(&record));
    println!("{}", "=".repeat(60));

    if config.output.persist {
        let path = output::save_result(&record, &config.output.dir)?;
        println!("Result saved to: {}", path.display());
    }

    Ok(())
}

fn prompt_for_url() -> Result<Option<String>> {
    print!("Please enter the URL to process: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;

    let url = line.trim();
    Ok((!url.is_empty()).then(|| url.to_string()))
}
