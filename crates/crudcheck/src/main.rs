//! crudcheck entry point
//!
//! Run with: cargo run --package crudcheck -- --api-key <key>

use std::path::PathBuf;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crudcheck::{Browser, CrudResult, SuiteConfig, SuiteRunner};

#[derive(Parser, Debug)]
#[command(name = "crudcheck")]
#[command(about = "CRUD verification suite for hosted REST collections")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "crudcheck.toml")]
    config: PathBuf,

    /// Service root URL, without the access key
    #[arg(long, env = "CRUDCHECK_BASE_URL")]
    base_url: Option<String>,

    /// Access key embedded in the collection URL
    #[arg(long, env = "CRUDCHECK_API_KEY")]
    api_key: Option<String>,

    /// Collection name
    #[arg(long, env = "CRUDCHECK_COLLECTION")]
    collection: Option<String>,

    /// Require the created record to appear in the listing
    #[arg(long)]
    strict_listing: bool,

    /// Hold a headless browser session open for the run
    #[arg(long)]
    browser: bool,

    /// Browser to use (chrome, firefox)
    #[arg(long, env = "CRUDCHECK_BROWSER")]
    browser_kind: Option<Browser>,

    /// Path to the WebDriver binary
    #[arg(long, env = "CRUDCHECK_DRIVER")]
    driver: Option<PathBuf>,

    /// Attach to a running WebDriver server instead of spawning one
    #[arg(long, env = "CRUDCHECK_WEBDRIVER_URL")]
    webdriver_url: Option<String>,

    /// Run the browser with a visible window
    #[arg(long)]
    headed: bool,

    /// Output directory for results
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> CrudResult<SuiteConfig> {
        let mut config = SuiteConfig::load(&self.config)?;

        if let Some(base_url) = self.base_url {
            config.api.base_url = base_url;
        }
        if let Some(api_key) = self.api_key {
            config.api.api_key = api_key;
        }
        if let Some(collection) = self.collection {
            config.api.collection = collection;
        }
        config.api.strict_listing |= self.strict_listing;

        config.browser.enabled |= self.browser;
        if let Some(kind) = self.browser_kind {
            config.browser.browser = kind;
        }
        if let Some(driver) = self.driver {
            config.browser.driver.binary_path = driver;
        }
        if let Some(url) = self.webdriver_url {
            config.browser.endpoint = Some(url);
        }
        if self.headed {
            config.browser.headless = false;
        }
        if let Some(output) = self.output {
            config.output_dir = output;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match run(args).await {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

async fn run(args: Args) -> CrudResult<bool> {
    let runner = SuiteRunner::new(args.into_config()?);
    let result = runner.run().await?;
    runner.write_results(&result)?;
    Ok(result.success())
}
