// Copyright 2026 Prodex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Prodex command-line driver.

use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use prodex::{Pipeline, PromptAssembler, ScrapeReport, ScrapeRequest, Settings, StrategyRegistry};

#[derive(Parser)]
#[command(
    name = "prodex",
    about = "Acquire product pages through a strategy cascade and build extraction prompts",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape a product page.
    Scrape {
        /// Page URL (http or https).
        url: String,

        /// IP strategy (datacenter, residential).
        #[arg(long)]
        ip: Option<String>,

        /// Extraction strategy, repeatable; order is cascade order.
        /// Defaults to fetch-headers, browser, fetch.
        #[arg(long = "strategy", value_name = "NAME")]
        strategies: Vec<String>,

        /// Token budget for relevant JSON in the prompt.
        #[arg(long, default_value_t = 8000)]
        budget: usize,

        /// Print the assembled prompt instead of a summary.
        #[arg(long, conflicts_with = "json")]
        prompt: bool,

        /// Print the full report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List registered IP and extraction strategies as JSON.
    Strategies,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   prodex completions bash > ~/.local/share/bash-completion/completions/prodex
    ///   prodex completions zsh > ~/.zfunc/_prodex
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Scrape {
            url,
            ip,
            strategies,
            budget,
            prompt,
            json,
        } => {
            let settings = Settings::from_env();
            tracing::debug!(?settings, "resolved settings");
            let registry = Arc::new(StrategyRegistry::new(&settings));
            let pipeline = Pipeline::new(registry)
                .with_assembler(PromptAssembler::default().with_budget(budget));

            let request = ScrapeRequest {
                url,
                ip,
                strategies,
            };
            let report = pipeline.scrape(&request).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else if prompt {
                println!("{}", report.prompt.text);
            } else {
                print_summary(&report);
            }
        }

        Commands::Strategies => {
            let registry = StrategyRegistry::new(&Settings::from_env());
            println!("{}", serde_json::to_string_pretty(&registry.describe())?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "prodex", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn print_summary(report: &ScrapeReport) {
    let record = &report.record;
    println!("URL:        {}", record.final_url);
    println!(
        "Strategy:   {} (attempt {}, ip {}, {} ms)",
        report.strategy, report.attempts, record.meta.ip_strategy, record.meta.elapsed_ms
    );
    println!("Title:      {}", record.title.as_deref().unwrap_or("-"));
    println!("Price:      {}", record.price.as_deref().unwrap_or("-"));
    println!("SKU:        {}", record.sku.as_deref().unwrap_or("-"));
    println!("Images:     {}", record.images.len());
    println!("JSON blobs: {}", record.relevance_metadata.len());
    println!(
        "Prompt:     {:?}, {} sections, ~{} of {} tokens{}",
        report.prompt.framing,
        report.prompt.sections.len(),
        report.prompt.text.chars().count().div_ceil(4),
        report.prompt.original_tokens,
        if report.prompt.was_truncated { " (truncated)" } else { "" }
    );
}
