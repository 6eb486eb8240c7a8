use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use codecritic::{
    api::{analyze_url, CriticService, ReadmeRequest, RoastRequest},
    logging, Config, GitHubClient,
};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", env = "CODECRITIC_LOG")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Roast a GitHub repository
    Roast {
        /// Repository URL, e.g. https://github.com/owner/repo
        url: String,
    },
    /// Generate a README for a GitHub repository
    Readme(ReadmeArgs),
    /// Print the repository snapshot as JSON
    Analyze {
        /// Repository URL
        url: String,
    },
}

#[derive(Args)]
struct ReadmeArgs {
    /// Repository URL
    url: String,
    /// What the project is for
    #[arg(long)]
    description: Option<String>,
    /// Notable features
    #[arg(long)]
    features: Option<String>,
    /// How to set the project up
    #[arg(long)]
    setup: Option<String>,
    /// Environment variables the project reads
    #[arg(long)]
    env_vars: Option<String>,
    /// Write the README to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(&cli.log_level) {
        eprintln!("{} {}", "Warning:".yellow().bold(), e);
    }

    if let Err(e) = run(cli.command).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(command: Command) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    // Gemini keys are only required by the generating subcommands
    let service = || -> codecritic::Result<CriticService> {
        config.validate()?;
        CriticService::from_config(&config)
    };

    match command {
        Command::Roast { url } => {
            let service = service()?;
            let spinner = spinner(&format!("Roasting {}", url));
            let result = service.roast(&RoastRequest { repo_url: url }).await;
            spinner.finish_and_clear();
            let response = result?;

            println!("{}\n", "🔥 Roast".bright_red().bold());
            println!("{}\n", response.roast);
            let analysis = &response.analysis;
            println!("{}", "Snapshot".bright_cyan().bold());
            println!("  README:          {}", flag(analysis.has_readme, !analysis.readme_needs_update));
            println!("  .env files:      {}", flag(analysis.has_env_file, !analysis.has_env_file));
            println!("  Exposed secrets: {}", analysis.exposed_secret_count);
            println!("  Top-level files: {}", analysis.file_structure.len());
            println!("  Open issues:     {}", analysis.open_issues.len());
        }
        Command::Readme(args) => {
            let service = service()?;
            let spinner = spinner(&format!("Writing a README for {}", args.url));
            let request = ReadmeRequest {
                repo_url: args.url,
                project_description: args.description,
                project_features: args.features,
                setup_instructions: args.setup,
                environment_variables: args.env_vars,
            };
            let result = service.readme(&request).await;
            spinner.finish_and_clear();
            let response = result?;

            info!("Detected stack: {:?}", response.stack.detected_labels());
            match args.output {
                Some(path) => {
                    tokio::fs::write(&path, &response.readme)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("{} {}", "✅ README written to".green().bold(), path.display());
                }
                None => println!("{}", response.readme),
            }
        }
        Command::Analyze { url } => {
            config.ensure_tokens()?;
            let source = GitHubClient::from_config(&config)?;
            let spinner = spinner(&format!("Analyzing {}", url));
            let result = analyze_url(&source, &url, config.limits).await;
            spinner.finish_and_clear();
            let record = result?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
    }

    Ok(())
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn flag(present: bool, healthy: bool) -> ColoredString {
    let text = if present { "yes" } else { "no" };
    if healthy {
        text.green()
    } else {
        text.yellow()
    }
}
