#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(clippy::all)]

//! codecritic - repository roasts and README generation
//!
//! This library takes a shallow snapshot of a GitHub repository (top-level
//! listing, README, `.env`-like files, one manifest, recent commits and open
//! issues), runs a few cheap heuristics over it and asks a text-generation
//! provider for either a roast or a fresh README.
//!
//! ## Features
//! - Snapshot construction with concurrent fetches
//! - Secret scanning of `.env`-like files
//! - README adequacy heuristic
//! - Tech-stack detection from file names and manifests
//! - Gemini generation with quota-driven API key rotation
//!
//! ## Usage
//! ```rust,ignore
//! use codecritic::{api::{CriticService, RoastRequest}, Config};
//!
//! async fn example() -> codecritic::Result<()> {
//!     let config = Config::load()?;
//!     let service = CriticService::from_config(&config)?;
//!     let response = service
//!         .roast(&RoastRequest { repo_url: "https://github.com/owner/repo".into() })
//!         .await?;
//!     println!("{}", response.roast);
//!     Ok(())
//! }
//! ```

/// Repository snapshot construction and heuristics
pub mod analysis;
/// Request orchestration and URL parsing
pub mod api;
/// Configuration module for the application
pub mod config;
/// Error handling types and utilities
pub mod error;
/// Text generation and API key rotation
pub mod generation;
/// GitHub REST transport
pub mod github;
/// Logging configuration and utilities
pub mod logging;
/// Prompt templates
pub mod prompts;
/// HTTP routes and error mapping
pub mod server;

pub use analysis::{analyze_repository, AnalysisRecord, ProjectFacts, SnapshotBuilder, StackInfo};
pub use api::{analyze_url, parse_repo_url, CriticService, RepoRef};
pub use config::Config;
pub use error::{CriticError, Result};
pub use generation::{GenerationClient, GenerationOptions, TextGenerator};
pub use github::{GitHubClient, RepositorySource};
pub use prompts::{readme_prompt, roast_prompt};
