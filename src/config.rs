// src/config.rs
use crate::constants::{NOTION_PAGE_BASE_URL, UNTITLED_PLACEHOLDER};
use crate::error::AppError;
use crate::formatting::TitleExtractor;
use crate::snapshot::SnapshotComposer;
use crate::types::ValidatedUrl;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Title used when an entity has none
    #[arg(long, global = true)]
    pub placeholder_title: Option<String>,

    /// Base URL for synthesized page links
    #[arg(long, global = true, env = "NOTION_PAGE_BASE_URL")]
    pub base_url: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Render a block tree (JSON) to Markdown
    Render {
        /// Input file, or '-' for stdin
        #[arg(default_value = "-")]
        input: String,
    },

    /// Normalize a webhook delivery into canonical events
    Normalize {
        /// Input file, or '-' for stdin
        #[arg(default_value = "-")]
        input: String,
    },

    /// Run a delivery through the full pipeline against a fixture directory
    Ingest {
        /// Input file, or '-' for stdin
        #[arg(default_value = "-")]
        input: String,

        /// Directory holding pages/, databases/ and blocks/ fixtures
        #[arg(long)]
        fixtures: PathBuf,
    },
}

impl Command {
    pub fn input(&self) -> &str {
        match self {
            Command::Render { input }
            | Command::Normalize { input }
            | Command::Ingest { input, .. } => input,
        }
    }
}

/// Resolved snapshot configuration.
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    pub placeholder_title: String,
    pub page_base_url: ValidatedUrl,
    pub verbose: bool,
}

impl SnapshotConfig {
    /// Resolves configuration from CLI input; the base URL flag falls back to
    /// `NOTION_PAGE_BASE_URL` through clap.
    pub fn resolve(cli: &CommandLineInput) -> Result<Self, AppError> {
        let placeholder_title = match cli.placeholder_title.as_deref().map(str::trim) {
            Some("") => {
                return Err(AppError::MissingConfiguration(
                    "--placeholder-title must not be blank".to_string(),
                ))
            }
            Some(title) => title.to_string(),
            None => UNTITLED_PLACEHOLDER.to_string(),
        };

        let page_base_url = match cli.base_url.as_deref() {
            Some(url) => ValidatedUrl::parse(url)?,
            None => default_base_url()?,
        };

        Ok(SnapshotConfig {
            placeholder_title,
            page_base_url,
            verbose: cli.verbose,
        })
    }

    pub fn composer(&self) -> SnapshotComposer {
        SnapshotComposer::new(
            TitleExtractor::new(self.placeholder_title.clone()),
            self.page_base_url.clone(),
        )
    }
}

fn default_base_url() -> Result<ValidatedUrl, AppError> {
    ValidatedUrl::parse(NOTION_PAGE_BASE_URL).map_err(AppError::from)
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            placeholder_title: UNTITLED_PLACEHOLDER.to_string(),
            page_base_url: default_base_url().expect("Default base URL should be valid"),
            verbose: false,
        }
    }
}
