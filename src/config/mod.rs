pub mod toml_config;

use crate::core::{ConfigProvider, HeaderMode, OutputFormat};
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_url, Validate,
};
use std::time::Duration;

#[cfg(feature = "cli")]
use crate::utils::validation::{validate_output_directory, validate_path};
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use toml_config::TomlConfig;

/// Directory of the 2017 Chamber of Deputies results; municipality links are relative to it.
pub const DEFAULT_BASE_URL: &str = "https://www.volby.cz/pls/ps2017nss/";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("volby-scraper/", env!("CARGO_PKG_VERSION"));

/// Effective settings after defaults, the TOML file and CLI flags are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScraperSettings {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
    pub header_mode: HeaderMode,
    pub output_format: OutputFormat,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            header_mode: HeaderMode::default(),
            output_format: OutputFormat::default(),
        }
    }
}

impl ConfigProvider for ScraperSettings {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn user_agent(&self) -> &str {
        &self.user_agent
    }

    fn header_mode(&self) -> HeaderMode {
        self.header_mode
    }

    fn output_format(&self) -> OutputFormat {
        self.output_format
    }
}

impl Validate for ScraperSettings {
    fn validate(&self) -> Result<()> {
        validate_url("base_url", &self.base_url)?;
        validate_positive_number("timeout_seconds", self.timeout_seconds, 1)?;
        validate_non_empty_string("user_agent", &self.user_agent)?;
        Ok(())
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "volby-scraper")]
#[command(about = "Scrapes Czech parliamentary election results per municipality into CSV")]
#[command(version)]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,

    /// Base URL that municipality links are resolved against
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// HTTP request timeout in seconds
    #[arg(long, global = true)]
    pub timeout_seconds: Option<u64>,

    /// User-Agent header sent with every request
    #[arg(long, global = true)]
    pub user_agent: Option<String>,

    /// TOML settings file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Fetch all municipality results for a listing URL into a CSV file
    FetchData {
        /// Listing page of a district, e.g. https://www.volby.cz/pls/ps2017nss/ps32?xjazyk=CZ&xkraj=12&xnumnuts=7103
        url: String,

        /// Destination file; its directory must already exist
        output_path: PathBuf,

        /// How the header row is derived
        #[arg(long, value_enum)]
        header_mode: Option<HeaderMode>,

        /// Output delimiter
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// List the municipality URLs found on a listing page
    ListTowns {
        /// Listing page of a district
        url: String,
    },
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn listing_url(&self) -> &str {
        match &self.command {
            Command::FetchData { url, .. } | Command::ListTowns { url } => url.as_str(),
        }
    }

    /// Built-in defaults, overlaid by the TOML file, overlaid by CLI flags.
    pub fn settings(&self) -> Result<ScraperSettings> {
        let mut settings = ScraperSettings::default();

        if let Some(path) = &self.config {
            tracing::debug!("Loading settings from {}", path.display());
            TomlConfig::from_file(path)?.apply_to(&mut settings);
        }

        if let Some(base_url) = &self.base_url {
            settings.base_url = base_url.clone();
        }
        if let Some(timeout) = self.timeout_seconds {
            settings.timeout_seconds = timeout;
        }
        if let Some(user_agent) = &self.user_agent {
            settings.user_agent = user_agent.clone();
        }
        if let Command::FetchData {
            header_mode,
            format,
            ..
        } = &self.command
        {
            if let Some(header_mode) = header_mode {
                settings.header_mode = *header_mode;
            }
            if let Some(format) = format {
                settings.output_format = *format;
            }
        }

        Ok(settings)
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_url("url", self.listing_url())?;

        if let Command::FetchData { output_path, .. } = &self.command {
            validate_path("output_path", &output_path.to_string_lossy())?;
            validate_output_directory(output_path)?;
        }

        Ok(())
    }
}
