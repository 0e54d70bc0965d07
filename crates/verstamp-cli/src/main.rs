#![deny(unsafe_code)]

//! verstamp CLI: resolve, print, and emit application versions.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use verstamp_config::AppConfig;
use verstamp_core::header::{self, HeaderOptions};
use verstamp_core::source::{self, UNKNOWN_BUILD};
use verstamp_core::{Skew, VersionDescriptor, build_info, skew};

/// verstamp: one version descriptor for code, logs, and firmware headers.
#[derive(Parser)]
#[command(name = "verstamp", version = build_info::VERSION, about, long_about = None)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, default_value = "verstamp.toml")]
    config: PathBuf,

    /// Project directory containing the VERSION file.
    #[arg(short = 'C', long, default_value = ".")]
    project: PathBuf,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved version.
    Show {
        /// Print the serialized record as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Emit the C version header.
    Header {
        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare two versions (`3.1.1`, `3.1.1+2`, or `0x3010100`).
    Compare { a: String, b: String },

    /// Validate and display configuration.
    Config {
        /// Show the resolved configuration.
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(&cli.config).await?;

    // Verbosity flags win over the configured level
    let filter = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match build_info::descriptor() {
        Ok(own) => info!(
            version = %own,
            build = own.build_identifier(),
            profile = build_info::BUILD_PROFILE,
            "verstamp starting"
        ),
        Err(e) => warn!(version = %build_info::version_string(), error = %e, "verstamp starting"),
    }

    match cli.command {
        Commands::Show { json } => cmd_show(&config, &cli.project, json).await?,
        Commands::Header { output } => {
            cmd_header(&config, &cli.project, output.as_deref()).await?
        }
        Commands::Compare { a, b } => return cmd_compare(&a, &b),
        Commands::Config { show } => cmd_config(&config, &cli.config, show)?,
    }

    Ok(ExitCode::SUCCESS)
}

async fn cmd_show(config: &AppConfig, project: &Path, json: bool) -> Result<()> {
    let version = resolve(config, project).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&version)?);
    } else {
        print!("{}", describe(&version));
    }
    Ok(())
}

async fn cmd_header(config: &AppConfig, project: &Path, output: Option<&Path>) -> Result<()> {
    let version = resolve(config, project).await?;
    let options = HeaderOptions::try_from(&config.header)?;
    match output {
        Some(path) => {
            let written = header::write_header(path, &version, &options).await?;
            if !written {
                info!(path = %path.display(), "Header already up to date");
            }
        }
        None => print!("{}", header::render_header(&version, &options)?),
    }
    Ok(())
}

fn cmd_compare(a: &str, b: &str) -> Result<ExitCode> {
    let a = source::parse_version(a, UNKNOWN_BUILD)?;
    let b = source::parse_version(b, UNKNOWN_BUILD)?;
    let kind = Skew::between(&a, &b);
    println!(
        "{a} {} {b} (skew: {kind})",
        match skew::compare(&a, &b) {
            std::cmp::Ordering::Less => "<",
            std::cmp::Ordering::Equal => "==",
            std::cmp::Ordering::Greater => ">",
        }
    );
    Ok(if kind.is_compatible() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_config(config: &AppConfig, config_path: &Path, show: bool) -> Result<()> {
    if show {
        let toml_str = toml::to_string_pretty(config).context("failed to render config")?;
        println!("{toml_str}");
    } else {
        println!("Configuration at '{}' is valid.", config_path.display());
    }
    Ok(())
}

/// Human-readable summary printed by `show`.
fn describe(version: &VersionDescriptor) -> String {
    format!(
        "version:  {}\nextended: {}\npacked:   {:#x}\nnumber:   {:#x}\nbuild:    {}\n",
        version.display_string(),
        version.extended_display_string(),
        version.packed_code(),
        version.short_numeric_code(),
        version.build_identifier(),
    )
}

async fn resolve(config: &AppConfig, project: &Path) -> Result<VersionDescriptor> {
    source::resolve(config, project)
        .await
        .with_context(|| format!("cannot resolve version for '{}'", project.display()))
}

async fn load_config(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        AppConfig::load(path)
            .await
            .with_context(|| format!("invalid config '{}'", path.display()))
    } else {
        // Logging is not set up yet.
        Ok(AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_describe_reference() {
        let v = VersionDescriptor::new(3, 1, 1, 0, "c52f58c3db14").unwrap();
        assert_eq!(
            describe(&v),
            "version:  3.1.1\nextended: 3.1.1+0\npacked:   0x3010100\nnumber:   0x30101\nbuild:    c52f58c3db14\n"
        );
    }

    #[test]
    fn test_compare_exit_codes() {
        assert_eq!(cmd_compare("3.1.1", "3.1.2+4").unwrap(), ExitCode::SUCCESS);
        assert_eq!(cmd_compare("3.1.1", "0x3020000").unwrap(), ExitCode::FAILURE);
        assert!(cmd_compare("3.1", "3.1.1").is_err());
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["verstamp", "-vv", "header", "-o", "out.h"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Header { output: Some(_) }));

        let cli = Cli::try_parse_from(["verstamp", "compare", "1.0.0", "2.0.0"]).unwrap();
        assert!(matches!(cli.command, Commands::Compare { .. }));
    }
}
