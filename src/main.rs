//! Turnscript - speaker-turn tooling for plain-text chat transcripts.
//!
//! # Usage
//!
//! ```bash
//! turnscript fmt chat.txt
//! turnscript fmt --check chat.txt
//! turnscript sections --json chat.txt
//! turnscript --legacy-markers --save
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};

use turnscript::app::{App, FormatMode};
use turnscript::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags,
};
use turnscript::transcript::MarkerSet;

/// Speaker-turn tooling for plain-text chat transcripts
#[derive(Parser, Debug)]
#[command(name = "turnscript", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Literal marking the start of a user turn
    #[arg(long, global = true, value_name = "TEXT")]
    user_marker: Option<String>,

    /// Literal marking the start of an assistant turn
    #[arg(long, global = true, value_name = "TEXT")]
    assistant_marker: Option<String>,

    /// Use the old `__1` / `__2` marker pair
    #[arg(long, global = true)]
    legacy_markers: bool,

    /// Width of the rule drawn after rendered markers
    #[arg(long, global = true, value_name = "COLUMNS")]
    rule_width: Option<usize>,

    /// Quiet period before `watch` reformats a changed file
    #[arg(long, global = true, value_name = "MS")]
    debounce_ms: Option<u64>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Normalize turn markers
    Fmt {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Fail if the file is not normalized, without rewriting it
        #[arg(long)]
        check: bool,
        /// Print the result instead of rewriting the file
        #[arg(long)]
        stdout: bool,
    },
    /// List speaker turns
    Sections {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the transcript with marker glyphs
    Show {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Keep a transcript normalized while it is edited elsewhere
    Watch {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Rewrite `__1` / `__2` markers with the configured pair
    Migrate {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Print the result instead of rewriting the file
        #[arg(long)]
        stdout: bool,
    },
}

fn require_file(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    Ok(())
}

fn print(text: &str) -> Result<()> {
    let mut out = std::io::stdout().lock();
    out.write_all(text.as_bytes())
        .context("Failed to write to stdout")?;
    if !text.ends_with('\n') {
        out.write_all(b"\n").context("Failed to write to stdout")?;
    }
    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
        eprintln!("Saved defaults to {}", global_path.display());
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    let Some(command) = cli.command else {
        if cli.save || cli.clear {
            return Ok(());
        }
        Cli::command().print_help().context("Failed to print help")?;
        return Ok(());
    };

    let markers = effective.markers().context("Invalid marker configuration")?;
    let mut app = App::new(markers);
    if let Some(width) = effective.rule_width {
        app = app.with_rule_width(width);
    }
    if let Some(ms) = effective.debounce_ms {
        app = app.with_debounce(Duration::from_millis(ms));
    }

    match command {
        Command::Fmt {
            file,
            check,
            stdout,
        } => {
            require_file(&file)?;
            let mode = if check || stdout {
                FormatMode::Check
            } else {
                FormatMode::Write
            };
            let report = app.format_file(&file, mode)?;
            if stdout {
                print(&report.text)?;
            }
            if check && report.changed {
                anyhow::bail!("{} is not normalized", file.display());
            }
        }
        Command::Sections { file, json } => {
            require_file(&file)?;
            print(&app.sections_report(&file, json)?)?;
        }
        Command::Show { file } => {
            require_file(&file)?;
            print(&app.render_file(&file)?)?;
        }
        Command::Watch { file } => {
            require_file(&file)?;
            app.watch(&file).context("Watch failed")?;
        }
        Command::Migrate { file, stdout } => {
            require_file(&file)?;
            let mode = if stdout {
                FormatMode::Check
            } else {
                FormatMode::Write
            };
            let report = app.migrate_file(&file, &MarkerSet::legacy(), mode)?;
            if stdout {
                print(&report.text)?;
            }
        }
    }
    Ok(())
}
