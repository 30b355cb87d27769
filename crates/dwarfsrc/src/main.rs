use std::error::Error;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use dwarfsrc_core::{walk_units, SectionMap, UnitWalker, WalkOptions};
use dwarfsrc_utils::{debug, info, init_logging, LogConfig, LogLevel};

mod output;

use output::OutputFormat;

/// List the source files recorded in a binary's DWARF debug information.
#[derive(Parser, Debug)]
#[command(name = "dwarfsrc")]
#[command(version)]
#[command(about = "List the source files recorded in a binary's DWARF debug information", long_about = None)]
struct Cli
{
    /// ELF or Mach-O file to read
    file: PathBuf,
    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Stop on a line table whose header length is inconsistent
    #[arg(long, default_value_t = false)]
    strict: bool,
    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long)]
    log_level: Option<LogLevel>,
}

fn main() -> ExitCode
{
    let cli = Cli::parse();

    let config = LogConfig::from_env().with_level(cli.log_level);
    let guard = match init_logging(&config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(path) = &guard.log_file {
        debug!(path = %path.display(), "logging to file");
    }

    let result = run(&cli);
    // Flush file logs before exiting
    drop(guard);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>>
{
    info!(file = %cli.file.display(), format = ?cli.format, strict = cli.strict, "reading debug sections");
    let map = SectionMap::load(&cli.file)?;
    let sections = map.debug_sections()?;
    let options = WalkOptions {
        strict_line_tables: cli.strict,
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match cli.format {
        OutputFormat::Text => {
            output::write_text_header(&mut out)?;
            for unit in UnitWalker::new(sections, options) {
                output::write_text_unit(&mut out, &unit?)?;
            }
        }
        OutputFormat::Json => {
            let report = walk_units(&sections, options)?;
            output::write_json(&mut out, &report)?;
        }
    }
    out.flush()?;
    Ok(())
}
