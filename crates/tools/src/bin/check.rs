//! Parses and validates a control program without running it.
//!
//! Usage: `check <program> [--config FILE]`

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{error, info, warn};

use cadence_runtime::validate_program;
use cadence_tools::{load_config, load_program};

#[derive(Parser, Debug)]
#[command(name = "check")]
#[command(about = "Parse and validate a cadence control program and report diagnostics")]
struct Args {
    /// Control program (text, or structured when ending in .yaml/.yml)
    program: PathBuf,

    /// Engine configuration YAML
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    cadence_tools::init_logging();

    let args = Args::parse();

    if !args.program.is_file() {
        error!("'{}' is not a file", args.program.display());
        process::exit(1);
    }

    let config = match load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };
    let types = config.type_registry();

    let program = match load_program(&args.program, &types) {
        Ok(p) => p,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    let mut ctx = config.validation_context(&types);
    let validated = validate_program(program.directives, &mut ctx);

    for directive in &validated.accepted {
        info!("  ok  {}", directive);
    }
    for message in &program.errors {
        error!("{}", message);
    }
    for rejected in &validated.rejected {
        warn!("  rejected  {}: {}", rejected.directive, rejected.reason);
    }

    info!(
        "{} accepted, {} rejected, {} unreadable",
        validated.accepted.len(),
        validated.rejected.len(),
        program.errors.len()
    );

    if !program.errors.is_empty() || !validated.rejected.is_empty() {
        process::exit(1);
    }
}
