//! Executes a control program against the command-group scheduler.
//!
//! Usage: `run <program> [--config FILE] [--start T] [--end T] [--output FILE]`

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{error, info, warn};

use cadence_runtime::{Scheduler, validate_program};
use cadence_tools::{TracingDispatcher, load_config, load_program};

#[derive(Parser, Debug)]
#[command(name = "run")]
#[command(about = "Run a cadence control program and dispatch its command groups")]
struct Args {
    /// Control program (text, or structured when ending in .yaml/.yml)
    program: PathBuf,

    /// Engine configuration YAML (command types, capability flags, run window)
    #[arg(long)]
    config: Option<PathBuf>,

    /// First simulation step (defaults to the config's run window)
    #[arg(long)]
    start: Option<u64>,

    /// Last simulation step, inclusive (defaults to the config's run window)
    #[arg(long)]
    end: Option<u64>,

    /// Write every dispatched command to this file as JSON lines
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() {
    cadence_tools::init_logging();

    let args = Args::parse();

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
    for message in &program.errors {
        warn!("{}", message);
    }

    let mut ctx = config.validation_context(&types);
    let validated = validate_program(program.directives, &mut ctx);
    info!(
        accepted = validated.accepted.len(),
        rejected = validated.rejected.len(),
        "program validated"
    );

    let mut dispatcher = TracingDispatcher::new();
    if let Some(ref path) = args.output {
        match File::create(path) {
            Ok(file) => {
                info!("Writing dispatches to {}", path.display());
                dispatcher = dispatcher.with_output(Box::new(BufWriter::new(file)));
            }
            Err(e) => {
                error!("Failed to create '{}': {}", path.display(), e);
                process::exit(1);
            }
        }
    }

    let start = args.start.unwrap_or(config.run.start);
    let end = args.end.unwrap_or(config.run.end);
    if end < start {
        error!("End step {} is before start step {}", end, start);
        process::exit(1);
    }

    let mut scheduler = Scheduler::new(&types, validated.accepted);
    let summary = scheduler.run(start, end, &mut dispatcher);

    if let Err(e) = dispatcher.flush() {
        error!("Failed to flush output: {}", e);
        process::exit(1);
    }

    info!("Run complete");
    info!("  - Steps: {}", summary.steps);
    info!("  - Directives fired: {}", summary.directives_fired);
    info!("  - Repetitions: {}", summary.repetitions);
    info!("  - Commands dispatched: {}", summary.dispatched);
    if summary.directives_missed > 0 {
        warn!("  - Directives outside the run window: {}", summary.directives_missed);
    }
    for failure in &summary.failures {
        warn!("  - {}: {}", failure.directive, failure.error);
    }
    if !scheduler.is_finished() {
        warn!(
            next = ?scheduler.next_event_time(),
            "run window ended with work still scheduled"
        );
    }
}
