//! Dispatcher used by the command-line runner
//!
//! There is no simulation behind the CLI: each dispatched command is logged
//! and, when an output is attached, written as one JSON object per line.

use std::io::Write;

use cadence_runtime::{ArgumentValue, DispatchRecord, Dispatcher, SimTime};
use tracing::{info, warn};

/// Logs every command and optionally writes it out as JSON lines
pub struct TracingDispatcher {
    output: Option<Box<dyn Write>>,
    dispatched: usize,
}

impl TracingDispatcher {
    pub fn new() -> Self {
        Self {
            output: None,
            dispatched: 0,
        }
    }

    /// Also write each command to `output` as a JSON line
    pub fn with_output(mut self, output: Box<dyn Write>) -> Self {
        self.output = Some(output);
        self
    }

    pub fn dispatched(&self) -> usize {
        self.dispatched
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        match self.output.as_mut() {
            Some(out) => out.flush(),
            None => Ok(()),
        }
    }

    fn write_record(out: &mut dyn Write, record: &DispatchRecord) -> std::io::Result<()> {
        serde_json::to_writer(&mut *out, record)?;
        out.write_all(b"\n")
    }
}

impl Default for TracingDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher for TracingDispatcher {
    fn execute(&mut self, type_name: &str, arguments: &[ArgumentValue], at: SimTime) -> bool {
        let args = arguments
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        info!(time = at, command_type = type_name, arguments = %args, "dispatch");

        if let Some(out) = self.output.as_mut() {
            let record = DispatchRecord {
                time: at,
                command_type: type_name.to_string(),
                arguments: arguments.to_vec(),
            };
            if let Err(e) = Self::write_record(out.as_mut(), &record) {
                warn!(error = %e, "failed to write dispatch record");
                return false;
            }
        }

        self.dispatched += 1;
        true
    }
}
