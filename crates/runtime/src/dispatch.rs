//! Command dispatch
//!
//! The engine never performs a command's simulation effect itself; it hands
//! each fully resolved command to a [`Dispatcher`].

use serde::{Deserialize, Serialize};

use crate::types::{ArgumentValue, SimTime};

/// Executes one fully bound command at a given simulation time.
pub trait Dispatcher {
    /// Returns whether the command actually ran at `at`.
    fn execute(&mut self, type_name: &str, arguments: &[ArgumentValue], at: SimTime) -> bool;
}

/// One dispatched command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRecord {
    pub time: SimTime,
    pub command_type: String,
    pub arguments: Vec<ArgumentValue>,
}

/// Dispatcher that keeps every command it receives
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    records: Vec<DispatchRecord>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[DispatchRecord] {
        &self.records
    }

    /// Records dispatched at exactly `time`
    pub fn at(&self, time: SimTime) -> impl Iterator<Item = &DispatchRecord> {
        self.records.iter().filter(move |r| r.time == time)
    }

    /// Distinct dispatch times, ascending
    pub fn times(&self) -> Vec<SimTime> {
        let mut times: Vec<SimTime> = self.records.iter().map(|r| r.time).collect();
        times.dedup();
        times
    }

    pub fn take(&mut self) -> Vec<DispatchRecord> {
        std::mem::take(&mut self.records)
    }
}

impl Dispatcher for RecordingDispatcher {
    fn execute(&mut self, type_name: &str, arguments: &[ArgumentValue], at: SimTime) -> bool {
        self.records.push(DispatchRecord {
            time: at,
            command_type: type_name.to_string(),
            arguments: arguments.to_vec(),
        });
        true
    }
}
