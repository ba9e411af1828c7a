//! Cadence Runtime
//!
//! Command-group templates and their scheduled dispatch.
//!
//! A control program is a list of time-stamped [`Directive`]s. After
//! [`validate_program`] filters out malformed ones, a [`Scheduler`] is
//! stepped through simulation time: it builds [`CommandGroup`]s, binds their
//! placeholders, and on each repetition of an `execute_sequence` resolves
//! every enabled command and hands it to a [`Dispatcher`].

pub mod binding;
pub mod command_types;
pub mod config;
pub mod directive;
pub mod dispatch;
pub mod error;
pub mod group;
pub mod lattice;
pub mod registry;
pub mod scheduler;
pub mod types;
pub mod validate;

pub use binding::{BindingStrategy, Sequence};
pub use command_types::{CommandTypeDescriptor, CommandTypeRegistry, TypeRegistry};
pub use config::{ConfigError, EngineConfig, RunWindow};
pub use directive::{AxisTarget, Directive, DirectiveKind, LatticeBinding};
pub use dispatch::{DispatchRecord, Dispatcher, RecordingDispatcher};
pub use error::{Error, Result};
pub use group::{CommandGroup, CommandTemplate, ResolvedCommand};
pub use lattice::{Axis, Lattice, LatticeCoordinate, Packing};
pub use registry::GroupRegistry;
pub use scheduler::{DirectiveFailure, RunSummary, ScheduledSequence, Scheduler, SequenceState, StepReport};
pub use types::*;
pub use validate::{ValidatedProgram, ValidationContext, ValidationError, validate_program};
