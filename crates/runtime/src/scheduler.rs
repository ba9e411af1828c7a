//! Step-driven directive scheduler
//!
//! Owns the group registry for a run and is polled once per simulation
//! step. Within a step, directives due at that step fire first, in input
//! order, then every running sequence dispatches the repetitions whose slot
//! falls on the step, in the order the sequences started.
//!
//! Nothing here blocks or runs in the background; a failing directive or
//! repetition is logged and skipped without affecting anything else.

use tracing::{debug, info, instrument, trace, warn};

use crate::binding::{BindingStrategy, Sequence};
use crate::command_types::TypeRegistry;
use crate::directive::{Directive, DirectiveKind, LatticeBinding};
use crate::dispatch::Dispatcher;
use crate::error::{Error, Result};
use crate::registry::GroupRegistry;
use crate::types::{CommandIndex, GroupName, SimTime};

/// Progress of one `execute_sequence`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceState {
    /// Started, no repetition run yet
    Pending,
    /// `completed` repetitions have run
    Running { completed: u32 },
    /// All repetitions have run
    Done,
}

/// Repeated dispatch of a group at a fixed period
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledSequence {
    group: GroupName,
    total: u32,
    period: u64,
    start: SimTime,
    state: SequenceState,
}

impl ScheduledSequence {
    /// A sequence with zero repetitions starts out done
    pub fn new(group: GroupName, total: u32, period: u64, start: SimTime) -> Self {
        let state = if total == 0 {
            SequenceState::Done
        } else {
            SequenceState::Pending
        };
        Self {
            group,
            total,
            period,
            start,
            state,
        }
    }

    pub fn group(&self) -> &GroupName {
        &self.group
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn state(&self) -> SequenceState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == SequenceState::Done
    }

    /// Simulation time of repetition `iteration`
    pub fn slot_time(&self, iteration: u32) -> SimTime {
        self.start
            .saturating_add(self.period.saturating_mul(iteration as u64))
    }

    /// Index of the next repetition to run
    pub fn next_iteration(&self) -> Option<u32> {
        match self.state {
            SequenceState::Pending => Some(0),
            SequenceState::Running { completed } => Some(completed),
            SequenceState::Done => None,
        }
    }

    /// Time of the next repetition
    pub fn next_due(&self) -> Option<SimTime> {
        self.next_iteration().map(|i| self.slot_time(i))
    }

    fn advance(&mut self) {
        let completed = self.next_iteration().map_or(self.total, |i| i + 1);
        self.state = if completed >= self.total {
            SequenceState::Done
        } else {
            SequenceState::Running { completed }
        };
    }
}

/// A directive or repetition that failed at run time
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveFailure {
    /// Text form of the directive (plus repetition for sequences)
    pub directive: String,
    pub error: Error,
}

/// What happened during one step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    pub time: SimTime,
    pub directives_fired: usize,
    pub directives_missed: usize,
    pub repetitions: usize,
    pub dispatched: usize,
    /// Dispatches the dispatcher reported as not run
    pub declined: usize,
    pub failures: Vec<DirectiveFailure>,
}

/// Totals over a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub steps: u64,
    pub directives_fired: usize,
    pub directives_missed: usize,
    pub repetitions: usize,
    pub dispatched: usize,
    pub declined: usize,
    pub failures: Vec<DirectiveFailure>,
}

impl RunSummary {
    fn absorb(&mut self, report: StepReport) {
        self.steps += 1;
        self.directives_fired += report.directives_fired;
        self.directives_missed += report.directives_missed;
        self.repetitions += report.repetitions;
        self.dispatched += report.dispatched;
        self.declined += report.declined;
        self.failures.extend(report.failures);
    }
}

/// Drives validated directives against a group registry
pub struct Scheduler<'r> {
    types: &'r dyn TypeRegistry,
    groups: GroupRegistry,
    directives: Vec<Directive>,
    next_directive: usize,
    sequences: Vec<ScheduledSequence>,
}

impl<'r> Scheduler<'r> {
    /// Create a scheduler for already validated directives
    pub fn new(types: &'r dyn TypeRegistry, mut directives: Vec<Directive>) -> Self {
        directives.sort_by_key(|d| d.at);
        info!(directives = directives.len(), "scheduler created");
        Self {
            types,
            groups: GroupRegistry::new(),
            directives,
            next_directive: 0,
            sequences: Vec::new(),
        }
    }

    pub fn groups(&self) -> &GroupRegistry {
        &self.groups
    }

    /// Consume the scheduler, keeping the groups it built
    pub fn into_groups(self) -> GroupRegistry {
        self.groups
    }

    /// Sequences started so far, in start order
    pub fn sequences(&self) -> &[ScheduledSequence] {
        &self.sequences
    }

    /// Directives that have not fired yet
    pub fn pending_directives(&self) -> &[Directive] {
        &self.directives[self.next_directive..]
    }

    /// True once every directive has fired and every sequence is done
    pub fn is_finished(&self) -> bool {
        self.pending_directives().is_empty() && self.sequences.iter().all(ScheduledSequence::is_done)
    }

    /// Earliest step at which something is still scheduled
    pub fn next_event_time(&self) -> Option<SimTime> {
        let directive = self.pending_directives().first().map(|d| d.at);
        let sequence = self.sequences.iter().filter_map(ScheduledSequence::next_due).min();
        match (directive, sequence) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Execute everything due at step `now`
    #[instrument(skip(self, dispatcher), fields(time = now))]
    pub fn execute_step(&mut self, now: SimTime, dispatcher: &mut dyn Dispatcher) -> StepReport {
        let mut report = StepReport {
            time: now,
            ..StepReport::default()
        };

        while let Some(directive) = self.directives.get(self.next_directive) {
            if directive.at > now {
                break;
            }
            let directive = directive.clone();
            self.next_directive += 1;

            if directive.at < now {
                warn!(directive = %directive, "directive missed its step");
                report.directives_missed += 1;
                continue;
            }

            report.directives_fired += 1;
            if let Err(error) = self.fire(&directive, now) {
                warn!(directive = %directive, %error, "directive failed");
                report.failures.push(DirectiveFailure {
                    directive: directive.to_string(),
                    error,
                });
            }
        }

        for sequence in &mut self.sequences {
            while let Some(due) = sequence.next_due() {
                if due > now {
                    break;
                }
                let Some(iteration) = sequence.next_iteration() else {
                    break;
                };
                if due < now {
                    warn!(group = %sequence.group, iteration, due, "repetition missed its step");
                } else {
                    report.repetitions += 1;
                    run_repetition(&self.groups, sequence, iteration, now, dispatcher, &mut report);
                }
                sequence.advance();
                if sequence.is_done() {
                    info!(group = %sequence.group, total = sequence.total, "sequence complete");
                }
            }
        }

        trace!(?report, "step complete");
        report
    }

    /// Step through `start..=end`, stopping early once nothing is left to do
    pub fn run(&mut self, start: SimTime, end: SimTime, dispatcher: &mut dyn Dispatcher) -> RunSummary {
        let mut summary = RunSummary::default();
        for now in start..=end {
            let report = self.execute_step(now, dispatcher);
            summary.absorb(report);
            if self.is_finished() {
                debug!(time = now, "schedule exhausted");
                break;
            }
        }
        info!(
            steps = summary.steps,
            dispatched = summary.dispatched,
            failures = summary.failures.len(),
            "run complete"
        );
        summary
    }

    fn fire(&mut self, directive: &Directive, now: SimTime) -> Result<()> {
        let name = directive.kind.keyword();
        match &directive.kind {
            DirectiveKind::CreateGroup { group } => {
                self.groups.create(group.clone())?;
                info!(directive = name, group = %group, "group created");
            }
            DirectiveKind::AddCommand {
                group,
                command_type,
                placeholders,
            } => {
                let index = self
                    .groups
                    .get_mut(group)?
                    .add_command(self.types, command_type, placeholders.clone())?;
                info!(directive = name, group = %group, command = %index, command_type = %command_type, "command added");
            }
            DirectiveKind::BindConstant {
                group,
                command,
                placeholder,
                value,
            } => {
                let index = command_index(*command)?;
                self.groups.get_mut(group)?.bind(
                    index,
                    placeholder.clone(),
                    BindingStrategy::Constant(value.clone()),
                )?;
                info!(directive = name, group = %group, command = %index, placeholder = %placeholder, "placeholder bound");
            }
            DirectiveKind::BindSequence {
                group,
                command,
                placeholder,
                initial,
                increment,
            } => {
                let index = command_index(*command)?;
                let sequence = Sequence::from_values(initial, increment).ok_or_else(|| {
                    Error::InvalidSequence {
                        initial: initial.clone(),
                        increment: increment.clone(),
                    }
                })?;
                self.groups.get_mut(group)?.bind(
                    index,
                    placeholder.clone(),
                    BindingStrategy::Sequence(sequence),
                )?;
                info!(directive = name, group = %group, command = %index, placeholder = %placeholder, "placeholder bound");
            }
            DirectiveKind::BindArgument {
                group,
                command,
                placeholder,
                source_command,
                source_placeholder,
            } => {
                let index = command_index(*command)?;
                let source = command_index(*source_command)?;
                self.groups.get_mut(group)?.bind(
                    index,
                    placeholder.clone(),
                    BindingStrategy::reference(source, source_placeholder.clone()),
                )?;
                info!(
                    directive = name,
                    group = %group,
                    command = %index,
                    placeholder = %placeholder,
                    source = %format!("{source}.{source_placeholder}"),
                    "placeholder bound"
                );
            }
            DirectiveKind::BindLattice2d(binding) => self.bind_lattice(name, binding, 2)?,
            DirectiveKind::BindLattice3d(binding) => self.bind_lattice(name, binding, 3)?,
            DirectiveKind::ToggleCommand { group, command } => {
                let index = command_index(*command)?;
                let enabled = self.groups.get_mut(group)?.toggle(index)?;
                info!(directive = name, group = %group, command = %index, enabled, "command toggled");
            }
            DirectiveKind::ToggleAll { group } => {
                let group_ref = self.groups.get_mut(group)?;
                group_ref.toggle_all();
                info!(directive = name, group = %group, commands = group_ref.len(), "commands toggled");
            }
            DirectiveKind::EnableCommand { group, command }
            | DirectiveKind::DisableCommand { group, command } => {
                let enabled = matches!(directive.kind, DirectiveKind::EnableCommand { .. });
                let index = command_index(*command)?;
                self.groups.get_mut(group)?.set_enabled(index, enabled)?;
                info!(directive = name, group = %group, command = %index, enabled, "command enabled flag set");
            }
            DirectiveKind::EnableAll { group } | DirectiveKind::DisableAll { group } => {
                let enabled = matches!(directive.kind, DirectiveKind::EnableAll { .. });
                let group_ref = self.groups.get_mut(group)?;
                group_ref.set_all_enabled(enabled);
                info!(directive = name, group = %group, commands = group_ref.len(), enabled, "command enabled flags set");
            }
            DirectiveKind::ExecuteSequence {
                group,
                total,
                period,
            } => {
                self.groups.get(group)?;
                let total = u32::try_from(*total)
                    .ok()
                    .filter(|t| *t >= 1)
                    .ok_or(Error::InvalidRepetitionCount(*total))?;
                let period = u64::try_from(*period).map_err(|_| Error::InvalidPeriod(*period))?;
                self.sequences
                    .push(ScheduledSequence::new(group.clone(), total, period, now));
                info!(directive = name, group = %group, total, period, start = now, "sequence scheduled");
            }
        }
        Ok(())
    }

    fn bind_lattice(&mut self, name: &str, binding: &LatticeBinding, rank: usize) -> Result<()> {
        for target in &binding.targets {
            command_index(target.command)?;
        }
        let coordinates = binding
            .coordinates(rank)
            .ok_or(Error::InvalidLattice { rank })?;
        let group = self.groups.get_mut(&binding.group)?;

        // All targets must exist before any axis is bound
        for (index, placeholder, _) in &coordinates {
            let exists = group
                .command(*index)
                .is_some_and(|c| c.has_placeholder(placeholder));
            if !exists {
                return Err(Error::UnknownCommandOrPlaceholder {
                    command: *index,
                    placeholder: (*placeholder).clone(),
                });
            }
        }

        for (index, placeholder, coordinate) in coordinates {
            let axis = coordinate.axis;
            group.bind(index, placeholder.clone(), BindingStrategy::Lattice(coordinate))?;
            info!(
                directive = name,
                group = %binding.group,
                command = %index,
                placeholder = %placeholder,
                %axis,
                "placeholder bound"
            );
        }
        Ok(())
    }
}

fn command_index(raw: i64) -> Result<CommandIndex> {
    CommandIndex::new(raw).ok_or(Error::InvalidCommandIndex(raw))
}

fn run_repetition(
    groups: &GroupRegistry,
    sequence: &ScheduledSequence,
    iteration: u32,
    now: SimTime,
    dispatcher: &mut dyn Dispatcher,
    report: &mut StepReport,
) {
    let resolved = groups
        .get(&sequence.group)
        .and_then(|group| group.resolve(iteration));

    let commands = match resolved {
        Ok(commands) => commands,
        Err(error) => {
            warn!(group = %sequence.group, iteration, %error, "directive failed");
            report.failures.push(DirectiveFailure {
                directive: format!(
                    "execute_sequence {} {} repetition {iteration}",
                    sequence.start, sequence.group
                ),
                error,
            });
            return;
        }
    };

    for (index, command) in commands {
        debug!(
            group = %sequence.group,
            command = %index,
            command_type = %command.type_name,
            iteration,
            time = now,
            "dispatching command"
        );
        report.dispatched += 1;
        if !dispatcher.execute(&command.type_name, &command.arguments, now) {
            warn!(group = %sequence.group, command = %index, time = now, "command did not run");
            report.declined += 1;
        }
    }
}
