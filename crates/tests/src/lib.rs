//! Integration test harness for cadence.
//!
//! This crate provides utilities for end-to-end testing of the full
//! pipeline: Parse → Validate → Schedule → Dispatch → Verify.

use cadence_dsl::ParseError;
use cadence_runtime::{
    CommandTypeRegistry, DispatchRecord, Directive, EngineConfig, GroupRegistry,
    RecordingDispatcher, RunSummary, Scheduler, SimTime, ValidationError, validate_program,
};

/// Command types available to harness programs unless a config says otherwise
pub const DEFAULT_TYPES: &[(&str, u32)] = &[("Probe", 2), ("Single", 1), ("Pulse", 0), ("Point3", 3)];

/// Test harness for running control programs from source.
pub struct TestHarness {
    types: CommandTypeRegistry,
    accepted: Vec<Directive>,
    rejected: Vec<ValidationError>,
    parse_errors: Vec<ParseError>,
    dispatcher: RecordingDispatcher,
    groups: GroupRegistry,
    summary: RunSummary,
}

impl TestHarness {
    /// Create a harness from text source using [`DEFAULT_TYPES`].
    ///
    /// # Panics
    ///
    /// Panics if the source does not lex or any directive fails to parse.
    pub fn from_source(source: &str) -> Self {
        let harness = Self::with_config(Self::default_config(), source);
        assert!(
            harness.parse_errors.is_empty(),
            "Parsing failed: {:?}",
            harness.parse_errors
        );
        harness
    }

    /// Create a harness from an engine config YAML and text source.
    ///
    /// Parse errors are kept, see [`TestHarness::parse_errors`].
    ///
    /// # Panics
    ///
    /// Panics if the config is invalid or the source does not lex.
    pub fn from_config(config_yaml: &str, source: &str) -> Self {
        let config = EngineConfig::from_yaml_str(config_yaml).expect("invalid engine config");
        Self::with_config(config, source)
    }

    /// Create a harness from a structured (YAML) program using [`DEFAULT_TYPES`].
    ///
    /// # Panics
    ///
    /// Panics if the YAML is not a list or any entry is malformed.
    pub fn from_structured(yaml: &str) -> Self {
        let program = cadence_dsl::parse_structured(yaml).expect("invalid structured program");
        assert!(program.is_clean(), "malformed entries: {:?}", program.errors);
        Self::from_directives(Self::default_config(), program.directives, Vec::new())
    }

    fn default_config() -> EngineConfig {
        DEFAULT_TYPES
            .iter()
            .fold(EngineConfig::default(), |config, (name, arity)| {
                config.with_command_type(*name, *arity)
            })
    }

    fn with_config(config: EngineConfig, source: &str) -> Self {
        let types = config.type_registry();
        let parsed = cadence_dsl::parse(source, &types).expect("source failed to lex");
        Self::from_directives(config, parsed.directives, parsed.errors)
    }

    fn from_directives(config: EngineConfig, directives: Vec<Directive>, parse_errors: Vec<ParseError>) -> Self {
        let types = config.type_registry();
        let validated = {
            let mut ctx = config.validation_context(&types);
            validate_program(directives, &mut ctx)
        };

        Self {
            types,
            accepted: validated.accepted,
            rejected: validated.rejected,
            parse_errors,
            dispatcher: RecordingDispatcher::new(),
            groups: GroupRegistry::new(),
            summary: RunSummary::default(),
        }
    }

    /// Run the accepted directives over steps `start..=end`.
    ///
    /// Each call starts from an empty registry.
    pub fn run(&mut self, start: SimTime, end: SimTime) -> &RunSummary {
        self.dispatcher = RecordingDispatcher::new();
        let mut scheduler = Scheduler::new(&self.types, self.accepted.clone());
        self.summary = scheduler.run(start, end, &mut self.dispatcher);
        self.groups = scheduler.into_groups();
        &self.summary
    }

    /// Directives that passed validation, in firing order
    pub fn accepted(&self) -> &[Directive] {
        &self.accepted
    }

    pub fn rejected(&self) -> &[ValidationError] {
        &self.rejected
    }

    pub fn parse_errors(&self) -> &[ParseError] {
        &self.parse_errors
    }

    /// Everything dispatched by the last run
    pub fn dispatches(&self) -> &[DispatchRecord] {
        self.dispatcher.records()
    }

    /// Distinct dispatch times of the last run
    pub fn dispatch_times(&self) -> Vec<SimTime> {
        self.dispatcher.times()
    }

    /// Real-valued argument `arg` of every dispatch, in order
    pub fn real_arguments(&self, arg: usize) -> Vec<f64> {
        self.dispatches()
            .iter()
            .filter_map(|r| r.arguments.get(arg).and_then(|v| v.as_real()))
            .collect()
    }

    /// Groups as they stood at the end of the last run
    pub fn groups(&self) -> &GroupRegistry {
        &self.groups
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }
}
