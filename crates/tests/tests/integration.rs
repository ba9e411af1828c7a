//! Integration tests for end-to-end control program execution.
//!
//! These tests verify the full pipeline:
//! Parse → Validate → Schedule → Dispatch → Verify

use cadence_runtime::{ArgumentValue, CommandIndex, Error, GroupName};
use cadence_tests::TestHarness;

const PROBE_GROUP: &str = "
    create_group 0 G1
    add_command 0 G1 Probe X Y
    bind_sequence 0 G1 1 X 0.0 1.0
    bind_constant 0 G1 1 Y 5.0
";

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

fn points(harness: &TestHarness) -> Vec<(f64, f64)> {
    harness
        .real_arguments(0)
        .into_iter()
        .zip(harness.real_arguments(1))
        .collect()
}

/// The Probe scenario: a sequence on X, a constant on Y, three repetitions.
#[test]
fn test_probe_sequence_end_to_end() {
    let source = format!("{PROBE_GROUP}\nexecute_sequence 100 G1 3 10");
    let mut harness = TestHarness::from_source(&source);

    let summary = harness.run(0, 500).clone();
    assert!(summary.failures.is_empty());
    assert_eq!(summary.dispatched, 3);

    let dispatched: Vec<_> = harness
        .dispatches()
        .iter()
        .map(|r| (r.time, r.command_type.as_str(), r.arguments.clone()))
        .collect();
    assert_eq!(
        dispatched,
        vec![
            (100, "Probe", vec![ArgumentValue::Real(0.0), ArgumentValue::Real(5.0)]),
            (110, "Probe", vec![ArgumentValue::Real(1.0), ArgumentValue::Real(5.0)]),
            (120, "Probe", vec![ArgumentValue::Real(2.0), ArgumentValue::Real(5.0)]),
        ]
    );
}

#[test]
fn test_sequence_dispatches_only_on_its_slots() {
    let source = format!("{PROBE_GROUP}\nexecute_sequence 100 G1 3 10");
    let mut harness = TestHarness::from_source(&source);
    harness.run(0, 500);

    assert_eq!(harness.dispatch_times(), vec![100, 110, 120]);
    assert!(harness.dispatches().iter().all(|r| r.time >= 100 && r.time <= 120));
}

#[test]
fn test_disable_before_second_repetition() {
    let source = format!(
        "{PROBE_GROUP}
        execute_sequence 100 G1 3 10
        disable_command 105 G1 1
        enable_command 115 G1 1"
    );
    let mut harness = TestHarness::from_source(&source);
    harness.run(0, 500);

    assert_eq!(harness.dispatch_times(), vec![100, 120]);
    // Repetition indices keep counting while the command is off
    assert_eq!(harness.real_arguments(0), vec![0.0, 2.0]);
}

#[test]
fn test_toggle_on_repetition_step_applies_first() {
    let source = format!(
        "{PROBE_GROUP}
        execute_sequence 100 G1 3 10
        toggle_command 110 G1 1
        toggle_command 120 G1 1"
    );
    let mut harness = TestHarness::from_source(&source);
    let summary = harness.run(0, 500).clone();

    assert_eq!(harness.dispatch_times(), vec![100, 120]);
    assert_eq!(summary.repetitions, 3);
}

#[test]
fn test_toggle_twice_is_idempotent() {
    let source = format!(
        "{PROBE_GROUP}
        toggle_command 50 G1 1
        toggle_command 50 G1 1
        toggle_all 60 G1
        toggle_all 60 G1
        execute_sequence 100 G1 1 10"
    );
    let mut harness = TestHarness::from_source(&source);
    harness.run(0, 500);

    assert_eq!(harness.dispatch_times(), vec![100]);
    let group = harness.groups().get(&GroupName::from("G1")).unwrap();
    assert!(group.command(CommandIndex::FIRST).unwrap().is_enabled());
}

#[test]
fn test_create_then_lookup_is_empty() {
    let mut harness = TestHarness::from_source("create_group 0 G1");
    harness.run(0, 10);

    let group = harness.groups().get(&GroupName::from("G1")).unwrap();
    assert!(group.is_empty());
    assert_eq!(harness.groups().len(), 1);
}

#[test]
fn test_group_name_used_twice() {
    let mut harness = TestHarness::from_source("create_group 0 G1\ncreate_group 5 G1");
    assert_eq!(harness.accepted().len(), 1);
    assert_eq!(harness.rejected().len(), 1);
    assert!(harness.rejected()[0].reason.contains("already in use"));

    harness.run(0, 10);
    assert_eq!(harness.groups().len(), 1);
}

#[test]
fn test_add_command_arity_mismatch_for_every_arity() {
    let types = [("Pulse", 0usize), ("Single", 1), ("Probe", 2), ("Point3", 3)];
    for (type_name, arity) in types {
        for count in 0..=4usize {
            let names: Vec<String> = (0..count).map(|i| format!("p{i}")).collect();
            let yaml = format!(
                "- {{ directive: create_group, at: 0, group: G }}\n\
                 - {{ directive: add_command, at: 0, group: G, command_type: {type_name}, placeholders: [{}] }}\n",
                names.join(", ")
            );
            let mut harness = TestHarness::from_structured(&yaml);
            harness.run(0, 1);

            let group = harness.groups().get(&GroupName::from("G")).unwrap();
            if count == arity {
                assert!(harness.rejected().is_empty(), "{type_name} with {count}");
                assert_eq!(group.len(), 1, "{type_name} with {count}");
            } else {
                assert_eq!(harness.rejected().len(), 1, "{type_name} with {count}");
                assert!(group.is_empty(), "{type_name} with {count}");
            }
        }
    }
}

#[test]
fn test_later_binding_wins() {
    let source = "
        create_group 0 G
        add_command 0 G Single V
        bind_constant 0 G 1 V 1
        bind_constant 0 G 1 V 2
        bind_constant 5 G 1 V 3
        execute_sequence 3 G 1 1
        execute_sequence 6 G 1 1
    ";
    let mut harness = TestHarness::from_source(source);
    harness.run(0, 10);

    let values: Vec<_> = harness.dispatches().iter().map(|r| r.arguments[0].clone()).collect();
    assert_eq!(values, vec![ArgumentValue::Integer(2), ArgumentValue::Integer(3)]);
}

#[test]
fn test_integer_sequences() {
    for (initial, step) in [(10i64, 3i64), (10, 0), (10, -3)] {
        let source = format!(
            "create_group 0 G
             add_command 0 G Single V
             bind_sequence 0 G 1 V {initial} {step}
             execute_sequence 1 G 5 1"
        );
        let mut harness = TestHarness::from_source(&source);
        harness.run(0, 10);

        let values: Vec<_> = harness.dispatches().iter().map(|r| r.arguments[0].clone()).collect();
        let expected: Vec<_> = (0..5)
            .map(|i| ArgumentValue::Integer(initial + i * step))
            .collect();
        assert_eq!(values, expected, "initial {initial}, step {step}");
    }
}

#[test]
fn test_real_sequences() {
    for (initial, step) in [(0.5, 0.25), (2.0, 0.0), (1.0, -0.5)] {
        let source = format!(
            "create_group 0 G
             add_command 0 G Single V
             bind_sequence 0 G 1 V {initial:?} {step:?}
             execute_sequence 1 G 5 1"
        );
        let mut harness = TestHarness::from_source(&source);
        harness.run(0, 10);

        let values = harness.real_arguments(0);
        assert_eq!(values.len(), 5);
        for (i, v) in values.into_iter().enumerate() {
            assert_close(v, initial + i as f64 * step);
        }
    }
}

#[test]
fn test_legacy_sequence_validation() {
    let source = "
        create_group 0 G
        add_command 0 G Single V
        bind_sequence 0 G 1 V 1.0 -0.5
        execute_sequence 1 G 2 1
    ";
    let config = "
kind: EngineConfig
legacySequenceValidation: true
commandTypes:
  Single: 1
";
    let mut harness = TestHarness::from_config(config, source);
    assert_eq!(harness.rejected().len(), 1);

    // Without the binding every repetition fails to resolve
    let summary = harness.run(0, 10).clone();
    assert_eq!(summary.failures.len(), 2);
    assert!(harness.dispatches().is_empty());
}

#[test]
fn test_reference_tracks_source() {
    let source = "
        create_group 0 G
        add_command 0 G Probe X Y
        add_command 0 G Single V
        bind_argument 0 G 2 V 1 X
        bind_sequence 0 G 1 X 3 4
        bind_constant 0 G 1 Y 0
        execute_sequence 10 G 4 2
    ";
    let mut harness = TestHarness::from_source(source);
    harness.run(0, 50);

    let records = harness.dispatches();
    assert_eq!(records.len(), 8);
    for pair in records.chunks(2) {
        assert_eq!(pair[0].time, pair[1].time);
        assert_eq!(pair[0].command_type, "Probe");
        assert_eq!(pair[1].command_type, "Single");
        assert_eq!(pair[0].arguments[0], pair[1].arguments[0]);
    }
}

#[test]
fn test_reference_cycle_is_rejected_each_repetition() {
    let source = "
        create_group 0 G
        add_command 0 G Single V
        add_command 0 G Single W
        bind_argument 0 G 1 V 2 W
        bind_argument 0 G 2 W 1 V
        execute_sequence 1 G 3 1
    ";
    let mut harness = TestHarness::from_source(source);
    let summary = harness.run(0, 10).clone();

    assert!(harness.dispatches().is_empty());
    assert_eq!(summary.failures.len(), 3);
    assert!(
        summary
            .failures
            .iter()
            .all(|f| matches!(f.error, Error::CyclicBinding { .. }))
    );
}

#[test]
fn test_self_reference_is_a_cycle() {
    let source = "
        create_group 0 G
        add_command 0 G Single V
        bind_argument 0 G 1 V 1 V
        execute_sequence 1 G 1 1
    ";
    let mut harness = TestHarness::from_source(source);
    let summary = harness.run(0, 10).clone();
    assert_eq!(summary.failures.len(), 1);
    assert!(summary.failures[0].error.to_string().contains("1.V -> 1.V"));
}

#[test]
fn test_rectangular_lattice_covers_grid() {
    let source = "
        create_group 0 G
        add_command 0 G Probe X Y
        bind_lattice2d 0 G 1 X 1 Y 3 2 0 0 2 1
        execute_sequence 0 G 6 1
    ";
    let mut harness = TestHarness::from_source(source);
    harness.run(0, 20);

    let got = points(&harness);
    assert_eq!(got.len(), 6);

    let (sx, sy) = (2.0 / 3.0, 0.5);
    let expected = [
        (0.0, 0.0),
        (sx, 0.0),
        (2.0 * sx, 0.0),
        (0.0, sy),
        (sx, sy),
        (2.0 * sx, sy),
    ];
    for ((x, y), (ex, ey)) in got.iter().zip(expected) {
        assert_close(*x, ex);
        assert_close(*y, ey);
    }
    for (i, a) in got.iter().enumerate() {
        for b in &got[i + 1..] {
            assert!(a != b, "duplicate point {a:?}");
        }
    }
}

#[test]
fn test_triangular_lattice_offsets_odd_rows() {
    let program = |packing: &str| {
        format!(
            "create_group 0 G
             add_command 0 G Probe X Y
             bind_lattice2d 0 G 1 X 1 Y 3 2 0 0 2 1 {packing}
             execute_sequence 0 G 6 1"
        )
    };
    let mut rect = TestHarness::from_source(&program("rectangular"));
    rect.run(0, 20);
    let mut tri = TestHarness::from_source(&program("triangular"));
    tri.run(0, 20);

    let half = (2.0 / 3.0) / 2.0;
    for (i, (r, t)) in points(&rect).into_iter().zip(points(&tri)).enumerate() {
        assert_close(t.1, r.1);
        if i / 3 == 1 {
            assert_close(t.0, r.0 + half);
        } else {
            assert_close(t.0, r.0);
        }
    }
}

#[test]
fn test_lattice_wraps_after_all_points() {
    let source = "
        create_group 0 G
        add_command 0 G Probe X Y
        bind_lattice2d 0 G 1 X 1 Y 2 2 1 1 2 2
        execute_sequence 0 G 6 1
    ";
    let mut harness = TestHarness::from_source(source);
    harness.run(0, 20);

    let got = points(&harness);
    assert_eq!(got[4], got[0]);
    assert_eq!(got[5], got[1]);
    assert_eq!(got[0], (1.0, 1.0));
}

#[test]
fn test_spatial_lattice_has_distinct_points() {
    let source = "
        create_group 0 G
        add_command 0 G Point3 X Y Z
        bind_lattice3d 0 G 1 X 1 Y 1 Z 2 2 2 0 0 0 1 1 1
        execute_sequence 0 G 8 1
    ";
    let mut harness = TestHarness::from_source(source);
    harness.run(0, 20);

    let zs = harness.real_arguments(2);
    assert_eq!(zs.len(), 8);
    assert_eq!(&zs[..4], &[0.0; 4]);
    assert_eq!(&zs[4..], &[0.5; 4]);

    let mut triples: Vec<_> = harness
        .dispatches()
        .iter()
        .map(|r| format!("{:?}", r.arguments))
        .collect();
    triples.sort();
    triples.dedup();
    assert_eq!(triples.len(), 8);
}

#[test]
fn test_disabled_engine_dispatches_nothing() {
    let config = "
kind: EngineConfig
enabled: false
commandTypes:
  Probe: 2
";
    let source = format!("{PROBE_GROUP}\nexecute_sequence 100 G1 3 10");
    let mut harness = TestHarness::from_config(config, &source);

    assert!(harness.accepted().is_empty());
    assert_eq!(harness.rejected().len(), 5);
    harness.run(0, 500);
    assert!(harness.dispatches().is_empty());
    assert!(harness.groups().is_empty());
}

#[test]
fn test_unknown_type_in_config_fails_parse() {
    let config = "commandTypes:\n  Pulse: 0\n";
    let harness = TestHarness::from_config(config, "create_group 0 G\nadd_command 0 G Probe X Y");
    assert_eq!(harness.parse_errors().len(), 1);
    assert_eq!(harness.accepted().len(), 1);
}

#[test]
fn test_missing_group_does_not_stop_the_run() {
    let source = format!(
        "{PROBE_GROUP}
        toggle_all 10 Nowhere
        execute_sequence 20 Nowhere 2 1
        execute_sequence 30 G1 2 5"
    );
    let mut harness = TestHarness::from_source(&source);
    let summary = harness.run(0, 100).clone();

    assert_eq!(summary.failures.len(), 2);
    assert_eq!(harness.dispatch_times(), vec![30, 35]);
}

#[test]
fn test_structured_program_matches_text() {
    let text = format!("{PROBE_GROUP}\nexecute_sequence 100 G1 3 10");
    let mut from_text = TestHarness::from_source(&text);
    from_text.run(0, 200);

    let mut from_yaml = TestHarness::from_structured(
        r#"
- { directive: create_group, at: 0, group: G1 }
- { directive: add_command, at: 0, group: G1, command_type: Probe, placeholders: [X, Y] }
- { directive: bind_sequence, at: 0, group: G1, command: 1, placeholder: X, initial: 0.0, increment: 1.0 }
- { directive: bind_constant, at: 0, group: G1, command: 1, placeholder: Y, value: 5.0 }
- { directive: execute_sequence, at: 100, group: G1, total: 3, period: 10 }
"#,
    );
    from_yaml.run(0, 200);

    assert_eq!(from_text.dispatches(), from_yaml.dispatches());
}
