//! End-to-end behavior engine tests: whole crate surface, multiple devices,
//! concurrency across invocations.

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;

use devsim::device::{DeviceStore, ValueMap};
use devsim::engine::BehaviorEngine;
use devsim::{check_script, parse_value_map, simulate};

fn write_script(
    dir: &TempDir,
    name: &str,
    body: &str,
) {
    fs::write(dir.path().join(name), body).expect("write script");
}

#[test]
fn test_thermostat_tick_end_to_end() {
    let dir = tempfile::tempdir().expect("scripts dir");
    write_script(
        &dir,
        "thermostat.rhai",
        r#"
            fn main(ctx, state, props) {
                let current = if "temperature" in state { state.temperature } else { 20.0 };
                log("current temperature: " + current);
                updateProperty(#{last_model: props.model});
                #{temperature: current + 0.5, unit: "C"}
            }
        "#,
    );

    let engine = BehaviorEngine::new(dir.path());
    let state = DeviceStore::new("state");
    let properties = DeviceStore::with_values(
        "properties",
        ValueMap::from([("model".to_string(), json!("thermostat-basic"))]),
    );

    engine.invoke("thermostat.rhai", &ValueMap::new(), &state, &properties);
    engine.invoke("thermostat.rhai", &ValueMap::new(), &state, &properties);

    assert_eq!(state.get("temperature"), Some(json!(21.0)));
    assert_eq!(state.get("unit"), Some(json!("C")));
    assert_eq!(properties.get("last_model"), Some(json!("thermostat-basic")));
}

#[test]
fn test_concurrent_devices_share_one_program() {
    let dir = tempfile::tempdir().expect("scripts dir");
    write_script(
        &dir,
        "serial.rhai",
        r#"
            fn main(ctx, state, props) {
                sleep(5);
                #{serial: ctx.device_id, ticks: (if "ticks" in state { state.ticks } else { 0 }) + 1}
            }
        "#,
    );

    let engine = Arc::new(BehaviorEngine::new(dir.path()));
    let devices: Vec<_> = (0..4)
        .map(|i| {
            (
                ValueMap::from([("device_id".to_string(), json!(format!("sim-{}", i)))]),
                Arc::new(DeviceStore::new(format!("state-{}", i))),
                Arc::new(DeviceStore::new(format!("properties-{}", i))),
            )
        })
        .collect();

    let mut handles = Vec::new();
    for (context, state, properties) in &devices {
        let engine = Arc::clone(&engine);
        let context = context.clone();
        let state = Arc::clone(state);
        let properties = Arc::clone(properties);
        handles.push(thread::spawn(move || {
            for _ in 0..5 {
                engine.invoke("serial.rhai", &context, &state, &properties);
            }
        }));
    }
    for handle in handles {
        handle.join().expect("device thread");
    }

    // One compiled program serves every device.
    assert_eq!(engine.cache().len(), 1);

    // Each device only ever saw its own state.
    for (i, (_, state, _)) in devices.iter().enumerate() {
        assert_eq!(state.get("serial"), Some(json!(format!("sim-{}", i))));
        assert_eq!(state.get("ticks"), Some(json!(5)));
    }
}

#[test]
fn test_missing_script_recovers_once_created() {
    let dir = tempfile::tempdir().expect("scripts dir");
    let engine = BehaviorEngine::new(dir.path());
    let state = DeviceStore::new("state");
    let properties = DeviceStore::new("properties");

    engine.invoke("late.rhai", &ValueMap::new(), &state, &properties);
    assert!(state.is_empty());

    write_script(
        &dir,
        "late.rhai",
        r#"
            fn main(ctx, state, props) {
                #{arrived: true}
            }
        "#,
    );
    engine.invoke("late.rhai", &ValueMap::new(), &state, &properties);
    assert_eq!(state.get("arrived"), Some(json!(true)));
}

#[test]
fn test_faulty_sibling_does_not_disturb_healthy_device() {
    let dir = tempfile::tempdir().expect("scripts dir");
    write_script(
        &dir,
        "healthy.rhai",
        r#"
            fn main(ctx, state, props) {
                #{beat: (if "beat" in state { state.beat } else { 0 }) + 1}
            }
        "#,
    );
    write_script(
        &dir,
        "faulty.rhai",
        r#"
            fn main(ctx, state, props) {
                throw "broken by design";
            }
        "#,
    );

    let engine = Arc::new(BehaviorEngine::new(dir.path()));
    let healthy_state = Arc::new(DeviceStore::new("healthy-state"));
    let faulty_state = Arc::new(DeviceStore::new("faulty-state"));

    let mut handles = Vec::new();
    for (script, state) in [("healthy.rhai", &healthy_state), ("faulty.rhai", &faulty_state)] {
        let engine = Arc::clone(&engine);
        let state = Arc::clone(state);
        handles.push(thread::spawn(move || {
            let properties = DeviceStore::new("properties");
            for _ in 0..10 {
                engine.invoke(script, &ValueMap::new(), &state, &properties);
            }
        }));
    }
    for handle in handles {
        handle.join().expect("device thread");
    }

    assert_eq!(healthy_state.get("beat"), Some(json!(10)));
    assert!(faulty_state.is_empty());
}

#[test]
fn test_simulate_runs_multiple_ticks() {
    let dir = tempfile::tempdir().expect("scripts dir");
    write_script(
        &dir,
        "counter.rhai",
        r#"
            fn main(ctx, state, props) {
                let c = if "counter" in state { state.counter } else { 0 };
                #{counter: c + 1}
            }
        "#,
    );

    let (state, properties) = simulate(
        dir.path(),
        "counter.rhai",
        &HashMap::new(),
        HashMap::new(),
        HashMap::new(),
        3,
        Duration::ZERO,
    )
    .expect("simulate");

    assert_eq!(state.get("counter"), Some(&json!(3)));
    assert!(properties.is_empty());
}

#[test]
fn test_simulate_reports_unusable_script() {
    let dir = tempfile::tempdir().expect("scripts dir");
    write_script(&dir, "broken.rhai", "fn main( {{{");

    let result = simulate(
        dir.path(),
        "broken.rhai",
        &HashMap::new(),
        HashMap::new(),
        HashMap::new(),
        1,
        Duration::ZERO,
    );
    assert!(result.is_err());
}

#[test]
fn test_check_script_paths() {
    let dir = tempfile::tempdir().expect("scripts dir");
    write_script(
        &dir,
        "good.rhai",
        r#"
            fn main(ctx, state, props) { #{} }
        "#,
    );
    write_script(&dir, "bad.rhai", "fn main( {{{");

    assert!(check_script(dir.path(), "good.rhai").is_ok());
    assert!(check_script(dir.path(), "bad.rhai").is_err());
    assert!(check_script(dir.path(), "absent.rhai").is_err());
}

#[test]
fn test_parse_value_map() {
    let parsed = parse_value_map(r#"{"device_id": "sim-1", "rate": 2}"#).expect("parse");
    assert_eq!(parsed.get("device_id"), Some(&json!("sim-1")));
    assert_eq!(parsed.get("rate"), Some(&json!(2)));

    assert!(parse_value_map("[1, 2, 3]").is_err());
    assert!(parse_value_map("not json").is_err());
}
