//! CLI integration tests
//!
//! These run the `snowstorm` binary against definitions written to a
//! temporary directory.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const PUFF: &str = r#"{
    "format_version": "1.10.0",
    "particle_effect": {
        "description": {
            "identifier": "demo:puff",
            "basic_render_parameters": { "material": "particles_add", "texture": "textures/particle/particles" }
        },
        "components": {
            "minecraft:emitter_rate_instant": { "num_particles": 5 },
            "minecraft:emitter_lifetime_once": { "active_time": 10 },
            "minecraft:emitter_shape_sphere": { "radius": 1 },
            "minecraft:particle_lifetime_expression": { "max_lifetime": 100 },
            "minecraft:particle_motion_dynamic": { "linear_acceleration": [0, -1, 0] },
            "custom:sparkle": {}
        },
        "curves": {
            "variable.fade": { "type": "linear", "input": "v.particle_age", "nodes": [1, 0] }
        }
    }
}"#;

const EMBER: &str = r#"{
    "format_version": "1.10.0",
    "particle_effect": {
        "description": { "identifier": "demo:ember" },
        "components": {
            "minecraft:emitter_rate_steady": { "spawn_rate": 20, "max_particles": 3 },
            "minecraft:particle_lifetime_expression": { "max_lifetime": 100 }
        }
    }
}"#;

fn snowstorm() -> Command {
    Command::cargo_bin("snowstorm").unwrap()
}

fn write_effect(dir: &Path, name: &str, json: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, json).unwrap();
    path
}

#[test]
fn test_molang_eval_precedence() {
    snowstorm()
        .args(["molang", "eval", "2+3*4"])
        .assert()
        .success()
        .stdout("14\n");
}

#[test]
fn test_molang_eval_with_variables() {
    snowstorm()
        .args(["molang", "eval", "v.speed * variable.time + 1"])
        .args(["--var", "v.speed=3", "--var", "variable.time=0.5"])
        .assert()
        .success()
        .stdout("2.5\n");
}

#[test]
fn test_molang_eval_negative_literal() {
    snowstorm()
        .args(["molang", "eval", "-4 * math.abs(-2)"])
        .assert()
        .success()
        .stdout("-8\n");
}

#[test]
fn test_molang_eval_rejects_bad_binding() {
    snowstorm()
        .args(["molang", "eval", "v.x", "--var", "v.x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NAME=VALUE"));
}

#[test]
fn test_molang_parse_prints_canonical_form() {
    snowstorm()
        .args(["molang", "parse", "v.age*2"])
        .assert()
        .success()
        .stdout("(variable.age * 2)\n");
}

#[test]
fn test_effect_info_single_file() {
    let dir = TempDir::new().unwrap();
    let path = write_effect(dir.path(), "puff.particle.json", PUFF);

    snowstorm()
        .args(["effect", "info"])
        .arg(&path)
        .arg("--components")
        .assert()
        .success()
        .stdout(predicate::str::contains("Identifier: demo:puff"))
        .stdout(predicate::str::contains("Material: particles_add"))
        .stdout(predicate::str::contains("Components: 6 (1 unsupported)"))
        .stdout(predicate::str::contains("Curves: 1"))
        .stdout(predicate::str::contains("custom:sparkle"));
}

#[test]
fn test_effect_info_directory() {
    let dir = TempDir::new().unwrap();
    write_effect(dir.path(), "puff.particle.json", PUFF);
    write_effect(dir.path(), "ember.particle.json", EMBER);

    snowstorm()
        .args(["effect", "info"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("demo:puff"))
        .stdout(predicate::str::contains("demo:ember"));
}

#[test]
fn test_effect_info_missing_file() {
    snowstorm()
        .args(["effect", "info", "/nonexistent/puff.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No such file or directory"));
}

#[test]
fn test_effect_simulate_summary() {
    let dir = TempDir::new().unwrap();
    let path = write_effect(dir.path(), "puff.particle.json", PUFF);

    snowstorm()
        .args(["effect", "simulate"])
        .arg(&path)
        .args(["--ticks", "3", "--seed", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("demo:puff"))
        .stdout(predicate::str::contains("1 emitters (0 pending), 5 particles after 3 ticks"));
}

#[test]
fn test_effect_simulate_json() {
    let dir = TempDir::new().unwrap();
    write_effect(dir.path(), "puff.particle.json", PUFF);
    write_effect(dir.path(), "ember.particle.json", EMBER);

    let output = snowstorm()
        .args(["effect", "simulate"])
        .arg(dir.path())
        .args(["--effect", "ember", "--ticks", "20", "--seed", "9", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["stats"]["emitters"], 1);
    assert_eq!(report["stats"]["particles"], 3);
    assert_eq!(report["frames"][0]["identifier"], "demo:ember");
    assert_eq!(report["frames"][0]["particles"].as_array().unwrap().len(), 3);
}

#[test]
fn test_effect_simulate_unknown_effect() {
    let dir = TempDir::new().unwrap();
    let path = write_effect(dir.path(), "puff.particle.json", PUFF);

    snowstorm()
        .args(["effect", "simulate"])
        .arg(&path)
        .args(["--effect", "demo:missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No particle effect named 'demo:missing'"));
}

#[test]
fn test_effect_simulate_rejects_bad_timestep() {
    let dir = TempDir::new().unwrap();
    let path = write_effect(dir.path(), "puff.particle.json", PUFF);

    snowstorm()
        .args(["effect", "simulate"])
        .arg(&path)
        .args(["--dt", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid simulation config"));
}

#[test]
fn test_effect_simulate_config_file() {
    let dir = TempDir::new().unwrap();
    let path = write_effect(dir.path(), "ember.particle.json", EMBER);
    let config = dir.path().join("sim.cfg");
    fs::write(&config, r#"{ "timestep": 0.5, "seed": 4 }"#).unwrap();

    let output = snowstorm()
        .args(["effect", "simulate"])
        .arg(&path)
        .arg("--config")
        .arg(&config)
        .args(["--ticks", "1", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["stats"]["particles"], 3);
}

#[test]
fn test_completions() {
    snowstorm()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("snowstorm"));
}
