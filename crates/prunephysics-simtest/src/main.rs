//! PrunePhysics Headless Harness
//!
//! Validates the bundled whitelist and the pruning state machine on
//! generated vessels. Runs entirely in-process with no game host.
//!
//! Usage:
//!   cargo run -p prunephysics-simtest
//!   cargo run -p prunephysics-simtest -- --verbose --seed 7
//!   cargo run -p prunephysics-simtest -- --whitelist GameData --config prune.json
//!
//! State machine logs go through `RUST_LOG`, e.g.
//! `RUST_LOG=prunephysics_logic=debug`.

use std::path::PathBuf;

use prunephysics_core::generation::{VesselConfig, VesselLayout};
use prunephysics_core::prelude::*;
use prunephysics_core::settings::load_config;
use prunephysics_core::sources::{DirectorySource, LayeredSource};
use prunephysics_logic::config::PruneConfig;
use prunephysics_logic::constants::WAIT_SUFFIX;
use prunephysics_logic::whitelist::{Whitelist, WhitelistSource};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// ── Bundled rules (same file a host ships) ──────────────────────────────
const DEFAULT_RULES: &str = include_str!("../../../data/default.ppwl");

const USAGE: &str =
    "usage: prunephysics-simtest [--verbose] [--seed N] [--whitelist DIR] [--config FILE]";

// ── Options ─────────────────────────────────────────────────────────────

struct Options {
    verbose: bool,
    seed: u64,
    whitelist_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
}

fn parse_args() -> Result<Options, String> {
    let mut options = Options {
        verbose: false,
        seed: 42,
        whitelist_dir: None,
        config_path: None,
    };
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--verbose" | "-v" => options.verbose = true,
            "--seed" => {
                let value = args.next().ok_or("--seed needs a value")?;
                options.seed = value
                    .parse()
                    .map_err(|e| format!("bad seed \"{}\": {}", value, e))?;
            }
            "--whitelist" => {
                let value = args.next().ok_or("--whitelist needs a directory")?;
                options.whitelist_dir = Some(PathBuf::from(value));
            }
            "--config" => {
                let value = args.next().ok_or("--config needs a file")?;
                options.config_path = Some(PathBuf::from(value));
            }
            other => return Err(format!("unknown argument \"{}\"", other)),
        }
    }
    Ok(options)
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn new(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let options = match parse_args() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{}\n{}", e, USAGE);
            std::process::exit(2);
        }
    };
    let config = match &options.config_path {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(2);
            }
        },
        None => PruneConfig::default(),
    };

    println!("=== PrunePhysics Harness (seed {}) ===\n", options.seed);
    log::info!(
        "rules: bundled + {:?}, config: {:?}",
        options.whitelist_dir,
        options.config_path
    );

    let mut results = Vec::new();

    // 1. Rule files
    results.extend(validate_whitelist(&options));

    // 2. Eligibility over a generated vessel
    results.extend(validate_eligibility(&config, &options));

    // 3. Demotion and steady state
    results.extend(validate_state_machine(&config, &options));

    // 4. Global gate
    results.extend(validate_gate(&config, &options));

    // 5. Save/load
    results.extend(validate_persistence(&config, &options));

    // 6. Operator commands
    results.extend(validate_commands(&config, &options));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || options.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn provider(options: &Options) -> LayeredSource {
    LayeredSource {
        builtin: vec![WhitelistSource::from_text("default.ppwl", DEFAULT_RULES)],
        directory: options.whitelist_dir.clone().map(DirectorySource::new),
    }
}

fn flight_engine(config: &PruneConfig, options: &Options) -> (PruneEngine, VesselLayout) {
    let mut engine = PruneEngine::new(config, provider(options));
    let vessel_config = VesselConfig {
        stack_sections: 6,
        radial_groups: 12,
        symmetry: 3,
        ..Default::default()
    };
    let layout = engine.generate(&vessel_config, &mut StdRng::seed_from_u64(options.seed));
    engine.set_scene(Scene::Flight);
    (engine, layout)
}

fn want_everything(engine: &mut PruneEngine) {
    for id in engine.vessel.part_ids() {
        engine.set_wanted(id, true);
    }
}

fn reduced_parts(engine: &PruneEngine) -> Vec<PartId> {
    engine
        .vessel
        .part_ids()
        .into_iter()
        .filter(|&id| !engine.vessel.has_rigid_body(id))
        .collect()
}

// ── 1. Whitelist ────────────────────────────────────────────────────────

fn validate_whitelist(options: &Options) -> Vec<TestResult> {
    println!("--- Whitelist ---");
    let mut results = Vec::new();

    let bundled = Whitelist::compile(&[WhitelistSource::from_text("default.ppwl", DEFAULT_RULES)]);
    results.push(TestResult::new(
        "bundled_rules_compile",
        !bundled.is_empty() && bundled.rejected().is_empty(),
        format!(
            "{} rules, {} rejected",
            bundled.len(),
            bundled.rejected().len()
        ),
    ));

    let cases = [
        ("Stock.ModuleLight", true),
        ("Vendor.Pack.ModuleDataTransmitter", true),
        ("Resource.ElectricCharge", true),
        ("Stock.ModuleLightExtra", false),
        ("Stock.ModuleEngines", false),
        ("Resource.LiquidFuel", false),
    ];
    let wrong: Vec<_> = cases
        .iter()
        .filter(|(name, expected)| bundled.is_allowed(name) != *expected)
        .map(|(name, _)| *name)
        .collect();
    results.push(TestResult::new(
        "bundled_rules_anchored",
        wrong.is_empty(),
        if wrong.is_empty() {
            format!("{} names judged as expected", cases.len())
        } else {
            format!("misjudged: {}", wrong.join(", "))
        },
    ));

    if let Some(dir) = &options.whitelist_dir {
        let source = DirectorySource::new(dir);
        match source.scan() {
            Ok(sources) => {
                let compiled = Whitelist::compile(&sources);
                if options.verbose {
                    for rejected in compiled.rejected() {
                        println!("  rejected {}", rejected);
                    }
                }
                results.push(TestResult::new(
                    "directory_rules_compile",
                    compiled.rejected().is_empty(),
                    format!(
                        "{} files, {} rules, {} rejected",
                        sources.len(),
                        compiled.len(),
                        compiled.rejected().len()
                    ),
                ));
            }
            Err(e) => results.push(TestResult::new("directory_rules_compile", false, e.to_string())),
        }
    }

    results
}

// ── 2. Eligibility ──────────────────────────────────────────────────────

fn validate_eligibility(config: &PruneConfig, options: &Options) -> Vec<TestResult> {
    println!("--- Eligibility ---");
    let mut results = Vec::new();
    let (engine, layout) = flight_engine(config, options);

    let root_verdict = engine.verdict(layout.root);
    results.push(TestResult::new(
        "root_refused_in_flight",
        !root_verdict.is_eligible(),
        format!("root: {}", root_verdict),
    ));

    match layout.stack.last() {
        Some(&engine_part) => {
            let engine_verdict = engine.verdict(engine_part);
            results.push(TestResult::new(
                "engine_refused",
                !engine_verdict.is_eligible(),
                format!("engine: {}", engine_verdict),
            ));
        }
        None => results.push(TestResult::new("engine_refused", false, "no stack generated")),
    }

    let always_simulated: Vec<PartId> = engine
        .vessel
        .part_ids()
        .into_iter()
        .filter(|&id| engine.vessel.requires_full_simulation(id))
        .collect();
    let leaked = always_simulated
        .iter()
        .filter(|&&id| engine.verdict(id).is_eligible())
        .count();
    results.push(TestResult::new(
        "always_simulated_refused",
        leaked == 0,
        format!("{} always-simulated parts, {} eligible", always_simulated.len(), leaked),
    ));

    let summary = engine.summary();
    if options.verbose {
        for (reason, count) in &summary.reasons {
            println!("  {:>4} x {}", count, reason);
        }
    }
    results.push(TestResult::new(
        "some_parts_eligible",
        summary.eligible_count > 0 && summary.eligible_count < summary.total(),
        format!("{}/{} parts eligible", summary.eligible_count, summary.total()),
    ));

    results
}

// ── 3. State machine ────────────────────────────────────────────────────

fn validate_state_machine(config: &PruneConfig, options: &Options) -> Vec<TestResult> {
    println!("--- State Machine ---");
    let mut results = Vec::new();
    let (mut engine, _) = flight_engine(config, options);

    let before = engine.summary();
    want_everything(&mut engine);
    let first = engine.fixed_update();

    let mismatched: Vec<PartId> = engine
        .vessel
        .part_ids()
        .into_iter()
        .filter(|&id| engine.vessel.has_rigid_body(id) == engine.verdict(id).is_eligible())
        .collect();
    results.push(TestResult::new(
        "reduced_iff_eligible",
        mismatched.is_empty(),
        if mismatched.is_empty() {
            format!(
                "{} transitions, {} bodies merged",
                first.transitions.len(),
                first.bodies_synced
            )
        } else {
            format!("{} parts disagree with their verdict", mismatched.len())
        },
    ));

    let steady = engine.fixed_update();
    results.push(TestResult::new(
        "steady_state_is_quiet",
        steady.transitions.is_empty() && steady.bodies_synced == 0,
        format!(
            "{} transitions, {} body changes on the second step",
            steady.transitions.len(),
            steady.bodies_synced
        ),
    ));

    let after = engine.summary();
    results.push(TestResult::new(
        "cost_reduced",
        after.estimated_cost() < before.estimated_cost(),
        format!(
            "cost {:.2} -> {:.2}",
            before.estimated_cost(),
            after.estimated_cost()
        ),
    ));

    engine.update();
    let waiting = engine
        .vessel
        .part_ids()
        .into_iter()
        .filter(|&id| engine.label(id).is_some_and(|l| l.ends_with(WAIT_SUFFIX)))
        .count();
    let refused = engine
        .vessel
        .part_ids()
        .into_iter()
        .filter(|&id| !engine.verdict(id).is_eligible())
        .count();
    results.push(TestResult::new(
        "labels_settled",
        waiting == 0,
        format!("{} waiting labels, {} refused parts still wanted", waiting, refused),
    ));

    results
}

// ── 4. Global gate ──────────────────────────────────────────────────────

fn validate_gate(config: &PruneConfig, options: &Options) -> Vec<TestResult> {
    println!("--- Global Gate ---");
    let mut results = Vec::new();
    let (mut engine, _) = flight_engine(config, options);
    want_everything(&mut engine);
    engine.fixed_update();
    let reduced = reduced_parts(&engine);

    engine.set_enabled(false);
    engine.fixed_update();
    let still_reduced = reduced_parts(&engine).len();
    let wanted_kept = engine
        .vessel
        .part_ids()
        .into_iter()
        .all(|id| engine.vessel.physics_state(id).is_some_and(|s| s.wanted));
    results.push(TestResult::new(
        "gate_off_restores_full",
        still_reduced == 0 && wanted_kept,
        format!(
            "{} reduced before, {} after; wanted flags kept: {}",
            reduced.len(),
            still_reduced,
            wanted_kept
        ),
    ));

    engine.set_enabled(true);
    engine.fixed_update();
    let restored = reduced_parts(&engine);
    results.push(TestResult::new(
        "gate_on_reprunes",
        restored == reduced,
        format!("{} parts reduced again", restored.len()),
    ));

    results
}

// ── 5. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(config: &PruneConfig, options: &Options) -> Vec<TestResult> {
    println!("--- Persistence ---");
    let mut results = Vec::new();
    let (mut engine, _) = flight_engine(config, options);
    want_everything(&mut engine);
    engine.fixed_update();

    let mut buffer = Vec::new();
    if let Err(e) = engine.save(&mut buffer) {
        results.push(TestResult::new("save", false, e.to_string()));
        return results;
    }

    let mut loaded = PruneEngine::new(config, provider(options));
    if let Err(e) = loaded.load(&buffer[..]) {
        results.push(TestResult::new("load", false, e.to_string()));
        return results;
    }

    results.push(TestResult::new(
        "roundtrip_keeps_reduced_parts",
        reduced_parts(&loaded) == reduced_parts(&engine),
        format!(
            "{} bytes, {} parts, {} reduced",
            buffer.len(),
            loaded.vessel.len(),
            reduced_parts(&loaded).len()
        ),
    ));

    let step = loaded.fixed_update();
    results.push(TestResult::new(
        "loaded_vessel_is_steady",
        step.transitions.is_empty(),
        format!("{} transitions after load", step.transitions.len()),
    ));

    results
}

// ── 6. Operator commands ────────────────────────────────────────────────

fn validate_commands(config: &PruneConfig, options: &Options) -> Vec<TestResult> {
    println!("--- Operator Commands ---");
    let mut results = Vec::new();
    let (mut engine, _) = flight_engine(config, options);

    let lights = engine
        .vessel
        .part_ids()
        .into_iter()
        .filter(|&id| {
            engine
                .vessel
                .behavior_names(id)
                .iter()
                .any(|n| n.ends_with("ModuleLight"))
        })
        .count();

    let first = engine.run_command("disable ModuleLight$");
    let second = engine.run_command("DISABLE ModuleLight$");
    results.push(TestResult::new(
        "disable_counts_changes_once",
        matches!((&first, &second), (Ok(a), Ok(0)) if *a == lights),
        format!("{} light parts, first {:?}, second {:?}", lights, first, second),
    ));

    let enabled = engine.run_command("enable .");
    results.push(TestResult::new(
        "enable_all_restores",
        matches!(enabled, Ok(n) if n == lights),
        format!("{:?} behaviors re-enabled", enabled),
    ));

    let bad = engine.run_command("frobnicate ModuleLight");
    results.push(TestResult::new(
        "unknown_verb_rejected",
        bad.is_err(),
        match bad {
            Ok(n) => format!("accepted, {} changed", n),
            Err(e) => e.to_string(),
        },
    ));

    results
}
