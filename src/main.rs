//! Peak-shaving simulator entry point — CLI wiring and config-driven
//! engine construction.

use std::path::Path;
use std::process;

use bess_sim::config::ScenarioConfig;
use bess_sim::devices::{Battery, PvArray};
use bess_sim::io::export::export_csv;
use bess_sim::io::load::read_load_csv;
use bess_sim::profile::{LoadSeries, SyntheticProfile};
use bess_sim::sim::dispatch::{DispatchPolicy, ThresholdPolicy, TouPolicy};
use bess_sim::sim::engine::Engine;
use bess_sim::sim::finance::Summary;
use bess_sim::sim::types::StepRecord;
use bess_sim::tariff::TariffSchedule;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    load_path: Option<String>,
    out_path: Option<String>,
    seed_override: Option<u64>,
    print_steps: bool,
}

fn print_help() {
    eprintln!("bess-sim — behind-the-meter battery + solar peak-shaving simulator");
    eprintln!();
    eprintln!("Usage: bess-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>   Load scenario from TOML config file");
    eprintln!("  --preset <name>     Use a built-in preset (industrial, time_of_use)");
    eprintln!("  --load <path>       Measured load profile CSV (timestamp,load)");
    eprintln!("  --out <path>        Export step records to CSV");
    eprintln!("  --seed <u64>        Override the synthetic profile seed");
    eprintln!("  --steps             Print every step record");
    eprintln!("  --help              Show this help message");
    eprintln!();
    eprintln!("Without --load, a synthetic profile from the [profile] section is used.");
    eprintln!("If no --scenario or --preset is given, the industrial preset is used.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        load_path: None,
        out_path: None,
        seed_override: None,
        print_steps: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --scenario requires a path argument");
                    process::exit(1);
                }
                cli.scenario_path = Some(args[i].clone());
            }
            "--preset" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --preset requires a name argument");
                    process::exit(1);
                }
                cli.preset = Some(args[i].clone());
            }
            "--load" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --load requires a path argument");
                    process::exit(1);
                }
                cli.load_path = Some(args[i].clone());
            }
            "--out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --out requires a path argument");
                    process::exit(1);
                }
                cli.out_path = Some(args[i].clone());
            }
            "--seed" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --seed requires a u64 argument");
                    process::exit(1);
                }
                if let Ok(s) = args[i].parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{}\" is not a valid u64", args[i]);
                    process::exit(1);
                }
            }
            "--steps" => {
                cli.print_steps = true;
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

/// Builds the load series: measured CSV when given, synthetic otherwise.
fn build_series(cfg: &ScenarioConfig, load_path: Option<&str>) -> LoadSeries {
    let series = match load_path {
        Some(path) => match read_load_csv(Path::new(path)) {
            Ok(series) => series,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        },
        None => {
            let p = &cfg.profile;
            let mut profile =
                SyntheticProfile::new(p.base_kw, p.amp_kw, p.phase_rad, p.noise_std_kw, p.seed);
            profile.generate(p.start_date, p.days, p.interval_minutes)
        }
    };

    for warning in series.warnings() {
        eprintln!("warning: {warning}");
    }
    series
}

/// Runs the series through an engine and returns records plus summary.
fn simulate<P: DispatchPolicy>(
    cfg: &ScenarioConfig,
    series: &LoadSeries,
    tariff: &TariffSchedule,
    policy: P,
    target_md_kw: Option<f64>,
) -> (Vec<StepRecord>, Summary) {
    let pv_cfg = &cfg.pv;
    let pv = PvArray::new(
        pv_cfg.capacity_kwp,
        pv_cfg.system_loss,
        pv_cfg.inverter_capacity_kw.unwrap_or(pv_cfg.capacity_kwp),
        pv_cfg.sunrise_hour,
        pv_cfg.sunset_hour,
    );

    let b = &cfg.battery;
    let battery = Battery::new(
        b.capacity_mwh,
        b.initial_soe_fraction,
        b.max_charge_kw.unwrap_or(b.max_discharge_kw),
        b.max_discharge_kw,
        b.roundtrip_efficiency,
        b.soh_fade_per_cycle,
        b.soh_floor,
    );
    let capacity_kwh = battery.capacity_kwh();

    let mut engine = Engine::new(pv, battery, policy, target_md_kw);
    let records = engine.run(series);
    let summary = Summary::from_records(
        &records,
        tariff,
        capacity_kwh,
        cfg.financial.capex_rm,
        cfg.financial.md_charge_rm_per_kw_month,
    );
    (records, summary)
}

fn main() {
    let cli = parse_args();

    // Load config: --scenario takes priority, then --preset, then the
    // industrial default
    let mut scenario = if let Some(ref path) = cli.scenario_path {
        match ScenarioConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match ScenarioConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        ScenarioConfig::industrial()
    };

    // Apply seed override
    if let Some(seed) = cli.seed_override {
        scenario.profile.seed = seed;
    }

    // Validate before anything runs; invalid config is fatal
    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let series = build_series(&scenario, cli.load_path.as_deref());

    let t = &scenario.tariff;
    let tariff = TariffSchedule::new(
        t.peak_start_hour,
        t.peak_end_hour,
        t.peak_day_mask(),
        t.peak_rate_rm_per_kwh,
        t.offpeak_rate_rm_per_kwh,
    );

    let d = &scenario.dispatch;
    let (records, summary) = if d.policy == "time_of_use" {
        let policy = TouPolicy::new(
            (d.charge_start_hour, d.charge_end_hour),
            (d.discharge_start_hour, d.discharge_end_hour),
            d.min_soe_fraction,
            d.max_soe_fraction,
        );
        simulate(&scenario, &series, &tariff, policy, None)
    } else {
        let policy = ThresholdPolicy::new(d.target_md_kw);
        simulate(&scenario, &series, &tariff, policy, Some(d.target_md_kw))
    };

    if cli.print_steps {
        for r in &records {
            println!("{r}");
        }
        println!();
    }

    println!("{summary}");

    // Export CSV if requested
    if let Some(ref path) = cli.out_path {
        if let Err(e) = export_csv(&records, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Step records written to {path}");
    }
}
