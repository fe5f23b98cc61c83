//! Run a polar misalignment scenario and print the three simulated pointings.
//!
//! ```text
//! cargo run --example polar_misalignment_scenario -- [scenario.json] [--json]
//! ```
//!
//! Without a scenario file the reference scenario is used. `--json` prints the three
//! J2000 coordinates as JSON instead of the text report. The log level follows
//! `RUST_LOG` and defaults to `info`.
use std::env;
use std::error::Error;

use flexi_logger::Logger;
use polar_axis_sim::config::ScenarioConfig;
use polar_axis_sim::simulation::{simulate, SimulationParams};

fn main() -> Result<(), Box<dyn Error>> {
    let _logger = Logger::try_with_env_or_str("info")?.start()?;

    let args: Vec<String> = env::args().skip(1).collect();
    let as_json = args.iter().any(|a| a == "--json");

    let params = match args.iter().find(|a| !a.starts_with("--")) {
        Some(path) => ScenarioConfig::from_path(path)?.into_params()?,
        None => SimulationParams::default(),
    };

    let result = simulate(&params)?;

    if as_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result.celestial_coordinates())?
        );
    } else {
        println!("{params:#}");
        print!("{result}");
        let [first, second] = result.step_angles()?;
        println!(
            "Measured steps about the axis: {:.6}°, {:.6}°",
            first.to_degrees(),
            second.to_degrees()
        );
    }

    Ok(())
}
