use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use zombie_rs::output::{
    render_trajectory, CsvConfig, CsvExporter, CsvMetadata, Exporter, ImageFormat, PlotConfig,
    PlottersRenderer,
};
use zombie_rs::solver::SolverMethod;
use zombie_rs::{ModelParameters, Simulator};

#[derive(Parser)]
#[command(name = "zombie-sim")]
#[command(about = "Simulate a zombie outbreak (SZR model) and plot the populations")]
struct Cli {
    /// Model parameter override, repeatable (e.g. `--param transmission_percent=80`)
    ///
    /// Keys: initial_population, initial_zombie_population, initial_death_population,
    /// birth_rate, natural_death_percent, transmission_percent, resurrect_percent,
    /// destroy_percent, days, samples
    #[arg(short, long = "param", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    params: Vec<(String, String)>,

    /// Integration method: `adaptive`, `dopri5`, `sdirk` or `rk4`
    #[arg(short, long, default_value_t = SolverMethod::Adaptive)]
    method: SolverMethod,

    /// Image file to write; `.svg` selects SVG, anything else PNG
    #[arg(short, long, default_value = "outbreak.png")]
    output: PathBuf,

    /// Also write the trajectory as CSV
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// Plot the dead compartment too
    #[arg(long)]
    show_dead: bool,

    /// Image width in pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Image height in pixels
    #[arg(long, default_value_t = 600)]
    height: u32,
}

fn parse_key_value(arg: &str) -> Result<(String, String), String> {
    arg.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got `{arg}`"))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let parameters = ModelParameters::from_pairs(cli.params).context("invalid model parameters")?;
    let simulator = Simulator::new(parameters).with_method(cli.method);

    let trajectory = simulator.solve().context("simulation failed")?;
    let title = simulator.summary_label();

    let renderer = PlottersRenderer::new(ImageFormat::from_path(&cli.output))
        .with_config(PlotConfig::with_size(cli.width, cli.height));
    let image = render_trajectory(&renderer, &trajectory, &title, cli.show_dead)
        .context("rendering failed")?;
    std::fs::write(&cli.output, image)
        .with_context(|| format!("cannot write {}", cli.output.display()))?;
    info!("plot written to {}", cli.output.display());

    if let Some(path) = &cli.csv {
        let config = CsvConfig::default().with_metadata(CsvMetadata::from_simulation(&simulator));
        let exporter = CsvExporter::new(config);
        exporter
            .export(&trajectory, path)
            .with_context(|| format!("cannot write {}", path.display()))?;
        info!("trajectory written to {}", path.display());
    }

    let peak = trajectory.peak_infected();
    let last = trajectory.final_state();
    println!("{title}");
    println!("peak zombies: {:.2} at day {:.3}", peak.1, peak.0);
    println!(
        "day {:.3}: living {:.2}, zombies {:.2}, dead {:.2}",
        last.time, last.living, last.infected, last.dead
    );

    Ok(())
}
