use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use anyhow::anyhow;
use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use log::info;
use log::warn;

use cso_acag::analyse;
use cso_des::SystemAssumptions;
use cso_io::clear_directory;
use cso_io::io_aut::write_aut;
use cso_io::reports::write_closed_loop;
use cso_io::reports::write_labels;
use cso_io::reports::write_strategies;
use cso_utilities::Timing;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static ALLOC: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(
    name = "csoattack",
    about = "Computes the covert attack strategies that reveal a secret of a supervised plant"
)]
struct Cli {
    /// The system assumptions in JSON, the worked example is used when omitted.
    #[arg(value_name = "CONFIG")]
    config: Option<String>,

    /// The directory that is cleared and receives all outputs.
    #[arg(short, long, default_value = "resources/cso-attacker")]
    output: String,

    /// The number of strategies to print, defaults to the configured number.
    #[arg(short, long)]
    top: Option<usize>,

    #[arg(long)]
    time: bool,
}

/// Creates the file in the output directory and writes it using `write`.
fn write_output<F>(directory: &Path, name: &str, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), Box<dyn Error>>,
{
    let path = directory.join(name);
    let mut writer = BufWriter::new(File::create(&path).with_context(|| format!("Cannot create {}", path.display()))?);

    write(&mut writer).map_err(|error| anyhow!("Cannot write {}: {error}", path.display()))?;
    writer.flush()?;

    info!("Wrote {}", path.display());
    Ok(())
}

fn main() -> Result<ExitCode> {
    env_logger::init();

    let cli = Cli::parse();

    let assumptions = match &cli.config {
        Some(path) => SystemAssumptions::from_file(path).with_context(|| format!("Cannot load {path}"))?,
        None => {
            info!("No configuration given, analysing the worked example");
            SystemAssumptions::worked_example()
        }
    };

    let output = Path::new(&cli.output);
    clear_directory(output).with_context(|| format!("Cannot clear {}", output.display()))?;

    let mut timing = Timing::new();
    let analysis = analyse(&assumptions, &mut timing);

    if analysis.report.truncated {
        warn!("A depth bound truncated the exploration, the results may be incomplete");
    }

    let mut write_time = timing.start("write");
    let closed_loop = analysis.closed_loop.to_lts(assumptions.alphabet());
    write_output(output, "closed_loop.aut", |writer| write_aut(writer, &closed_loop))?;
    write_output(output, "closed_loop.txt", |writer| {
        write_closed_loop(writer, &assumptions, &analysis.closed_loop)
    })?;
    write_output(output, "acag.aut", |writer| write_aut(writer, analysis.acag.lts()))?;
    write_output(output, "ao_acag.aut", |writer| write_aut(writer, &analysis.ao_acag))?;
    write_output(output, "pruned_ao_acag.aut", |writer| write_aut(writer, &analysis.pruned))?;
    write_output(output, "labels.txt", |writer| write_labels(writer, &assumptions, &analysis))?;

    let top = cli.top.unwrap_or(assumptions.options().top_strategies);
    write_output(output, "strategies.txt", |writer| write_strategies(writer, &analysis, top))?;
    write_time.finish();

    print!("{}", analysis.report);

    let map = analysis.strategy_map();
    println!("Top {} of {} strategies:", top.min(map.len()), map.len());
    for (strategy, probability) in map.top(top) {
        println!("  {strategy}: {probability}");
    }

    if cli.time {
        timing.print();
    }

    Ok(ExitCode::SUCCESS)
}
