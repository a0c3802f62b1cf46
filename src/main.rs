use anyhow::Context;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use plant_decimate::config::{BatchConfig, Cli, Command, ViewConfig};
use plant_decimate::pipeline::BatchProcessor;
use plant_decimate::viewer;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Init tracing
    let filter = if cli.verbose {
        EnvFilter::new("plant_decimate=debug")
    } else {
        EnvFilter::new("plant_decimate=info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Configure rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure rayon thread pool")?;
    }

    match cli.command {
        Command::Decimate(args) => {
            let config = args.resolve().context("Invalid decimate options")?;
            config.validate().context("Invalid decimate options")?;
            decimate(&config)
        }
        Command::View(args) => view(&args.into()),
    }
}

fn decimate(config: &BatchConfig) -> anyhow::Result<()> {
    let processor = BatchProcessor::from_config(config);
    match processor.process(config) {
        Ok(result) if result.noop => {
            println!("No .vtk files found in the specified directories.");
            Ok(())
        }
        Ok(result) => {
            println!(
                "Done: {} pairs, {} meshes written, {} failed, {} -> {} triangles in {:.2}s",
                result.pairs,
                result.meshes_written,
                result.failures.len(),
                result.triangles_in,
                result.triangles_out,
                result.duration.as_secs_f64()
            );
            for failure in &result.failures {
                println!("  failed [{}] {}: {}", failure.side, failure.path.display(), failure.error);
            }
            Ok(())
        }
        Err(e) => {
            error!(%e, "Batch failed");
            Err(anyhow::anyhow!(e)).context("plant-decimate batch failed")
        }
    }
}

fn view(config: &ViewConfig) -> anyhow::Result<()> {
    let assemblies = viewer::run(config).context("plant-decimate view failed")?;
    if assemblies == 0 {
        println!("No .vtk files found in the specified directories.");
    } else {
        println!(
            "Wrote {} assemblies to {}",
            assemblies,
            config.output.display()
        );
    }
    Ok(())
}
