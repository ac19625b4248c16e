//! Renders the Mandelbrot set with a single GPU compute dispatch and
//! writes it to `mandelbrot.png`.

use std::path::Path;
use std::process;

use gpu_mandelbrot::{export, seed, DeviceContext, RenderConfig, Renderer, Result};
use log::{error, info};

const OUTPUT_PATH: &str = "mandelbrot.png";

fn run(config: RenderConfig, output: &Path) -> Result<()> {
    let context = DeviceContext::new()?;
    info!("rendering on {}", context.device_name());

    let renderer = Renderer::new(context, config)?;

    let seed = seed::generate_seed();
    info!("per-run seed: {seed:#010x}");

    let pixels = renderer.render(seed)?;
    export::save_png(output, config, &pixels)?;
    info!(
        "wrote {}x{} image to {}",
        config.width,
        config.height,
        output.display()
    );
    Ok(())
}

fn main() {
    env_logger::init();

    match run(RenderConfig::default(), Path::new(OUTPUT_PATH)) {
        Ok(()) => {}
        Err(err) if err.is_fatal() => {
            // Unrecoverable environment error; skip teardown and die loudly.
            error!("fatal: {err}");
            process::abort();
        }
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    }
}
