//! Desktop runner for the coronet device.
//!
//! Boots a disk bundle and drives the frame loop headless, which is all
//! development and soak runs need. The console server gives the same
//! control surface a hosted build has.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use coronet_console::ConsoleLog;
use coronet_device::{BootConfig, Device, NullGame};
use coronet_fs::DiskFs;

/// Run a coronet bundle without a host application
#[derive(Parser, Debug)]
#[command(name = "coronet")]
#[command(about = "Run a coronet bundle without a host application")]
#[command(version)]
struct Args {
    /// Bundle directory
    #[arg(long, default_value = ".")]
    bundle_dir: PathBuf,

    /// Override the console port from the boot config
    #[arg(long)]
    console_port: Option<u16>,

    /// Block at boot until a console client connects
    #[arg(long)]
    wait_console: bool,

    /// Stop after this many frames instead of running until quit
    #[arg(long)]
    frames: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let inner = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .build();
    if let Err(e) = ConsoleLog::install(Box::new(inner), log::LevelFilter::Debug) {
        eprintln!("logger install failed: {e}");
    }

    let fs = Arc::new(DiskFs::new(&args.bundle_dir));

    let mut config = BootConfig::load_or_default(fs.as_ref()).context("boot config")?;
    if let Some(port) = args.console_port {
        config.console.port = port;
    }
    if args.wait_console {
        config.console.wait = true;
    }

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed))
            .context("install ctrl-c handler")?;
    }

    info!(target: "app", "app.start bundle='{}'", args.bundle_dir.display());

    let mut device =
        Device::init_with_config(fs, Box::new(NullGame), config).context("device boot")?;

    let mut frames_left = args.frames;
    loop {
        if stop.load(Ordering::Relaxed) {
            device.quit();
        }
        if let Some(n) = frames_left.as_mut() {
            if *n == 0 {
                device.quit();
            } else {
                *n -= 1;
            }
        }

        if !device.frame() {
            break;
        }
        std::thread::sleep(Duration::from_millis(16));
    }

    device.shutdown();
    info!(target: "app", "app.exit");
    Ok(())
}
