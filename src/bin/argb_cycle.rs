use anyhow::{Result, bail};
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use razer_usb_lib::constants::{ARGB_COLOR_CAPACITY, BYTES_PER_LED};
use razer_usb_rs::args::DeviceArgs;
use razer_usb_rs::logging::setup_logging;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Stream a rotating rainbow to one addressable RGB channel until Ctrl-C.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    device: DeviceArgs,
    /// Channel index.
    #[arg(long, default_value_t = 0)]
    channel: u8,
    /// Number of LEDs on the channel.
    #[arg(long, default_value_t = 20)]
    leds: u8,
    /// Delay between frames in milliseconds.
    #[arg(long, default_value_t = 50)]
    interval_ms: u64,
    /// Optional path to a file to write logs to, in addition to the console.
    #[arg(short, long)]
    log_file: Option<PathBuf>,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

/// Position on a 768-step red/green/blue color wheel.
fn wheel(pos: u16) -> [u8; 3] {
    let pos = pos % 768;
    let step = (pos % 256) as u8;
    match pos / 256 {
        0 => [255 - step, step, 0],
        1 => [0, 255 - step, step],
        _ => [step, 0, 255 - step],
    }
}

fn frame_colors(led_count: u8, offset: u16) -> Vec<u8> {
    let spacing = 768 / u16::from(led_count.max(1));
    (0..u16::from(led_count))
        .flat_map(|i| wheel(offset.wrapping_add(i * spacing)))
        .collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = setup_logging(cli.log_file.clone(), &cli.verbose)?;

    let max_leds = ARGB_COLOR_CAPACITY / BYTES_PER_LED;
    if cli.leds == 0 || usize::from(cli.leds) > max_leds {
        bail!("LED count must be between 1 and {}", max_leds);
    }

    let mut device = cli.device.open()?;

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })?;

    info!(
        "Streaming {} LEDs to channel {} every {} ms, Ctrl-C to stop",
        cli.leds, cli.channel, cli.interval_ms
    );

    let interval = Duration::from_millis(cli.interval_ms);
    let mut offset: u16 = 0;
    let mut frames: u64 = 0;
    let mut failures: u64 = 0;

    while running.load(Ordering::SeqCst) {
        let colors = frame_colors(cli.leds, offset);
        match device.send_argb(cli.channel, cli.leds, &colors) {
            Ok(()) => frames += 1,
            Err(e) if e.is_validation() => bail!("Frame rejected: {}", e),
            Err(e) => {
                failures += 1;
                warn!("Frame {} failed: {}", frames + failures, e);
            }
        }
        offset = (offset + 8) % 768;
        thread::sleep(interval);
    }

    info!("Stopped after {} frames ({} failed)", frames, failures);
    Ok(())
}
