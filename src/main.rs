use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use razer_usb_lib::{Outcome, Report};
use razer_usb_rs::args::{DeviceArgs, HexBytes, parse_hex_u8, parse_hex_u16};
use razer_usb_rs::logging::setup_logging;
use std::path::PathBuf;
use std::process;
use tracing::{error, info, warn};

/// Talk to a Razer RGB peripheral over its USB report protocol.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    device: DeviceArgs,
    /// Optional path to a file to write logs to, in addition to the console.
    #[arg(short, long, global = true)]
    log_file: Option<PathBuf>,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send a report and print the device's response.
    Exchange(ReportArgs),
    /// Send a report without reading a response.
    Send(ReportArgs),
    /// Push packed RGB triples to an addressable channel.
    Argb {
        /// Channel index.
        #[arg(long)]
        channel: u8,
        /// Colors as hex RGB triples, e.g. "ff0000 00ff00".
        #[arg(long)]
        colors: HexBytes,
    },
    /// Send a raw buffer with a caller-chosen wValue/wIndex (older devices).
    Legacy {
        /// wValue (hex).
        #[arg(long, value_parser = parse_hex_u16)]
        value: u16,
        /// wIndex (hex).
        #[arg(long, value_parser = parse_hex_u16)]
        index: u16,
        /// Payload (hex).
        #[arg(long)]
        data: HexBytes,
        /// Number of payload bytes to send. Defaults to the whole payload.
        #[arg(long)]
        size: Option<usize>,
    },
    /// Write raw bytes to the bulk OUT endpoint.
    BulkWrite {
        #[arg(long)]
        data: HexBytes,
    },
    /// Read from the bulk IN endpoint.
    BulkRead {
        #[arg(long, default_value_t = 64)]
        len: usize,
    },
}

#[derive(clap::Args, Debug)]
struct ReportArgs {
    /// Command class (hex).
    #[arg(long, value_parser = parse_hex_u8)]
    class: u8,
    /// Command id (hex).
    #[arg(long, value_parser = parse_hex_u8)]
    id: u8,
    /// Declared data size. Defaults to the number of argument bytes.
    #[arg(long)]
    size: Option<u8>,
    /// Argument bytes (hex).
    #[arg(long, default_value = "")]
    args: HexBytes,
    /// Transaction id (hex).
    #[arg(long, value_parser = parse_hex_u8, default_value = "ff")]
    transaction_id: u8,
}

impl ReportArgs {
    fn report(&self) -> Result<Report> {
        if self.args.len() > razer_usb_lib::constants::ARGUMENTS_LEN {
            bail!(
                "{} argument bytes do not fit the {} byte argument block",
                self.args.len(),
                razer_usb_lib::constants::ARGUMENTS_LEN
            );
        }
        let mut report = Report::new(self.class, self.id, 0)
            .with_arguments(&self.args)
            .with_transaction_id(self.transaction_id);
        if let Some(size) = self.size {
            report.data_size = size;
        }
        Ok(report)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = setup_logging(cli.log_file.clone(), &cli.verbose)?;

    if let Err(e) = run(cli) {
        error!("Application failed: {:?}", e);
        process::exit(1);
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let mut device = cli.device.open()?;

    match cli.command {
        Command::Exchange(args) => {
            let request = args.report()?;
            info!("Request: {}", request);
            let exchange = device.exchange(request).context("Exchange failed")?;
            if let Some(e) = &exchange.write_error {
                warn!("Request write reported: {}", e);
            }
            match &exchange.outcome {
                Outcome::Ok => info!("Response: {}", exchange.response),
                Outcome::Invalid(e) => warn!("Invalid response ({}): {}", e, exchange.response),
                Outcome::OversizedField { value, capacity } => warn!(
                    "Response declared {} argument bytes (capacity {}): {}",
                    value, capacity, exchange.response
                ),
            }
            println!("{}", hex::encode(exchange.response.arguments()));
        }
        Command::Send(args) => {
            let request = args.report()?;
            info!("Request: {}", request);
            device.send(request).context("Send failed")?;
        }
        Command::Argb { channel, colors } => {
            if colors.len() % 3 != 0 {
                bail!("Color data must be whole RGB triples, got {} bytes", colors.len());
            }
            let led_count = u8::try_from(colors.len() / 3).context("Too many LEDs for one frame")?;
            device
                .send_argb(channel, led_count, &colors)
                .with_context(|| format!("ARGB update of channel {} failed", channel))?;
            info!(channel, led_count, "ARGB frame sent");
        }
        Command::Legacy {
            value,
            index,
            data,
            size,
        } => {
            let size = size.unwrap_or(data.len());
            let settle = device.config().settle;
            device
                .send_legacy(&data, value, index, size, settle)
                .context("Legacy write failed")?;
            info!(value, index, size, "Legacy report sent");
        }
        Command::BulkWrite { data } => {
            let sent = device.bulk_write(&data).context("Bulk write failed")?;
            info!("Sent {} bytes", sent);
        }
        Command::BulkRead { len } => {
            let mut buf = vec![0u8; len];
            let received = device.bulk_read(&mut buf).context("Bulk read failed")?;
            println!("{}", hex::encode(&buf[..received]));
        }
    }

    Ok(())
}
