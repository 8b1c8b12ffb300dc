mod settings;

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serlink_core::{InputProcessor, LinkConfig, SerialTransport};

use crate::settings::Settings;

/// Monitor a serial device, printing everything it sends.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Device path, e.g. /dev/ttyUSB0 or COM3. Defaults to the saved
    /// setting.
    device: Option<String>,

    /// Line speed.
    #[arg(short, long)]
    baud: Option<u32>,

    /// Print received bytes as hex instead of assembling lines.
    #[arg(long)]
    hex: bool,

    /// Text to transmit once the link is up (CRLF is appended).
    #[arg(short, long)]
    probe: Option<String>,
}

/// Assembles received bytes into lines and prints them. Spans cut
/// mid-line are buffered until the newline shows up.
struct LinePrinter {
    pending: Vec<u8>,
    hex: bool,
}

impl LinePrinter {
    fn new(hex: bool) -> Self {
        LinePrinter {
            pending: Vec::new(),
            hex,
        }
    }
}

impl InputProcessor for LinePrinter {
    fn process(&mut self, data: &[u8]) {
        if self.hex {
            println!("rx {}", hex::encode(data));
            return;
        }
        self.pending.extend_from_slice(data);
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            print!("{}", String::from_utf8_lossy(&line));
        }
        // A runaway unterminated line is flushed rather than hoarded.
        if self.pending.len() > 4096 {
            println!("{}", String::from_utf8_lossy(&self.pending));
            self.pending.clear();
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut settings = Settings::load();

    if let Some(device) = args.device {
        settings.device = device;
    }
    if let Some(baud) = args.baud {
        settings.baud_rate = baud;
    }
    if args.hex {
        settings.hex = true;
    }
    if settings.device.is_empty() {
        bail!("no device given; pass a path or save one in settings.json");
    }

    let config = LinkConfig::new(settings.device.clone(), settings.baud_rate);
    let transport = SerialTransport::open(config, Box::new(LinePrinter::new(settings.hex)))
        .with_context(|| format!("opening {}", settings.device))?;

    if let Err(err) = settings.save() {
        log::debug!("settings not saved: {err:#}");
    }

    if let Some(probe) = args.probe.as_deref() {
        let mut frame = probe.as_bytes().to_vec();
        frame.extend_from_slice(b"\r\n");
        let sent = transport.send(&frame);
        log::info!("probe sent ({sent} of {} bytes)", frame.len());
    }

    log::info!(
        "listening on {} at {} baud, Ctrl-C to quit",
        settings.device,
        settings.baud_rate
    );
    loop {
        std::thread::sleep(Duration::from_secs(60));
    }
}
