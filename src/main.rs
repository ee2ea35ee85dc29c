// Copyright (C) 2026 Brian Johnson
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

use clap::{Parser, Subcommand};
use serialport::{DataBits, Parity, StopBits};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, Level};

use knoblink::protocol::IMAGE_FLAG;
use knoblink::serial::RealSerialPort;
use knoblink::{transfer, BitmapImage, Dispatcher, LinkSession, StaticSessions};

#[derive(Parser)]
#[command(name = "knoblink")]
#[command(about = "Host side of the volume knob / icon display serial link", long_about = None)]
#[command(disable_help_subcommand = true)]
struct Cli {
    /// Serial port to use (e.g., /dev/ttyACM0 or COM6)
    #[arg(short, long)]
    port: String,

    /// Baud rate
    #[arg(short, long, default_value = "115200")]
    baud: u32,

    /// Data bits (5, 6, 7, or 8)
    #[arg(long, default_value = "8", value_name="BITS")]
    data_bits: u8,

    /// Parity (none, odd, or even)
    #[arg(long, default_value = "none")]
    parity: String,

    /// Stop bits (1 or 2)
    #[arg(long, default_value = "1", value_name="BITS")]
    stop_bits: u8,

    /// Time to let the board boot after the port is opened
    #[arg(long, default_value = "2000", value_name = "MS")]
    settle_ms: u64,

    /// Enable debug output
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer volume requests from the device
    Serve {
        /// Audio session as PATH=VOLUME (volume in percent, '-' as PATH for system sounds)
        #[arg(long = "session", value_name = "PATH=VOLUME", value_parser = parse_session)]
        sessions: Vec<SessionArg>,

        /// Delay before reopening the port after the link drops
        #[arg(long, default_value = "1000", value_name = "MS")]
        reconnect_ms: u64,
    },
    /// Send a 64x64 XBM icon to the device display
    SendIcon {
        /// XBM file to send
        file: PathBuf,

        /// Flag byte sent with every chunk
        #[arg(long, default_value_t = IMAGE_FLAG)]
        flag: u8,
    },
    /// Open and close the port, resetting the board
    Reset,
}

#[derive(Clone, Debug)]
struct SessionArg {
    executable: Option<PathBuf>,
    volume: f32,
}

struct PortSettings {
    name: String,
    baud: u32,
    data_bits: DataBits,
    parity: Parity,
    stop_bits: StopBits,
    settle: Duration,
}

impl PortSettings {
    fn open(&self, settle: bool) -> Result<RealSerialPort, serialport::Error> {
        let port = RealSerialPort::open(&self.name, self.baud, self.data_bits, self.parity, self.stop_bits)?;
        if settle && !self.settle.is_zero() {
            std::thread::sleep(self.settle);
        }
        Ok(port)
    }
}

fn parse_session(arg: &str) -> Result<SessionArg, String> {
    let (path, volume) = arg
        .rsplit_once('=')
        .ok_or_else(|| format!("Invalid session: {}. Expected PATH=VOLUME", arg))?;
    let volume: u8 = volume
        .parse()
        .ok()
        .filter(|v| *v <= 100)
        .ok_or_else(|| format!("Invalid volume: {}. Must be 0 to 100", volume))?;
    let executable = match path {
        "-" => None,
        "" => return Err(format!("Invalid session: {}. PATH is empty", arg)),
        path => Some(PathBuf::from(path)),
    };
    Ok(SessionArg { executable, volume: volume as f32 / 100.0 })
}

fn parse_data_bits(bits: u8) -> Result<DataBits, String> {
    match bits {
        5 => Ok(DataBits::Five),
        6 => Ok(DataBits::Six),
        7 => Ok(DataBits::Seven),
        8 => Ok(DataBits::Eight),
        _ => Err(format!("Invalid data bits: {}. Must be 5, 6, 7, or 8", bits)),
    }
}

fn parse_parity(parity: &str) -> Result<Parity, String> {
    match parity.to_lowercase().as_str() {
        "none" => Ok(Parity::None),
        "odd" => Ok(Parity::Odd),
        "even" => Ok(Parity::Even),
        _ => Err(format!("Invalid parity: {}. Must be 'none', 'odd', or 'even'", parity)),
    }
}

fn parse_stop_bits(bits: u8) -> Result<StopBits, String> {
    match bits {
        1 => Ok(StopBits::One),
        2 => Ok(StopBits::Two),
        _ => Err(format!("Invalid stop bits: {}. Must be 1 or 2", bits)),
    }
}

fn port_settings(cli: &Cli) -> Result<PortSettings, String> {
    Ok(PortSettings {
        name: cli.port.clone(),
        baud: cli.baud,
        data_bits: parse_data_bits(cli.data_bits)?,
        parity: parse_parity(&cli.parity)?,
        stop_bits: parse_stop_bits(cli.stop_bits)?,
        settle: Duration::from_millis(cli.settle_ms),
    })
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .init();

    let settings = match port_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    info!("Settings: {} baud, {:?}, {:?}, {:?}",
          settings.baud, settings.data_bits, settings.parity, settings.stop_bits);

    match cli.command {
        Commands::Serve { sessions, reconnect_ms } => {
            let mut audio = StaticSessions::new();
            for session in sessions {
                audio.add(session.executable, session.volume);
            }
            serve(&settings, audio, Duration::from_millis(reconnect_ms));
        }
        Commands::SendIcon { file, flag } => {
            if let Err(e) = send_icon(&settings, &file, flag) {
                eprintln!("Send failed: {}", e);
                std::process::exit(1);
            }
            println!("Icon sent successfully!");
        }
        Commands::Reset => {
            if let Err(e) = settings.open(false) {
                eprintln!("Failed to open serial port: {}", e);
                std::process::exit(1);
            }
            println!("Port {} reset", settings.name);
        }
    }
}

/// Serves the device forever, reopening the port whenever the link drops.
fn serve(settings: &PortSettings, mut audio: StaticSessions, reconnect: Duration) {
    loop {
        info!("Opening serial port: {}", settings.name);
        match settings.open(true) {
            Ok(port) => {
                let mut dispatcher = Dispatcher::new(LinkSession::new(Box::new(port)), audio);
                if let Err(e) = dispatcher.run() {
                    error!("Link lost: {}", e);
                }
                audio = dispatcher.into_audio();
            }
            Err(e) => error!("Failed to open serial port: {}", e),
        }
        std::thread::sleep(reconnect);
    }
}

fn send_icon(settings: &PortSettings, file: &Path, flag: u8) -> Result<(), Box<dyn std::error::Error>> {
    let image = BitmapImage::load(file)?;
    info!("Loaded {}x{} icon from {}", image.width(), image.height(), file.display());

    info!("Opening serial port: {}", settings.name);
    let port = settings.open(true)?;
    let mut link = LinkSession::new(Box::new(port));
    transfer(&mut link, image.bytes(), flag)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_session() {
        let session = parse_session(r"C:\Program Files (x86)\Steam\steam.exe=42").unwrap();
        assert_eq!(session.executable, Some(PathBuf::from(r"C:\Program Files (x86)\Steam\steam.exe")));
        assert_eq!(session.volume, 0.42);

        let session = parse_session("-=100").unwrap();
        assert_eq!(session.executable, None);
        assert_eq!(session.volume, 1.0);

        assert!(parse_session("steam.exe").is_err());
        assert!(parse_session("steam.exe=101").is_err());
        assert!(parse_session("=5").is_err());
    }

    #[test]
    fn test_parse_port_options() {
        assert!(matches!(parse_data_bits(7), Ok(DataBits::Seven)));
        assert!(parse_data_bits(9).is_err());
        assert!(matches!(parse_parity("EVEN"), Ok(Parity::Even)));
        assert!(parse_parity("mark").is_err());
        assert!(matches!(parse_stop_bits(2), Ok(StopBits::Two)));
        assert!(parse_stop_bits(3).is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
