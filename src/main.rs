use std::io::Read;
use std::process::ExitCode;

use log::{error, info};
use serial_device::prelude::*;

fn usage() {
    eprintln!("usage: serial_device [<device> [baud]]");
}

/// print available serial ports
fn list_ports() -> ExitCode {
    match tokio_serial::available_ports() {
        Ok(ports) => {
            for port in ports {
                println!("{}", port.port_name);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error listing ports: {e}");
            ExitCode::FAILURE
        }
    }
}

/// dump received bytes as hex until the device stops
fn monitor(path: &str, config: LineConfig) -> ExitCode {
    let device = match SerialDevice::open(path, config) {
        Ok(device) => device,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut buffer = [0u8; 1024];
    let mut reader = device.input_stream();
    let code = loop {
        match reader.read(&mut buffer) {
            Ok(0) => {
                info!("{path} reached end of stream");
                break ExitCode::SUCCESS;
            }
            Ok(n) => println!("{}", hex::encode(&buffer[..n])),
            Err(e) => {
                error!("Read from {path} failed: {e}");
                break ExitCode::FAILURE;
            }
        }
    };

    if let Err(e) = device.close() {
        error!("Close of {path} failed: {e}");
    }
    code
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => list_ports(),
        [path] => monitor(path, LineConfig::default()),
        [path, baud] => match baud.parse() {
            Ok(baud) => monitor(path, LineConfig::default().with_baud_rate(baud)),
            Err(_) => {
                usage();
                ExitCode::FAILURE
            }
        },
        _ => {
            usage();
            ExitCode::FAILURE
        }
    }
}
