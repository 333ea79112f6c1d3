use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use log::{info, warn, LevelFilter};

use crate::config::args::Args;
use crate::config::cache::{get_cache_path, AddressCache};
use crate::device::btle::BtleHost;
use crate::device::connection::ConnectionManager;
use crate::error::AppRunError;
use crate::output::channel::{OutputChannel, UdpFactory};
use crate::sim::wind_sim::SimulationGenerator;

pub mod config;
pub mod device;
pub mod error;
pub mod output;
pub mod sim;

pub fn init_logging(level: LevelFilter) {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339(std::time::SystemTime::now()),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr());

    if let Ok(log_file) = env::var("LOG_FILE") {
        dispatch = dispatch.chain(
            fern::log_file(log_file).expect("Failed to open LOG_FILE")
        );
    }

    dispatch.apply().expect("Failed to initialize logger");
}

fn address_cache(path: Option<PathBuf>) -> AddressCache {
    let path = match path {
        Some(path) => Ok(path),
        None => get_cache_path(),
    };

    match path {
        Ok(path) => {
            info!("Using cache file {}", path.to_string_lossy());
            AddressCache::new(path)
        },
        Err(err) => {
            warn!("{}; the device address will not be remembered", err);
            AddressCache::disabled()
        },
    }
}

/// Bridge the sensor (or the simulation, without bluetooth) to the destination. Only returns
/// on a startup error.
pub async fn run(args: Args) -> Result<(), AppRunError> {
    let destination: SocketAddr = args.destination.parse()
        .map_err(|_| AppRunError::InvalidDestination { destination: args.destination.clone() })?;
    let output = OutputChannel::new(UdpFactory, destination);

    let host = if args.simulate {
        None
    } else {
        match BtleHost::new().await {
            Ok(host) => Some(host),
            Err(err) => {
                warn!("Bluetooth is not available ({}), falling back to simulation", err);
                None
            },
        }
    };

    match host {
        None => match SimulationGenerator::new(output).run().await {},
        Some(host) => {
            info!("Sending sentences to {}", destination);
            let manager = ConnectionManager::new(host, address_cache(args.cache_file), output);
            match manager.run().await {}
        },
    }
}
