use std::path::PathBuf;
use clap::Parser;

pub const DEFAULT_DESTINATION: &str = "127.0.0.1:2000";

#[derive(Parser, Debug, Clone)]
#[command(author, version)]
#[command(about = "Forwards OpenWind wind/heading data as $WIMWV/$WIHDM sentences over UDP", long_about = None)]
pub struct Args {
    /// Where to send the sentences to
    #[arg(long, default_value = DEFAULT_DESTINATION)]
    pub destination: String,

    /// Remember the sensor in this file instead of the default location
    #[arg(long)]
    pub cache_file: Option<PathBuf>,

    /// Send generated data instead of connecting to a sensor
    #[arg(long)]
    pub simulate: bool,

    /// Log every decoded value
    #[arg(long)]
    pub verbose: bool,
}
