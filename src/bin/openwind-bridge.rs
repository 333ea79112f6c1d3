use clap::Parser;
use log::{error, info, LevelFilter};
use openwind_bridge::config::args::Args;
use openwind_bridge::error::AppRunError;
use openwind_bridge::{init_logging, run};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), AppRunError> {
    let args = Args::parse();

    init_logging(if args.verbose { LevelFilter::Debug } else { LevelFilter::Info });
    info!(concat!("OpenWind Bridge ", env!("CARGO_PKG_VERSION")));

    tokio::select! {
        result = run(args) => {
            if let Err(err) = &result {
                error!("Unexpected error: {}", err);
            }
            result
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
            Ok(())
        }
    }
}
