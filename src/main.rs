//! # Pastel Park
//!
//! Opens the park window. An optional first argument names a TOML config file;
//! without one `pastel_park.toml` is used when present.
//!
//! ```bash
//! RUST_LOG=pastel_park=debug cargo run --release -- my_park.toml
//! ```

use pastel_park::{config::ParkConfig, PastelParkApp};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ParkConfig::from_arg(std::env::args().nth(1).as_deref())?;
    log::debug!("{config:?}");

    PastelParkApp::new(config)?.run()
}
