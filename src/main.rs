#[macro_use]
extern crate tracing;

use crate::configs::GlobalConfig;
use anyhow::Result as AnyResult;
use clap::Parser;

mod app;
mod authroot;
mod cert;
mod cli;
mod configs;
mod ctl;
mod error;
mod fetch;
mod report;
mod state;
mod store;
mod tabular;
#[cfg(test)]
mod testdata;

fn main() -> AnyResult<()> {
    // Load environment variables from the `.env` file
    dotenvy::dotenv().ok();
    // Initialize the logger after loading the environment variables
    tracing_subscriber::fmt::init();

    let args = cli::Cli::parse();
    let app_config = GlobalConfig::load_config().expect("Failed to parse configuration files");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to bootstrap the Tokio runtime")
        .block_on(app::App::new(args, app_config).run())
}
