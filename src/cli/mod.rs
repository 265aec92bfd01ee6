//! The `kmic` command line tool.
//!
//! It drives the provider the way a host would: each command runs one
//! lifecycle operation on one resource or data source, with the state
//! documents exchanged as JSON files.

pub mod options;
pub mod report;

use std::env;

use log::debug;

use crate::provider::KmiProvider;
use crate::provider::diagnostics::Diagnostics;

use self::options::Options;
use self::report::Report;

/// Runs the command given by the options and returns the exit code.
pub async fn run(options: Options) -> i32 {
    let Options { general, command } = options;
    let format = general.format;

    let config = match general.config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return 1;
        }
    };

    if let Err(e) = config.init_logging() {
        eprintln!("{}", e);
        return 1;
    }

    let mut provider = KmiProvider::new();
    if command.needs_client() {
        debug!("Configuring provider");
        if let Err(diagnostics) = provider.configure_with(&config, |name| env::var(name).ok()) {
            return Report::from(Err::<(), Diagnostics>(diagnostics)).print(format);
        }
    }

    command.run(&provider).await.print(format)
}
