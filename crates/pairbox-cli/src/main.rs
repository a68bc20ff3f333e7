//! `pairbox` binary.

use std::{
    io::{self, Write},
    process::ExitCode,
};

use clap::Parser;
use pairbox_cli::{Args, Pairbox, RedbStore};
use pairbox_core::SystemEnv;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let config = args.config();
    let result = RedbStore::open(&config.db_path, SystemEnv)
        .map_err(pairbox_cli::CliError::from)
        .and_then(|store| {
            let app = Pairbox::new(store, SystemEnv, &config);
            app.execute(
                args.user.as_deref(),
                args.command,
                &mut io::stdin().lock(),
                &mut io::stdout().lock(),
            )
        });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(io::stderr(), "error: {error}");
            ExitCode::FAILURE
        },
    }
}
