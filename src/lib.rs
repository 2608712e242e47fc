//! Records behind a print shop's admin portal: inventory, quotations,
//! customer concerns and sales, persisted as whole JSON collections in a
//! key-value store and broadcast to every open view on change.

mod cli;
pub mod bridge;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod store;


use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub use bridge::{Broadcaster, ChangeListener, DbUpdate, Refresh, Subscription};
pub use commands::Repository;
pub use config::{AppConfig, SaleMatching};
pub use error::{Result, StoreError};
pub use storage::{KeyValueStorage, MemoryStorage, SqliteStorage, StorageArea, StorageEvent, TabId};
pub use store::{Collection, Store, StoreOptions};

pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match cli::Cli::parse().run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}
