//! Command-line front end for Pairbox.
//!
//! A thin shell over [`pairbox_core`]: accounts, mailboxes, and wellness
//! records all live in one [`RedbStore`] file. [`Pairbox`] runs parsed
//! [`cli::Command`]s against it, and `chat` drives the
//! [`pairbox_core::ChatRuntime`] from line-oriented input parsed by
//! [`commands::parse`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod app;
pub mod cli;
pub mod commands;
pub mod error;
pub mod identity;
pub mod storage;

pub use app::Pairbox;
pub use cli::{Args, CliConfig};
pub use error::CliError;
pub use identity::StoreIdentities;
pub use storage::RedbStore;
