pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod fs;
pub mod logging;
pub mod models;
pub mod process;
pub mod reconcile;
pub mod store;
pub mod supervisor;
