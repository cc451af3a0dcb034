pub mod cli;
pub mod clients;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod loader;
pub mod logging;
pub mod registry;
