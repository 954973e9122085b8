pub mod args;
pub mod cli;
pub mod config;
pub mod convert;
pub mod dicts;
pub mod error;
pub mod export;
pub mod import;
pub mod ledger;
pub mod model;
