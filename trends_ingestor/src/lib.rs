pub mod cli;
pub mod config;
pub mod errors;
pub mod fetch;
pub mod io;
pub mod models;
pub mod providers;
pub mod validate;
