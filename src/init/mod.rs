pub mod config;
pub(crate) mod workers;
