pub mod backoff;
pub mod btle;
pub mod connection;
pub mod constants;
pub mod decoder;
pub mod host;
pub mod types;
