use std::io;
use std::str::Utf8Error;
use thiserror::Error;
use uuid::Uuid;
use btleplug;
use serde_json;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to determine path to cache file")]
    NoCachePath,

    #[error("Failed to encode/decode cache as utf-8: {source}")]
    Utf8Error { #[from] source: Utf8Error },

    #[error("Failed to read/write cache file: {source}")]
    IOError { #[from] source: io::Error },

    #[error("Failed to parse/build cache file: {source}")]
    JsonError { #[from] source: serde_json::Error },
}

impl CacheError {
    pub fn is_file_not_found_error(&self) -> bool {
        match self {
            CacheError::IOError { source } => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppRunError {
    #[error("Failed to parse output destination {destination:?}")]
    InvalidDestination { destination: String },
}

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Error communicating with device (btleplug): {source}")]
    Btle { #[from] source: btleplug::Error },

    #[error("A required bluetooth characteristic is not available: {uuid}")]
    MissingCharacteristic { uuid: Uuid },

    #[error("No known peripheral has address {address}")]
    UnknownAddress { address: String },

    #[error("Bluetooth operation took too long: {operation}")]
    Timeout { operation: &'static str },

    #[error("No bluetooth adapter available")]
    NoAdapter,
}

#[derive(Error, Debug)]
pub enum SessionFault {
    #[error("No advertising device found within the scan window")]
    DiscoveryTimeout,

    #[error("Scanning failed: {source}")]
    Scan { source: DeviceError },

    #[error("Connecting to peripheral failed: {source}")]
    Connect { source: DeviceError },

    #[error("Setting up the stream failed: {source}")]
    Setup { source: DeviceError },

    #[error("Device disconnected while streaming")]
    StreamDisconnect,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Payload too short for {field}: need {needed} bytes, got {actual}")]
    Truncated { field: &'static str, needed: usize, actual: usize },

    #[error("Firmware version {version:?} is not a number")]
    Firmware { version: String },
}
