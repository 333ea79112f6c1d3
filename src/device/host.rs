use std::future::Future;
use tokio::time::Duration;
use uuid::Uuid;

use crate::device::types::LinkEvents;
use crate::error::DeviceError;

// Addresses are opaque; they come from `scan` or a link and are only handed back to `connect`.
pub trait WirelessHost {
    type Link: SensorLink;

    fn scan(&self, name: &str, timeout: Duration) -> impl Future<Output = Result<Option<String>, DeviceError>>;

    fn connect(&self, address: &str) -> impl Future<Output = Result<Self::Link, DeviceError>>;
}

pub trait SensorLink {
    fn address(&self) -> String;

    fn read(&self, characteristic: Uuid) -> impl Future<Output = Result<Vec<u8>, DeviceError>>;

    fn write(&self, characteristic: Uuid, value: &[u8]) -> impl Future<Output = Result<(), DeviceError>>;

    // the stream yields `LinkEvent::Disconnected` when the link drops
    fn subscribe(&self, characteristic: Uuid) -> impl Future<Output = Result<LinkEvents, DeviceError>>;

    fn disconnect(&self) -> impl Future<Output = Result<(), DeviceError>>;
}
