use std::pin::Pin;
use futures::Stream;

use crate::error::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindSample {
    pub apparent_angle_deg: f64,
    pub apparent_speed_kts: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingSample {
    pub heading_deg: f64, // [0, 360)
}

/// Everything decoded from one notification. A field that could not be decoded carries the
/// reason instead, so the other field can still be forwarded.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub wind: Result<WindSample, DecodeError>,
    pub heading: Result<Option<HeadingSample>, DecodeError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Notification(Vec<u8>),
    Disconnected,
}

pub type LinkEvents = Pin<Box<dyn Stream<Item = LinkEvent> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectMode {
    Direct,
    Fresh,
}
