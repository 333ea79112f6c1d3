use std::convert::Infallible;
use futures::StreamExt;
use log::{debug, info, warn};
use tokio::time::{sleep, timeout, Duration};

use crate::config::cache::AddressCache;
use crate::config::types::DeviceRecord;
use crate::device::backoff::{OuterBackoff, RetryBudget};
use crate::device::constants::{make_fw_uuid, make_mov_enable_uuid, make_wind_uuid, COMMAND_MOV_ENABLE, CONNECT_TIMEOUT, DEVICE_NAME, SCAN_TIMEOUT, SETTLE_DELAY, STREAM_RECONNECT_DELAY};
use crate::device::decoder::decode;
use crate::device::host::{SensorLink, WirelessHost};
use crate::device::types::{ConnectMode, LinkEvent, LinkEvents};
use crate::error::{DeviceError, SessionFault};
use crate::output::channel::{OutputChannel, TransportFactory};
use crate::output::sentence::encode;

pub enum ConnectionState<L> {
    Idle,
    Scanning,
    Connecting {
        address: String,
        mode: ConnectMode,
    },
    SettingUp {
        link: L,
    },
    Streaming {
        link: L,
        events: LinkEvents,
    },
}

impl<L> ConnectionState<L> {
    pub fn name(&self) -> &'static str {
        match self {
            ConnectionState::Idle => "Idle",
            ConnectionState::Scanning => "Scanning",
            ConnectionState::Connecting { mode: ConnectMode::Direct, .. } => "Connecting(direct)",
            ConnectionState::Connecting { mode: ConnectMode::Fresh, .. } => "Connecting(fresh)",
            ConnectionState::SettingUp { .. } => "SettingUp",
            ConnectionState::Streaming { .. } => "Streaming",
        }
    }
}

// firmware does not change across reconnects; it is read at most once per process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub cached_address: Option<String>,
    pub firmware: Option<String>,
}

fn parse_firmware(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_matches(|c: char| c.is_whitespace() || c == '\0')
        .to_string()
}

pub struct ConnectionManager<H: WirelessHost, F: TransportFactory> {
    host: H,
    cache: AddressCache,
    output: OutputChannel<F>,
    session: Session,
    retry: RetryBudget,
    outer: OuterBackoff,
}

impl<H: WirelessHost, F: TransportFactory> ConnectionManager<H, F> {
    pub fn new(host: H, cache: AddressCache, output: OutputChannel<F>) -> Self {
        ConnectionManager {
            host,
            cache,
            output,
            session: Session::default(),
            retry: RetryBudget::new(),
            outer: OuterBackoff::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn retry_budget(&self) -> &RetryBudget {
        &self.retry
    }

    pub fn outer_backoff(&self) -> &OuterBackoff {
        &self.outer
    }

    pub async fn load_cache(&mut self) {
        if let Some(record) = self.cache.load().await {
            self.session.cached_address = Some(record.address);

            if !record.firmware_version.trim().is_empty() {
                self.session.firmware = Some(record.firmware_version);
            }
        }
    }

    fn recovery_delay(&mut self, fault: &SessionFault) -> Duration {
        match fault {
            SessionFault::DiscoveryTimeout => self.retry.record_failure(),
            SessionFault::Scan { .. } | SessionFault::Connect { .. } | SessionFault::Setup { .. } => self.outer.record_fault(),
            SessionFault::StreamDisconnect => Duration::from_millis(STREAM_RECONNECT_DELAY),
        }
    }

    async fn connect(&self, address: &str) -> Result<H::Link, DeviceError> {
        timeout(Duration::from_millis(CONNECT_TIMEOUT), self.host.connect(address))
            .await
            .unwrap_or(Err(DeviceError::Timeout { operation: "connect" }))
    }

    async fn set_up(&mut self, link: &H::Link) -> Result<LinkEvents, DeviceError> {
        if self.session.firmware.is_none() {
            let firmware = parse_firmware(&link.read(make_fw_uuid()).await?);
            info!("Firmware version: {}", firmware);
            self.session.firmware = Some(firmware);
        }

        link.write(make_mov_enable_uuid(), &COMMAND_MOV_ENABLE).await?;
        sleep(Duration::from_millis(SETTLE_DELAY)).await;

        link.subscribe(make_wind_uuid()).await
    }

    fn forward(&mut self, payload: &[u8]) {
        let reading = decode(payload, self.session.firmware.as_deref());

        match &reading.wind {
            Ok(wind) => debug!("AWA: {:.1}° AWS: {:.1} kts", wind.apparent_angle_deg, wind.apparent_speed_kts),
            Err(err) => debug!("Skipping wind: {}", err),
        }
        match &reading.heading {
            Ok(Some(heading)) => debug!("YAW: {:.1}°", heading.heading_deg),
            Ok(None) => {},
            Err(err) => debug!("Skipping heading: {}", err),
        }

        for sentence in encode(&reading) {
            self.output.send(&sentence);
        }
    }

    async fn step(&mut self, state: ConnectionState<H::Link>) -> Result<ConnectionState<H::Link>, SessionFault> {
        match state {
            ConnectionState::Idle => Ok(match &self.session.cached_address {
                Some(address) => ConnectionState::Connecting { address: address.clone(), mode: ConnectMode::Direct },
                None => ConnectionState::Scanning,
            }),
            ConnectionState::Scanning => {
                match self.host.scan(DEVICE_NAME, Duration::from_millis(SCAN_TIMEOUT)).await {
                    Ok(Some(address)) => {
                        self.session.cached_address = Some(address.clone());
                        Ok(ConnectionState::Connecting { address, mode: ConnectMode::Fresh })
                    },
                    Ok(None) => Err(SessionFault::DiscoveryTimeout),
                    Err(source) => Err(SessionFault::Scan { source }),
                }
            },
            ConnectionState::Connecting { address, mode } => {
                match (self.connect(&address).await, mode) {
                    (Ok(link), _) => Ok(ConnectionState::SettingUp { link }),
                    (Err(err), ConnectMode::Direct) => {
                        info!("Direct connect to {} failed ({}), scanning instead", address, err);
                        Ok(ConnectionState::Scanning)
                    },
                    (Err(source), ConnectMode::Fresh) => Err(SessionFault::Connect { source }),
                }
            },
            ConnectionState::SettingUp { link } => {
                match self.set_up(&link).await {
                    Ok(events) => {
                        self.retry.reset();
                        self.outer.reset();

                        let record = DeviceRecord {
                            address: link.address(),
                            firmware_version: self.session.firmware.clone().unwrap_or_default(),
                        };
                        self.cache.save(&record).await;

                        info!("Started receiving data from {}", record.address);
                        Ok(ConnectionState::Streaming { link, events })
                    },
                    Err(source) => {
                        if let Err(err) = link.disconnect().await {
                            debug!("Disconnecting after failed setup: {}", err);
                        }
                        Err(SessionFault::Setup { source })
                    },
                }
            },
            ConnectionState::Streaming { link, mut events } => {
                match events.next().await {
                    Some(LinkEvent::Notification(payload)) => {
                        self.forward(&payload);
                        Ok(ConnectionState::Streaming { link, events })
                    },
                    Some(LinkEvent::Disconnected) | None => Err(SessionFault::StreamDisconnect),
                }
            },
        }
    }

    // a fault waits out its recovery delay and starts over from Idle
    pub async fn advance(&mut self, state: ConnectionState<H::Link>) -> ConnectionState<H::Link> {
        let previous = state.name();

        match self.step(state).await {
            Ok(next) => {
                if next.name() != previous {
                    debug!("{} -> {}", previous, next.name());
                }
                next
            },
            Err(fault) => {
                let delay = self.recovery_delay(&fault);
                warn!("{}; retrying in {:.1}s", fault, delay.as_secs_f64());
                sleep(delay).await;
                ConnectionState::Idle
            },
        }
    }

    pub async fn run(mut self) -> Infallible {
        self.load_cache().await;
        let mut state = ConnectionState::Idle;

        loop {
            state = self.advance(state).await;
        }
    }
}
