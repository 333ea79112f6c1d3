use std::fmt::Debug;
use std::future::Future;
use btleplug::api::{BDAddr, Central, CentralEvent, CharPropFlags, Characteristic, Manager as _, Peripheral as _, ScanFilter, ValueNotification, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::future::ready;
use futures::{pin_mut, stream, Stream, StreamExt};
use log::{info, warn};
use tokio::time::{sleep, timeout, Duration};
use uuid::Uuid;

use crate::device::constants::{GATT_DEADLINE, IS_CONNECTED_DEADLINE, IS_CONNECTED_POLL_DELAY};
use crate::device::host::{SensorLink, WirelessHost};
use crate::device::types::{LinkEvent, LinkEvents};
use crate::error::DeviceError;

// Some platforms (macOS) hide the hardware address; fall back to the platform id there.
fn peripheral_address(peripheral: &Peripheral) -> String {
    let address = peripheral.address();
    if address == BDAddr::from([0u8; 6]) {
        format!("{:?}", peripheral.id())
    } else {
        address.to_string()
    }
}

async fn with_deadline<T>(operation: &'static str, fut: impl Future<Output = Result<T, btleplug::Error>>) -> Result<T, DeviceError> {
    tokio::select! {
        _ = sleep(Duration::from_millis(GATT_DEADLINE)) => {
            Err(DeviceError::Timeout { operation })
        }
        result = fut => Ok(result?),
    }
}

// Start every item in order. If one fails, the ones already started are stopped again.
async fn start_all<T, E, S, SF, P, PF>(items: &[T], mut start: S, mut stop: P) -> Result<(), E>
where
    T: Clone,
    S: FnMut(T) -> SF,
    SF: Future<Output = Result<(), E>>,
    P: FnMut(T) -> PF,
    PF: Future<Output = ()>,
{
    for (index, item) in items.iter().enumerate() {
        if let Err(err) = start(item.clone()).await {
            for started in &items[..index] {
                stop(started.clone()).await;
            }
            return Err(err);
        }
    }

    Ok(())
}

// The first advertisement for `name` within `window`. The stream only carries devices that
// were actually heard while scanning, paired with the name they advertise.
async fn first_advertised<S, T>(advertisements: S, name: &str, window: Duration) -> Option<T>
where
    S: Stream<Item = (T, String)>,
{
    pin_mut!(advertisements);

    let found = timeout(window, async {
        while let Some((item, local_name)) = advertisements.next().await {
            if local_name == name {
                return Some(item);
            }
        }
        None
    }).await;

    found.ok().flatten()
}

// Yields `Disconnected` once `check` reports the link is gone, fails, or takes too long. Covers
// platforms (macOS) that do not reliably emit a disconnect event.
fn liveness_events<C, Fut, E>(check: C) -> impl Stream<Item = LinkEvent>
where
    C: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: Debug,
{
    stream::unfold(check, |mut check| async move {
        loop {
            sleep(Duration::from_millis(IS_CONNECTED_POLL_DELAY)).await;

            match timeout(Duration::from_millis(IS_CONNECTED_DEADLINE), check()).await {
                Ok(Ok(true)) => continue,
                Ok(Ok(false)) => warn!("Connection lost"),
                Ok(Err(err)) => warn!("Error checking for connection state: {:?}", err),
                Err(_) => warn!("Checking for connection status took too long"),
            }

            return Some((LinkEvent::Disconnected, check));
        }
    })
}

async fn find_peripheral(adapters: &[Adapter], address: &str) -> Option<(Adapter, Peripheral)> {
    for adapter in adapters {
        let peripherals = match adapter.peripherals().await {
            Ok(v) => v,
            Err(err) => {
                warn!("Failed to query BLE adapter for peripherals: {}", err);
                continue;
            },
        };

        for peripheral in peripherals {
            if peripheral_address(&peripheral) == address {
                return Some((adapter.clone(), peripheral));
            }
        }
    }

    None
}

async fn advertised_peripheral(adapter: Adapter, event: CentralEvent) -> Option<(Peripheral, String)> {
    let id = match event {
        CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => id,
        _ => return None,
    };

    let peripheral = adapter.peripheral(&id).await.ok()?;
    let local_name = peripheral.properties().await.ok()??.local_name?;
    Some((peripheral, local_name))
}

pub struct BtleHost {
    // kept alive for as long as the adapters are in use
    _manager: Manager,
    adapters: Vec<Adapter>,
}

impl BtleHost {
    // fails when the host has no usable bluetooth stack or adapter
    pub async fn new() -> Result<Self, DeviceError> {
        let manager = Manager::new().await?;
        let adapters = manager.adapters().await?;

        if adapters.is_empty() {
            return Err(DeviceError::NoAdapter);
        }

        for adapter in &adapters {
            info!("Using adapter {}", adapter.adapter_info().await.unwrap_or("UNKNOWN".to_string()));
        }

        Ok(BtleHost { _manager: manager, adapters })
    }

    async fn stop_scan(adapter: Adapter) {
        if let Err(err) = adapter.stop_scan().await {
            warn!("Failed to stop scanning: {}", err);
        }
    }
}

impl WirelessHost for BtleHost {
    type Link = BtleLink;

    async fn scan(&self, name: &str, scan_timeout: Duration) -> Result<Option<String>, DeviceError> {
        // subscribe before scanning so the first advertisement is not missed
        let mut streams = Vec::with_capacity(self.adapters.len());
        for adapter in &self.adapters {
            let events = adapter.events().await?;
            let adapter = adapter.clone();
            streams.push(events.map(move |event| (adapter.clone(), event)));
        }
        let advertisements = stream::select_all(streams)
            .filter_map(|(adapter, event)| advertised_peripheral(adapter, event));

        info!("Scanning for {} device...", name);
        start_all(
            &self.adapters,
            |adapter| async move { adapter.start_scan(ScanFilter::default()).await },
            BtleHost::stop_scan,
        ).await?;

        let found = first_advertised(advertisements, name, scan_timeout).await;

        for adapter in &self.adapters {
            BtleHost::stop_scan(adapter.clone()).await;
        }

        match found {
            Some(peripheral) => {
                let address = peripheral_address(&peripheral);
                info!("Found {} device: {}", name, address);
                Ok(Some(address))
            },
            None => {
                info!("{} device not found", name);
                Ok(None)
            },
        }
    }

    async fn connect(&self, address: &str) -> Result<BtleLink, DeviceError> {
        let (adapter, peripheral) = find_peripheral(&self.adapters, address)
            .await
            .ok_or_else(|| DeviceError::UnknownAddress { address: address.to_string() })?;

        info!("Connecting to peripheral {}...", address);
        peripheral.connect().await?;

        info!("Connected; Discovering services...");
        peripheral.discover_services().await?;

        Ok(BtleLink { adapter, peripheral, address: address.to_string() })
    }
}

pub struct BtleLink {
    adapter: Adapter,
    peripheral: Peripheral,
    address: String,
}

impl BtleLink {
    fn find_characteristic(&self, uuid: Uuid) -> Result<Characteristic, DeviceError> {
        self.peripheral
            .characteristics()
            .into_iter()
            .find(|characteristic| characteristic.uuid == uuid)
            .ok_or(DeviceError::MissingCharacteristic { uuid })
    }
}

impl SensorLink for BtleLink {
    fn address(&self) -> String {
        self.address.clone()
    }

    async fn read(&self, characteristic: Uuid) -> Result<Vec<u8>, DeviceError> {
        let characteristic = self.find_characteristic(characteristic)?;
        with_deadline("read", self.peripheral.read(&characteristic)).await
    }

    async fn write(&self, characteristic: Uuid, value: &[u8]) -> Result<(), DeviceError> {
        let characteristic = self.find_characteristic(characteristic)?;
        let write_type = if characteristic.properties.contains(CharPropFlags::WRITE) {
            WriteType::WithResponse
        } else {
            WriteType::WithoutResponse
        };

        with_deadline("write", self.peripheral.write(&characteristic, value, write_type)).await
    }

    async fn subscribe(&self, characteristic: Uuid) -> Result<LinkEvents, DeviceError> {
        let uuid = characteristic;
        let characteristic = self.find_characteristic(uuid)?;

        // obtain both streams before subscribing so no early notification is missed
        let notifications = self.peripheral.notifications().await?;
        let central_events = self.adapter.events().await?;

        info!("Subscribing to characteristic {:?}", uuid);
        with_deadline("subscribe", self.peripheral.subscribe(&characteristic)).await?;

        let id = self.peripheral.id();
        let values = notifications
            .filter(move |notification: &ValueNotification| ready(notification.uuid == uuid))
            .map(|notification| LinkEvent::Notification(notification.value))
            .chain(stream::once(ready(LinkEvent::Disconnected)));
        let dropped = central_events.filter_map(move |event| ready(match event {
            CentralEvent::DeviceDisconnected(peripheral_id) if peripheral_id == id => Some(LinkEvent::Disconnected),
            _ => None,
        }));
        let peripheral = self.peripheral.clone();
        let liveness = liveness_events(move || {
            let peripheral = peripheral.clone();
            async move { peripheral.is_connected().await }
        });

        Ok(Box::pin(stream::select(stream::select(values, dropped), liveness)))
    }

    async fn disconnect(&self) -> Result<(), DeviceError> {
        self.peripheral.disconnect().await?;
        Ok(())
    }
}
