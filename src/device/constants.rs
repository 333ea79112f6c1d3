use uuid::Uuid;

/**
 * The local name the sensor advertises; discovery matches on it.
 */
pub const DEVICE_NAME: &str = "OpenWind";

/**
 * How long (milliseconds) a connect attempt may take.
 */
pub const CONNECT_TIMEOUT: u64 = 15000;

/**
 * How long (milliseconds) to listen for advertisements before giving up.
 */
pub const SCAN_TIMEOUT: u64 = 10000;

/**
 * How often (milliseconds) to check the connection status while streaming.
 */
pub const IS_CONNECTED_POLL_DELAY: u64 = 1000;

/**
 * How long (milliseconds) a connection status check may take before the link is considered lost.
 */
pub const IS_CONNECTED_DEADLINE: u64 = 2000;

/**
 * How long (milliseconds) a read or write of a characteristic may take.
 */
pub const GATT_DEADLINE: u64 = 5000;

/**
 * How long (milliseconds) to let the sensor settle after enabling movement data.
 */
pub const SETTLE_DELAY: u64 = 300;

/**
 * How long (milliseconds) to wait before reconnecting after the link dropped while streaming.
 */
pub const STREAM_RECONNECT_DELAY: u64 = 500;

/**
 * Discovery backoff: `DISCOVERY_BASE_DELAY * BACKOFF_FACTOR ^ min(failures, DISCOVERY_MAX_EXPONENT)`,
 * capped at DISCOVERY_MAX_DELAY (milliseconds).
 */
pub const DISCOVERY_BASE_DELAY: u64 = 1000;
pub const DISCOVERY_MAX_DELAY: u64 = 30000;
pub const DISCOVERY_MAX_EXPONENT: i32 = 6;

/**
 * Backoff for faults outside discovery, starting at OUTER_INITIAL_DELAY and capped at OUTER_MAX_DELAY
 * (milliseconds).
 */
pub const OUTER_INITIAL_DELAY: u64 = 1000;
pub const OUTER_MAX_DELAY: u64 = 15000;

pub const BACKOFF_FACTOR: f64 = 1.5;

/**
 * The UUID of the characteristic that notifies wind (and, on newer firmware, heading) data.
 */
pub const OPENWIND_WIND_CHARACTERISTIC: &str = "0000cc91-0000-1000-8000-00805f9b34fb";

/**
 * The UUID of the characteristic that enables movement data when written to.
 */
pub const OPENWIND_MOV_ENABLE_CHARACTERISTIC: &str = "0000aa82-0000-1000-8000-00805f9b34fb";

/**
 * The UUID of the standard "Firmware Revision String" characteristic.
 */
pub const OPENWIND_FW_CHARACTERISTIC: &str = "00002a26-0000-1000-8000-00805f9b34fb";

pub const COMMAND_MOV_ENABLE: [u8; 1] = [0x2C];

/**
 * Firmware versions from this one onwards append the heading to the wind notification.
 */
pub const HEADING_MIN_FIRMWARE: f64 = 1.25;

/**
 * The raw heading is in 1/16 degree steps, offset by 90 degrees.
 */
pub const HEADING_SCALE: f64 = 1.0 / 16.0;
pub const HEADING_OFFSET: f64 = 90.0;

pub const WIND_ANGLE_SCALE: f64 = 0.1;
pub const WIND_SPEED_SCALE: f64 = 0.01;

pub fn make_wind_uuid() -> Uuid {
    Uuid::parse_str(OPENWIND_WIND_CHARACTERISTIC).unwrap()
}

pub fn make_mov_enable_uuid() -> Uuid {
    Uuid::parse_str(OPENWIND_MOV_ENABLE_CHARACTERISTIC).unwrap()
}

pub fn make_fw_uuid() -> Uuid {
    Uuid::parse_str(OPENWIND_FW_CHARACTERISTIC).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuids_are_the_16_bit_gatt_ids() {
        assert_eq!(make_wind_uuid(), Uuid::from_u128(0x0000cc91_0000_1000_8000_00805f9b34fb));
        assert_eq!(make_mov_enable_uuid(), Uuid::from_u128(0x0000aa82_0000_1000_8000_00805f9b34fb));
        assert_eq!(make_fw_uuid(), Uuid::from_u128(0x00002a26_0000_1000_8000_00805f9b34fb));
    }
}
