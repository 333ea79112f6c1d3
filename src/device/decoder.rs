use crate::device::constants::{HEADING_MIN_FIRMWARE, HEADING_OFFSET, HEADING_SCALE, WIND_ANGLE_SCALE, WIND_SPEED_SCALE};
use crate::device::types::{HeadingSample, Reading, WindSample};
use crate::error::DecodeError;

const WIND_PAYLOAD_LEN: usize = 5;
const HEADING_PAYLOAD_LEN: usize = 7;

fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

/// Whether this firmware appends the heading to wind notifications.
pub fn firmware_has_heading(firmware: &str) -> Result<bool, DecodeError> {
    match firmware.trim().parse::<f64>() {
        Ok(version) => Ok(version >= HEADING_MIN_FIRMWARE),
        Err(_) => Err(DecodeError::Firmware { version: firmware.to_string() }),
    }
}

pub fn decode_wind(data: &[u8]) -> Result<WindSample, DecodeError> {
    if data.len() < WIND_PAYLOAD_LEN {
        return Err(DecodeError::Truncated { field: "wind", needed: WIND_PAYLOAD_LEN, actual: data.len() });
    }

    Ok(WindSample {
        apparent_angle_deg: f64::from(read_u16_le(data, 1)) * WIND_ANGLE_SCALE,
        apparent_speed_kts: f64::from(read_u16_le(data, 3)) * WIND_SPEED_SCALE,
    })
}

pub fn decode_heading(data: &[u8]) -> Result<HeadingSample, DecodeError> {
    if data.len() < HEADING_PAYLOAD_LEN {
        return Err(DecodeError::Truncated { field: "heading", needed: HEADING_PAYLOAD_LEN, actual: data.len() });
    }

    let heading = f64::from(read_u16_le(data, 5)) * HEADING_SCALE - HEADING_OFFSET;

    // the raw range reaches past 360 as well as below 0
    Ok(HeadingSample { heading_deg: heading.rem_euclid(360.0) })
}

/// Decode one wind notification. `firmware` is `None` while the version is not known yet,
/// which is treated like firmware without heading support.
pub fn decode(data: &[u8], firmware: Option<&str>) -> Reading {
    let wind = decode_wind(data);

    let heading = match firmware.map(firmware_has_heading) {
        None | Some(Ok(false)) => Ok(None),
        Some(Ok(true)) => decode_heading(data).map(Some),
        Some(Err(err)) => Err(err),
    };

    Reading { wind, heading }
}
