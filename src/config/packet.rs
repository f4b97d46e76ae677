//! Application packets of the configuration transport.
//!
//! Byte 0 of every packet is the message type; the payload starts at
//! offset 1. The transport itself (USB HID) lives outside this crate.

use super::error::ConfigError;
use super::record::{ConfigRecord, Variant};

/// Fixed packet size of the transport.
pub const PACKET_LEN: usize = 64;

/// Host asks for device information.
pub const MSG_GET_INFO: u8 = 0x05;

/// Host sends a new configuration record.
pub const MSG_SET_CONFIG: u8 = 0x06;

pub const UNIQUE_ID_LEN: usize = 8;
pub const FIRMWARE_VERSION_LEN: usize = 3;
pub const FIRMWARE_DESCRIPTION_LEN: usize = 32;

/// Length of the device information payload.
pub const DEVICE_INFO_LEN: usize =
    4 + UNIQUE_ID_LEN + 1 + FIRMWARE_VERSION_LEN + FIRMWARE_DESCRIPTION_LEN;

/// Device information reported on `MSG_GET_INFO`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Device clock, seconds since epoch.
    pub time: u32,
    pub unique_id: [u8; UNIQUE_ID_LEN],
    pub battery_state: u8,
    pub firmware_version: [u8; FIRMWARE_VERSION_LEN],
    /// Zero-padded ASCII.
    pub firmware_description: [u8; FIRMWARE_DESCRIPTION_LEN],
}

impl DeviceInfo {
    /// Pad `text` into a description field, truncating if needed.
    pub fn description_from_str(text: &str) -> [u8; FIRMWARE_DESCRIPTION_LEN] {
        let mut out = [0u8; FIRMWARE_DESCRIPTION_LEN];
        let n = text.len().min(FIRMWARE_DESCRIPTION_LEN);
        out[..n].copy_from_slice(&text.as_bytes()[..n]);
        out
    }
}

/// Write the device information reply. Byte 0 of `reply` is left to the
/// transport.
pub fn encode_device_info(info: &DeviceInfo, reply: &mut [u8]) -> Result<usize, ConfigError> {
    if reply.len() < 1 + DEVICE_INFO_LEN {
        return Err(ConfigError::OutputTooSmall);
    }

    let mut at = 1;
    reply[at..at + 4].copy_from_slice(&info.time.to_le_bytes());
    at += 4;
    reply[at..at + UNIQUE_ID_LEN].copy_from_slice(&info.unique_id);
    at += UNIQUE_ID_LEN;
    reply[at] = info.battery_state;
    at += 1;
    reply[at..at + FIRMWARE_VERSION_LEN].copy_from_slice(&info.firmware_version);
    at += FIRMWARE_VERSION_LEN;
    reply[at..at + FIRMWARE_DESCRIPTION_LEN].copy_from_slice(&info.firmware_description);
    at += FIRMWARE_DESCRIPTION_LEN;

    Ok(at)
}

/// Decode a `MSG_SET_CONFIG` packet and echo the accepted record into
/// `reply` at offset 1.
///
/// The caller persists the returned record; a refused record leaves the
/// reply untouched.
pub fn handle_set_config(
    received: &[u8],
    variant: Variant,
    reply: &mut [u8],
) -> Result<ConfigRecord, ConfigError> {
    match received.first() {
        Some(&MSG_SET_CONFIG) => {}
        Some(_) => return Err(ConfigError::UnknownMessageType),
        None => return Err(ConfigError::RecordTooShort),
    }

    let record = ConfigRecord::decode(&received[1..], variant)?;

    if reply.len() < 1 + variant.record_len() {
        return Err(ConfigError::OutputTooSmall);
    }
    record.encode(&mut reply[1..])?;

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_info_layout() {
        let info = DeviceInfo {
            time: 0x01020304,
            unique_id: [1, 2, 3, 4, 5, 6, 7, 8],
            battery_state: 9,
            firmware_version: [1, 0, 0],
            firmware_description: DeviceInfo::description_from_str("Tone-Detector"),
        };

        let mut reply = [0u8; PACKET_LEN];
        let end = encode_device_info(&info, &mut reply).unwrap();
        assert_eq!(end, 1 + DEVICE_INFO_LEN);
        assert_eq!(&reply[1..5], &[4, 3, 2, 1]);
        assert_eq!(&reply[5..13], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(reply[13], 9);
        assert_eq!(&reply[14..17], &[1, 0, 0]);
        assert_eq!(&reply[17..30], b"Tone-Detector");
        assert_eq!(reply[30], 0);
    }

    #[test]
    fn test_set_config_wrong_type() {
        let packet = [MSG_GET_INFO; PACKET_LEN];
        let mut reply = [0u8; PACKET_LEN];
        assert_eq!(
            handle_set_config(&packet, Variant::Detector, &mut reply),
            Err(ConfigError::UnknownMessageType)
        );
    }
}
