//! # VESC Packet Protocol
//!
//! Framing for commands sent to VESC-compatible motor controllers over UART/USB.
//!
//! ## Short Packet Structure
//!
//! ```text
//! [START] [LENGTH] [PAYLOAD...] [CRC_HI] [CRC_LO] [END]
//!  0x02     1 byte   1-255 bytes  CRC16-XMODEM     0x03
//! ```
//!
//! - **START**: 0x02 for payloads up to 255 bytes
//! - **LENGTH**: payload length
//! - **PAYLOAD**: command id followed by command data
//! - **CRC**: CRC16-XMODEM over the payload, big-endian
//! - **END**: 0x03
//!
//! ## Set Duty Command
//!
//! `COMM_SET_DUTY` (5) followed by the duty cycle scaled by 100,000 as a
//! big-endian `i32`.

use bytes::{BufMut, BytesMut};

use super::crc::crc16_xmodem;

/// Start byte for packets with a one-byte length field
pub const VESC_START_SHORT: u8 = 0x02;

/// End byte
pub const VESC_END: u8 = 0x03;

/// Largest payload a short packet can carry
pub const VESC_MAX_SHORT_PAYLOAD: usize = 255;

/// Command id: set duty cycle
pub const COMM_SET_DUTY: u8 = 5;

/// Duty cycle scale factor on the wire
pub const DUTY_SCALE: f32 = 100_000.0;

/// Encoded length of a set-duty frame (start + len + 5 payload + crc + end)
pub const SET_DUTY_FRAME_LENGTH: usize = 10;

/// Encode a set-duty-cycle command
///
/// `duty` is clamped to -1.0..=1.0; a non-finite value encodes as 0.
///
/// # Examples
///
/// ```
/// use joydrive::motor::protocol::{encode_set_duty_frame, SET_DUTY_FRAME_LENGTH};
///
/// let frame = encode_set_duty_frame(0.5);
/// assert_eq!(frame.len(), SET_DUTY_FRAME_LENGTH);
/// assert_eq!(frame[0], 0x02);
/// assert_eq!(*frame.last().unwrap(), 0x03);
/// ```
pub fn encode_set_duty_frame(duty: f32) -> Vec<u8> {
    frame_payload(&encode_set_duty_payload(duty))
}

/// Encode the set-duty payload (command id + scaled duty)
pub fn encode_set_duty_payload(duty: f32) -> [u8; 5] {
    let duty = if duty.is_finite() { duty.clamp(-1.0, 1.0) } else { 0.0 };
    let scaled = (duty * DUTY_SCALE).round() as i32;

    let mut payload = [0u8; 5];
    payload[0] = COMM_SET_DUTY;
    payload[1..].copy_from_slice(&scaled.to_be_bytes());
    payload
}

/// Build start + length + payload + CRC + end.
fn frame_payload(payload: &[u8]) -> Vec<u8> {
    debug_assert!(!payload.is_empty() && payload.len() <= VESC_MAX_SHORT_PAYLOAD);
    let crc = crc16_xmodem(payload);

    let mut frame = BytesMut::with_capacity(payload.len() + 5);
    frame.put_u8(VESC_START_SHORT);
    frame.put_u8(payload.len() as u8);
    frame.put_slice(payload);
    frame.put_u16(crc);
    frame.put_u8(VESC_END);

    frame.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_constants() {
        assert_eq!(VESC_START_SHORT, 0x02);
        assert_eq!(VESC_END, 0x03);
        assert_eq!(COMM_SET_DUTY, 5);
        assert_eq!(SET_DUTY_FRAME_LENGTH, 10);
    }

    #[test]
    fn test_set_duty_payload_values() {
        assert_eq!(encode_set_duty_payload(0.0), [0x05, 0x00, 0x00, 0x00, 0x00]);
        // 0.8 * 100000 = 80000 = 0x00013880
        assert_eq!(encode_set_duty_payload(0.8), [0x05, 0x00, 0x01, 0x38, 0x80]);
        // -0.5 * 100000 = -50000 = 0xFFFF3CB0
        assert_eq!(encode_set_duty_payload(-0.5), [0x05, 0xFF, 0xFF, 0x3C, 0xB0]);
    }

    #[test]
    fn test_set_duty_payload_clamps() {
        assert_eq!(encode_set_duty_payload(1.5), encode_set_duty_payload(1.0));
        assert_eq!(encode_set_duty_payload(-3.0), encode_set_duty_payload(-1.0));
        assert_eq!(encode_set_duty_payload(f32::NAN), encode_set_duty_payload(0.0));
    }

    #[test]
    fn test_set_duty_frame_structure() {
        let frame = encode_set_duty_frame(0.8);

        assert_eq!(frame.len(), SET_DUTY_FRAME_LENGTH);
        assert_eq!(frame[0], VESC_START_SHORT);
        assert_eq!(frame[1], 5, "length byte should count the payload only");
        assert_eq!(&frame[2..7], &[0x05, 0x00, 0x01, 0x38, 0x80]);

        let crc = crc16_xmodem(&frame[2..7]);
        assert_eq!(frame[7], (crc >> 8) as u8);
        assert_eq!(frame[8], (crc & 0xFF) as u8);
        assert_eq!(frame[9], VESC_END);
    }

    #[test]
    fn test_set_duty_frame_wraps_payload() {
        let payload = encode_set_duty_payload(-0.25);
        assert_eq!(frame_payload(&payload), encode_set_duty_frame(-0.25));
    }

    #[test]
    fn test_frame_max_short_payload() {
        let frame = frame_payload(&[0u8; VESC_MAX_SHORT_PAYLOAD]);
        assert_eq!(frame.len(), 260);
        assert_eq!(frame[1], 255);
        assert_eq!(frame[259], VESC_END);
    }
}
