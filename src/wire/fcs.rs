//! The 16-bit frame check sequence carried in the MAC trailer

/// Length in octets of the FCS trailer
pub const FCS_LENGTH: usize = 2;

/// Whether FCS values are computed or written as zero.
///
/// When disabled, the trailer field is still present on the wire but
/// carries zero and every received frame passes the check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum FcsMode {
    Enabled,
    Disabled,
}

/// ITU-T CRC-16 over the raw frame bytes, excluding the trailer itself.
///
/// This is the running-accumulator formulation. The exact sequence of
/// folds matters for wire compatibility, so don't replace it with a
/// table-driven variant without checking the test vectors.
pub fn crc16(data: &[u8]) -> u16 {
    let mut accumulator: u16 = 0;

    for byte in data {
        accumulator ^= *byte as u16;
        accumulator = (accumulator >> 8) | (accumulator << 8);
        accumulator ^= (accumulator & 0xff00) << 4;
        accumulator ^= (accumulator >> 8) >> 4;
        accumulator ^= (accumulator & 0xff00) >> 5;
    }

    accumulator
}

/// Check the FCS of a complete frame buffer (trailer included).
///
/// Buffers shorter than the trailer never pass.
pub fn verify(buffer: &[u8], mode: FcsMode) -> bool {
    if matches!(mode, FcsMode::Disabled) {
        return true;
    }

    let Some(body_len) = buffer.len().checked_sub(FCS_LENGTH) else {
        return false;
    };

    let fcs = u16::from_le_bytes([buffer[body_len], buffer[body_len + 1]]);
    crc16(&buffer[..body_len]) == fcs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let data = [0x12, 0x34, 0x56, 0x78, 0x9a];
        assert_eq!(crc16(&data), crc16(&data));
    }

    #[test]
    fn order_sensitive() {
        assert_ne!(crc16(&[1, 2, 3]), crc16(&[3, 2, 1]));
    }

    #[test]
    fn bit_flips_change_the_result() {
        let data: heapless::Vec<u8, 64> = (0u8..64).collect();
        let reference = crc16(&data);

        for byte in 0..data.len() {
            for bit in 0..8 {
                let mut flipped = data.clone();
                flipped[byte] ^= 1 << bit;
                assert_ne!(crc16(&flipped), reference, "byte {byte} bit {bit}");
            }
        }
    }

    #[test]
    fn empty_input() {
        assert_eq!(crc16(&[]), 0);
    }

    #[test]
    fn verify_accepts_valid_trailer() {
        let mut buffer = heapless::Vec::<u8, 16>::from_slice(&[1, 2, 3, 4]).unwrap();
        let fcs = crc16(&buffer);
        buffer.extend_from_slice(&fcs.to_le_bytes()).unwrap();

        assert!(verify(&buffer, FcsMode::Enabled));

        buffer[0] ^= 1;
        assert!(!verify(&buffer, FcsMode::Enabled));
        assert!(verify(&buffer, FcsMode::Disabled));
    }

    #[test]
    fn verify_rejects_short_buffers() {
        assert!(!verify(&[0x42], FcsMode::Enabled));
    }
}
