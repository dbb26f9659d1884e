//! The auxiliary security header
//!
//! Only field accounting is implemented. Actual cryptographic
//! processing of secured frames is out of scope.

use byte::{check_len, BytesExt, TryRead, TryWrite, LE};

const SECURITY_LEVEL_MASK: u8 = 0b0000_0111;
const KEY_ID_MODE_SHIFT: usize = 3;
const KEY_ID_MODE_MASK: u8 = 0b0001_1000;

/// The key identifier mode subfield of the security control octet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum KeyIdMode {
    /// The key is known implicitly by both sides, no key identifier field
    Implicit = 0,
    /// A key index only
    NoKeySource = 1,
    /// A 4 octet key source plus key index
    ShortKeySource = 2,
    /// An 8 octet key source plus key index
    LongKeySource = 3,
}

/// The originator of the key named by a key identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum KeySource {
    Short(u32),
    Long(u64),
}

/// The key identifier field. Present unless the key is implicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct KeyIdentifier {
    pub key_source: Option<KeySource>,
    pub key_index: u8,
}

/// Auxiliary security header, 5 to 14 octets depending on the key
/// identifier mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct AuxiliarySecurityHeader {
    /// Security level subfield, 3 bits
    pub security_level: u8,
    /// Frame counter used for replay protection
    pub frame_counter: u32,
    pub key_identifier: Option<KeyIdentifier>,
}

impl AuxiliarySecurityHeader {
    pub fn key_id_mode(&self) -> KeyIdMode {
        match self.key_identifier {
            None => KeyIdMode::Implicit,
            Some(KeyIdentifier {
                key_source: None, ..
            }) => KeyIdMode::NoKeySource,
            Some(KeyIdentifier {
                key_source: Some(KeySource::Short(_)),
                ..
            }) => KeyIdMode::ShortKeySource,
            Some(KeyIdentifier {
                key_source: Some(KeySource::Long(_)),
                ..
            }) => KeyIdMode::LongKeySource,
        }
    }

    /// The encoded size: 5, 6, 10 or 14 octets
    pub fn encoded_len(&self) -> usize {
        5 + match self.key_id_mode() {
            KeyIdMode::Implicit => 0,
            KeyIdMode::NoKeySource => 1,
            KeyIdMode::ShortKeySource => 5,
            KeyIdMode::LongKeySource => 9,
        }
    }
}

impl TryWrite for AuxiliarySecurityHeader {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        let offset = &mut 0;

        let control = (self.security_level & SECURITY_LEVEL_MASK)
            | ((self.key_id_mode() as u8) << KEY_ID_MODE_SHIFT);
        bytes.write(offset, control)?;
        bytes.write_with(offset, self.frame_counter, LE)?;

        if let Some(key_identifier) = self.key_identifier {
            match key_identifier.key_source {
                None => {}
                Some(KeySource::Short(source)) => bytes.write_with(offset, source, LE)?,
                Some(KeySource::Long(source)) => bytes.write_with(offset, source, LE)?,
            }
            bytes.write(offset, key_identifier.key_index)?;
        }

        Ok(*offset)
    }
}

impl TryRead<'_> for AuxiliarySecurityHeader {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        let offset = &mut 0;
        check_len(bytes, 5)?;

        let control: u8 = bytes.read(offset)?;
        let security_level = control & SECURITY_LEVEL_MASK;
        let key_id_mode = (control & KEY_ID_MODE_MASK) >> KEY_ID_MODE_SHIFT;
        let frame_counter: u32 = bytes.read_with(offset, LE)?;

        let key_identifier = match key_id_mode {
            0 => None,
            1 => Some(KeyIdentifier {
                key_source: None,
                key_index: bytes.read(offset)?,
            }),
            2 => Some(KeyIdentifier {
                key_source: Some(KeySource::Short(bytes.read_with(offset, LE)?)),
                key_index: bytes.read(offset)?,
            }),
            3 => Some(KeyIdentifier {
                key_source: Some(KeySource::Long(bytes.read_with(offset, LE)?)),
                key_index: bytes.read(offset)?,
            }),
            _ => unreachable!(),
        };

        Ok((
            Self {
                security_level,
                frame_counter,
                key_identifier,
            },
            *offset,
        ))
    }
}
