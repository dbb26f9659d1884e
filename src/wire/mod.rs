//! Frame formats of the MAC sublayer
//!
//! Everything here is sans-io: a [Frame] is parsed from and written to
//! plain byte buffers with the [byte] crate. All multi-octet fields are
//! little endian on the wire.

use byte::{check_len, BytesExt, TryRead, TryWrite, LE};

use crate::wire::fcs::{FcsMode, FCS_LENGTH};

pub mod fcs;
pub mod security;

use security::AuxiliarySecurityHeader;

const VERSION_MASK: u16 = 0b0000_0000_0000_0011;
const FRAME_TYPE_SHIFT: usize = 6;
const FRAME_TYPE_MASK: u16 = 0b0000_0001_1100_0000;
const SECURITY_ENABLED: u16 = 1 << 9;
const FRAME_PENDING: u16 = 1 << 10;
const ACK_REQUEST: u16 = 1 << 11;
const DST_ADDR_MODE_SHIFT: usize = 12;
const DST_ADDR_MODE_MASK: u16 = 0b0011_0000_0000_0000;
const SRC_ADDR_MODE_SHIFT: usize = 14;
const SRC_ADDR_MODE_MASK: u16 = 0b1100_0000_0000_0000;

/// A 16-bit device address, allocated on association
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct ShortAddress(pub u16);

impl ShortAddress {
    /// The address that targets every device in the VPAN
    pub const BROADCAST: Self = Self(crate::consts::BROADCAST_SHORT_ADDRESS);

    pub const fn is_broadcast(&self) -> bool {
        self.0 == Self::BROADCAST.0
    }
}

/// A 64-bit globally unique device address
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct ExtendedAddress(pub u64);

/// The identifier of a visible light personal area network
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct VpanId(pub u16);

impl VpanId {
    /// Addresses every VPAN in range. Also the value an unassociated
    /// device carries as its own VPAN id.
    pub const BROADCAST: Self = Self(crate::consts::BROADCAST_VPAN_ID);

    pub const fn is_broadcast(&self) -> bool {
        self.0 == Self::BROADCAST.0
    }
}

/// A full over-the-air address, a VPAN id plus a device address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Address {
    Short(VpanId, ShortAddress),
    Extended(VpanId, ExtendedAddress),
}

impl Address {
    pub const BROADCAST: Self = Self::Short(VpanId::BROADCAST, ShortAddress::BROADCAST);

    pub const fn vpan_id(&self) -> VpanId {
        match self {
            Address::Short(vpan_id, _) => *vpan_id,
            Address::Extended(vpan_id, _) => *vpan_id,
        }
    }

    pub const fn mode(&self) -> AddressingMode {
        match self {
            Address::Short(_, _) => AddressingMode::Short,
            Address::Extended(_, _) => AddressingMode::Extended,
        }
    }

    /// True for the short broadcast address, regardless of VPAN id
    pub const fn is_broadcast(&self) -> bool {
        match self {
            Address::Short(_, address) => address.is_broadcast(),
            Address::Extended(_, _) => false,
        }
    }
}

/// The addressing mode subfields of the frame control field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum AddressingMode {
    None = 0,
    Reserved = 1,
    Short = 2,
    Extended = 3,
}

impl From<Option<Address>> for AddressingMode {
    fn from(value: Option<Address>) -> Self {
        match value {
            None => AddressingMode::None,
            Some(address) => address.mode(),
        }
    }
}

/// The frame type subfield of the frame control field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum FrameType {
    Beacon,
    Data,
    Acknowledgment,
    MacCommand,
    /// Any of the reserved frame type values. Receivers drop these.
    Reserved,
}

impl FrameType {
    const fn from_bits(bits: u8) -> Self {
        match bits {
            0 => FrameType::Beacon,
            1 => FrameType::Data,
            2 => FrameType::Acknowledgment,
            3 => FrameType::MacCommand,
            _ => FrameType::Reserved,
        }
    }

    const fn into_bits(self) -> u8 {
        match self {
            FrameType::Beacon => 0,
            FrameType::Data => 1,
            FrameType::Acknowledgment => 2,
            FrameType::MacCommand => 3,
            FrameType::Reserved => 4,
        }
    }
}

/// The MAC header (MHR)
///
/// The source VPAN id is compressed away whenever a destination address
/// is present. Decoding then takes the source VPAN id from the
/// destination, so a parsed header always carries complete addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Header {
    pub frame_type: FrameType,
    pub frame_pending: bool,
    pub ack_request: bool,
    /// Frame version subfield. Frames with a version above 1 are
    /// dropped by the receive filter.
    pub frame_version: u8,
    pub seq: u8,
    pub destination: Option<Address>,
    pub source: Option<Address>,
    pub auxiliary_security_header: Option<AuxiliarySecurityHeader>,
}

impl Header {
    pub fn security_enabled(&self) -> bool {
        self.auxiliary_security_header.is_some()
    }

    /// The number of octets this header takes on the wire
    pub fn encoded_len(&self) -> usize {
        let address_len = |address: &Address, with_vpan_id: bool| {
            let address_len = match address {
                Address::Short(_, _) => 2,
                Address::Extended(_, _) => 8,
            };
            address_len + if with_vpan_id { 2 } else { 0 }
        };

        2 + 1
            + self
                .destination
                .as_ref()
                .map_or(0, |address| address_len(address, true))
            + self
                .source
                .as_ref()
                .map_or(0, |address| address_len(address, self.destination.is_none()))
            + self
                .auxiliary_security_header
                .as_ref()
                .map_or(0, |aux| aux.encoded_len())
    }
}

impl TryWrite for Header {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        let offset = &mut 0;

        let frame_control = (self.frame_version as u16 & VERSION_MASK)
            | ((self.frame_type.into_bits() as u16) << FRAME_TYPE_SHIFT)
            | if self.security_enabled() {
                SECURITY_ENABLED
            } else {
                0
            }
            | if self.frame_pending { FRAME_PENDING } else { 0 }
            | if self.ack_request { ACK_REQUEST } else { 0 }
            | ((AddressingMode::from(self.destination) as u16) << DST_ADDR_MODE_SHIFT)
            | ((AddressingMode::from(self.source) as u16) << SRC_ADDR_MODE_SHIFT);

        bytes.write_with(offset, frame_control, LE)?;
        bytes.write(offset, self.seq)?;

        if let Some(destination) = self.destination {
            bytes.write_with(offset, destination.vpan_id().0, LE)?;
            match destination {
                Address::Short(_, address) => bytes.write_with(offset, address.0, LE)?,
                Address::Extended(_, address) => bytes.write_with(offset, address.0, LE)?,
            }
        }

        if let Some(source) = self.source {
            if self.destination.is_none() {
                bytes.write_with(offset, source.vpan_id().0, LE)?;
            }
            match source {
                Address::Short(_, address) => bytes.write_with(offset, address.0, LE)?,
                Address::Extended(_, address) => bytes.write_with(offset, address.0, LE)?,
            }
        }

        if let Some(aux) = self.auxiliary_security_header {
            bytes.write(offset, aux)?;
        }

        Ok(*offset)
    }
}

impl TryRead<'_> for Header {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        let offset = &mut 0;
        check_len(bytes, 3)?;

        let frame_control: u16 = bytes.read_with(offset, LE)?;
        let seq: u8 = bytes.read(offset)?;

        let frame_version = (frame_control & VERSION_MASK) as u8;
        let frame_type =
            FrameType::from_bits(((frame_control & FRAME_TYPE_MASK) >> FRAME_TYPE_SHIFT) as u8);
        let frame_pending = frame_control & FRAME_PENDING != 0;
        let ack_request = frame_control & ACK_REQUEST != 0;

        let mut read_address = |mode_bits: u16, vpan_id: Option<VpanId>| {
            let vpan_id = match vpan_id {
                Some(vpan_id) => vpan_id,
                None => VpanId(bytes.read_with(offset, LE)?),
            };

            match mode_bits {
                0 => Ok(None),
                2 => Ok(Some(Address::Short(
                    vpan_id,
                    ShortAddress(bytes.read_with(offset, LE)?),
                ))),
                3 => Ok(Some(Address::Extended(
                    vpan_id,
                    ExtendedAddress(bytes.read_with(offset, LE)?),
                ))),
                _ => Err(byte::Error::BadInput {
                    err: "Reserved addressing mode",
                }),
            }
        };

        let dst_mode_bits = (frame_control & DST_ADDR_MODE_MASK) >> DST_ADDR_MODE_SHIFT;
        let src_mode_bits = (frame_control & SRC_ADDR_MODE_MASK) >> SRC_ADDR_MODE_SHIFT;

        let destination = if dst_mode_bits == 0 {
            None
        } else {
            read_address(dst_mode_bits, None)?
        };
        let source = if src_mode_bits == 0 {
            None
        } else {
            read_address(src_mode_bits, destination.map(|address| address.vpan_id()))?
        };

        let auxiliary_security_header = if frame_control & SECURITY_ENABLED != 0 {
            Some(bytes.read(offset)?)
        } else {
            None
        };

        Ok((
            Self {
                frame_type,
                frame_pending,
                ack_request,
                frame_version,
                seq,
                destination,
                source,
                auxiliary_security_header,
            },
            *offset,
        ))
    }
}

/// A complete MPDU: header, payload and the FCS trailer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Frame<'p> {
    pub header: Header,
    pub payload: &'p [u8],
    /// The FCS as found on the wire. Filled in on write, carried
    /// verbatim on read. Use [fcs::verify] on the raw buffer to check
    /// it, parsing does not.
    pub footer: [u8; FCS_LENGTH],
}

impl<'p> Frame<'p> {
    pub fn encoded_len(&self) -> usize {
        self.header.encoded_len() + self.payload.len() + FCS_LENGTH
    }
}

impl TryWrite<FcsMode> for Frame<'_> {
    fn try_write(self, bytes: &mut [u8], mode: FcsMode) -> byte::Result<usize> {
        let offset = &mut 0;

        bytes.write(offset, self.header)?;
        bytes.write(offset, self.payload)?;

        let fcs = match mode {
            FcsMode::Enabled => fcs::crc16(&bytes[..*offset]),
            FcsMode::Disabled => 0,
        };
        bytes.write_with(offset, fcs, LE)?;

        Ok(*offset)
    }
}

impl<'p> TryRead<'p> for Frame<'p> {
    /// Parses the entire buffer as one frame. The last two octets are
    /// the FCS, whatever sits between header and trailer is payload.
    fn try_read(bytes: &'p [u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        let (header, header_len) = Header::try_read(bytes, ())?;

        check_len(bytes, header_len + FCS_LENGTH)?;
        let payload = &bytes[header_len..bytes.len() - FCS_LENGTH];
        let footer = [bytes[bytes.len() - FCS_LENGTH], bytes[bytes.len() - 1]];

        Ok((
            Self {
                header,
                payload,
                footer,
            },
            bytes.len(),
        ))
    }
}
