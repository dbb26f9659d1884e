//! The MAC PAN information base (PIB)
//!
//! The attributes that live here are the ones the MLME-GET and
//! MLME-SET primitives operate on. PHY characteristics are not stored,
//! they are queried from the [Phy][crate::phy::Phy] when needed.

use crate::{
    consts::{TURNAROUND_TIME, UNIT_BACKOFF_PERIOD},
    phy::Phy,
    sap::Status,
    wire::{ExtendedAddress, ShortAddress, VpanId},
};

#[derive(Debug, Clone)]
pub struct MacPib {
    pub pib_write: MacPibWrite,

    /// The extended address assigned to the device.
    ///
    /// ## Range
    /// Device specific
    #[doc(alias = "macExtendedAddress")]
    pub extended_address: ExtendedAddress,
}

impl MacPib {
    /// The PIB of a device that has not associated with any VPAN yet
    pub fn unassociated(extended_address: ExtendedAddress) -> Self {
        Self {
            pib_write: MacPibWrite {
                batt_life_ext: false,
                dsn: SequenceNumber::new(0),
                max_be: 5,
                max_csma_backoffs: 4,
                max_frame_retries: 3,
                min_be: 3,
                promiscuous_mode: false,
                rx_on_when_idle: false,
                short_address: ShortAddress::BROADCAST,
                vpan_id: VpanId::BROADCAST,
            },
            extended_address,
        }
    }

    #[rustfmt::skip]
    pub fn get(&self, attribute: &str, phy: &impl Phy) -> Option<PibValue> {
        if !attribute.starts_with("mac") {
            return None;
        }

        match attribute {
            PibValue::MAC_ACK_WAIT_DURATION => Some(PibValue::MacAckWaitDuration(self.ack_wait_duration(phy))),
            PibValue::MAC_BATT_LIFE_EXT => Some(PibValue::MacBattLifeExt(self.batt_life_ext)),
            PibValue::MAC_DSN => Some(PibValue::MacDsn(self.dsn.value)),
            PibValue::MAC_EXTENDED_ADDRESS => Some(PibValue::MacExtendedAddress(self.extended_address)),
            PibValue::MAC_MAX_BE => Some(PibValue::MacMaxBe(self.max_be)),
            PibValue::MAC_MAX_CSMA_BACKOFFS => Some(PibValue::MacMaxCsmaBackoffs(self.max_csma_backoffs)),
            PibValue::MAC_MAX_FRAME_RETRIES => Some(PibValue::MacMaxFrameRetries(self.max_frame_retries)),
            PibValue::MAC_MIN_BE => Some(PibValue::MacMinBe(self.min_be)),
            PibValue::MAC_PROMISCUOUS_MODE => Some(PibValue::MacPromiscuousMode(self.promiscuous_mode)),
            PibValue::MAC_RX_ON_WHEN_IDLE => Some(PibValue::MacRxOnWhenIdle(self.rx_on_when_idle)),
            PibValue::MAC_SHORT_ADDRESS => Some(PibValue::MacShortAddress(self.short_address)),
            PibValue::MAC_VPAN_ID => Some(PibValue::MacVpanId(self.vpan_id)),
            _ => None,
        }
    }

    /// The maximum number of symbols to wait for an acknowledgment
    /// frame to arrive following a transmitted data frame.
    ///
    /// The value is the time to commence transmitting the ACK (one
    /// backoff period plus the receive-to-transmit turnaround) plus the
    /// length of the ACK frame at the current PHY settings.
    #[doc(alias = "macAckWaitDuration")]
    pub fn ack_wait_duration(&self, phy: &impl Phy) -> u32 {
        #[allow(unused_imports)]
        use micromath::F32Ext;

        UNIT_BACKOFF_PERIOD
            + TURNAROUND_TIME
            + phy.shr_duration()
            + (6.0 * phy.symbols_per_octet()).ceil() as u32
    }
}

impl core::ops::DerefMut for MacPib {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.pib_write
    }
}

impl core::ops::Deref for MacPib {
    type Target = MacPibWrite;

    fn deref(&self) -> &Self::Target {
        &self.pib_write
    }
}

/// The writable part of the MAC PIB
#[derive(Debug, Clone)]
pub struct MacPibWrite {
    /// Indication of whether battery life extension is enabled. When
    /// enabled, the backoff exponent of every transmission starts
    /// clamped at two.
    #[doc(alias = "macBattLifeExt")]
    pub batt_life_ext: bool,
    /// The sequence number added to the transmitted data or MAC
    /// command frame.
    #[doc(alias = "macDSN")]
    pub dsn: SequenceNumber,
    /// The maximum value of the backoff exponent, BE, in the CSMA-CA
    /// algorithm.
    ///
    /// ## Range
    /// 3–8
    #[doc(alias = "macMaxBE")]
    pub max_be: u8,
    /// The maximum number of backoffs the CSMA-CA algorithm will
    /// attempt before declaring a channel access failure.
    ///
    /// ## Range
    /// 0–5
    #[doc(alias = "macMaxCSMABackoffs")]
    pub max_csma_backoffs: u8,
    /// The maximum number of retries allowed after a transmission
    /// failure.
    ///
    /// ## Range
    /// 0–7
    #[doc(alias = "macMaxFrameRetries")]
    pub max_frame_retries: u8,
    /// The minimum value of the backoff exponent (BE) in the CSMA-CA
    /// algorithm.
    ///
    /// ## Range
    /// 0–macMaxBE
    #[doc(alias = "macMinBE")]
    pub min_be: u8,
    /// Indication of whether the MAC sublayer is in a promiscuous
    /// (receive all) mode. A value of TRUE indicates that the MAC
    /// sublayer accepts all frames received from the PHY.
    #[doc(alias = "macPromiscuousMode")]
    pub promiscuous_mode: bool,
    /// Indication of whether the MAC sublayer is to enable its receiver
    /// during idle periods.
    #[doc(alias = "macRxOnWhenIdle")]
    pub rx_on_when_idle: bool,
    /// The address that the device uses to communicate in the VPAN.
    ///
    /// A value of 0xfffe indicates that the device has associated but
    /// has not been allocated an address. A value of 0xffff indicates
    /// that the device does not have a short address.
    #[doc(alias = "macShortAddress")]
    pub short_address: ShortAddress,
    /// The identifier of the VPAN on which the device is operating. If
    /// this value is 0xffff, the device is not associated.
    #[doc(alias = "macVPANId")]
    pub vpan_id: VpanId,
}

impl MacPibWrite {
    #[rustfmt::skip]
    pub fn try_set(&mut self, attribute: &str, value: &PibValue) -> Option<Status> {
        if !attribute.starts_with("mac") {
            return None;
        }

        let result = match (attribute, value) {
            (PibValue::MAC_ACK_WAIT_DURATION, _) => Status::ReadOnly,
            (PibValue::MAC_EXTENDED_ADDRESS, _) => Status::ReadOnly,

            (PibValue::MAC_BATT_LIFE_EXT, value @ PibValue::MacBattLifeExt(_)) => self.set(value),
            (PibValue::MAC_DSN, value @ PibValue::MacDsn(_)) => self.set(value),
            (PibValue::MAC_MAX_BE, value @ PibValue::MacMaxBe(_)) => self.set(value),
            (PibValue::MAC_MAX_CSMA_BACKOFFS, value @ PibValue::MacMaxCsmaBackoffs(_)) => self.set(value),
            (PibValue::MAC_MAX_FRAME_RETRIES, value @ PibValue::MacMaxFrameRetries(_)) => self.set(value),
            (PibValue::MAC_MIN_BE, value @ PibValue::MacMinBe(_)) => self.set(value),
            (PibValue::MAC_PROMISCUOUS_MODE, value @ PibValue::MacPromiscuousMode(_)) => self.set(value),
            (PibValue::MAC_RX_ON_WHEN_IDLE, value @ PibValue::MacRxOnWhenIdle(_)) => self.set(value),
            (PibValue::MAC_SHORT_ADDRESS, value @ PibValue::MacShortAddress(_)) => self.set(value),
            (PibValue::MAC_VPAN_ID, value @ PibValue::MacVpanId(_)) => self.set(value),

            (PibValue::MAC_BATT_LIFE_EXT, _) => Status::InvalidParameter,
            (PibValue::MAC_DSN, _) => Status::InvalidParameter,
            (PibValue::MAC_MAX_BE, _) => Status::InvalidParameter,
            (PibValue::MAC_MAX_CSMA_BACKOFFS, _) => Status::InvalidParameter,
            (PibValue::MAC_MAX_FRAME_RETRIES, _) => Status::InvalidParameter,
            (PibValue::MAC_MIN_BE, _) => Status::InvalidParameter,
            (PibValue::MAC_PROMISCUOUS_MODE, _) => Status::InvalidParameter,
            (PibValue::MAC_RX_ON_WHEN_IDLE, _) => Status::InvalidParameter,
            (PibValue::MAC_SHORT_ADDRESS, _) => Status::InvalidParameter,
            (PibValue::MAC_VPAN_ID, _) => Status::InvalidParameter,

            _ => Status::UnsupportedAttribute,
        };

        Some(result)
    }

    fn set(&mut self, value: &PibValue) -> Status {
        match value {
            PibValue::MacBattLifeExt(value) => self.batt_life_ext = *value,
            PibValue::MacDsn(value) => self.dsn.value = *value,
            PibValue::MacMaxBe(value) if (3..=8).contains(value) && *value >= self.min_be => {
                self.max_be = *value
            }
            PibValue::MacMaxBe(_) => return Status::InvalidParameter,
            PibValue::MacMaxCsmaBackoffs(value) if (0..=5).contains(value) => {
                self.max_csma_backoffs = *value
            }
            PibValue::MacMaxCsmaBackoffs(_) => return Status::InvalidParameter,
            PibValue::MacMaxFrameRetries(value) if (0..=7).contains(value) => {
                self.max_frame_retries = *value
            }
            PibValue::MacMaxFrameRetries(_) => return Status::InvalidParameter,
            PibValue::MacMinBe(value) if (0..=self.max_be).contains(value) => self.min_be = *value,
            PibValue::MacMinBe(_) => return Status::InvalidParameter,
            PibValue::MacPromiscuousMode(value) => self.promiscuous_mode = *value,
            PibValue::MacRxOnWhenIdle(value) => self.rx_on_when_idle = *value,
            PibValue::MacShortAddress(value) => self.short_address = *value,
            PibValue::MacVpanId(value) => self.vpan_id = *value,
            _ => unreachable!(),
        }

        Status::Success
    }
}

/// The value of a PIB attribute, tagged by attribute
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum PibValue {
    None,
    MacAckWaitDuration(u32),
    MacBattLifeExt(bool),
    MacDsn(u8),
    MacExtendedAddress(ExtendedAddress),
    MacMaxBe(u8),
    MacMaxCsmaBackoffs(u8),
    MacMaxFrameRetries(u8),
    MacMinBe(u8),
    MacPromiscuousMode(bool),
    MacRxOnWhenIdle(bool),
    MacShortAddress(ShortAddress),
    MacVpanId(VpanId),
}

impl PibValue {
    pub const MAC_ACK_WAIT_DURATION: &'static str = "macAckWaitDuration";
    pub const MAC_BATT_LIFE_EXT: &'static str = "macBattLifeExt";
    pub const MAC_DSN: &'static str = "macDSN";
    pub const MAC_EXTENDED_ADDRESS: &'static str = "macExtendedAddress";
    pub const MAC_MAX_BE: &'static str = "macMaxBE";
    pub const MAC_MAX_CSMA_BACKOFFS: &'static str = "macMaxCSMABackoffs";
    pub const MAC_MAX_FRAME_RETRIES: &'static str = "macMaxFrameRetries";
    pub const MAC_MIN_BE: &'static str = "macMinBE";
    pub const MAC_PROMISCUOUS_MODE: &'static str = "macPromiscuousMode";
    pub const MAC_RX_ON_WHEN_IDLE: &'static str = "macRxOnWhenIdle";
    pub const MAC_SHORT_ADDRESS: &'static str = "macShortAddress";
    pub const MAC_VPAN_ID: &'static str = "macVPANId";

    pub fn name(&self) -> &'static str {
        match self {
            PibValue::None => "",
            PibValue::MacAckWaitDuration(_) => Self::MAC_ACK_WAIT_DURATION,
            PibValue::MacBattLifeExt(_) => Self::MAC_BATT_LIFE_EXT,
            PibValue::MacDsn(_) => Self::MAC_DSN,
            PibValue::MacExtendedAddress(_) => Self::MAC_EXTENDED_ADDRESS,
            PibValue::MacMaxBe(_) => Self::MAC_MAX_BE,
            PibValue::MacMaxCsmaBackoffs(_) => Self::MAC_MAX_CSMA_BACKOFFS,
            PibValue::MacMaxFrameRetries(_) => Self::MAC_MAX_FRAME_RETRIES,
            PibValue::MacMinBe(_) => Self::MAC_MIN_BE,
            PibValue::MacPromiscuousMode(_) => Self::MAC_PROMISCUOUS_MODE,
            PibValue::MacRxOnWhenIdle(_) => Self::MAC_RX_ON_WHEN_IDLE,
            PibValue::MacShortAddress(_) => Self::MAC_SHORT_ADDRESS,
            PibValue::MacVpanId(_) => Self::MAC_VPAN_ID,
        }
    }
}

/// A wrapping 8-bit sequence number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct SequenceNumber {
    value: u8,
}

impl SequenceNumber {
    pub fn new(initial_value: u8) -> Self {
        Self {
            value: initial_value,
        }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn increment(&mut self) -> u8 {
        self.value = self.value.wrapping_add(1);
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_be_is_bounded_by_max_be() {
        let mut pib = MacPib::unassociated(ExtendedAddress(1));

        assert_eq!(
            pib.try_set(PibValue::MAC_MIN_BE, &PibValue::MacMinBe(5)),
            Some(Status::Success)
        );
        assert_eq!(
            pib.try_set(PibValue::MAC_MIN_BE, &PibValue::MacMinBe(6)),
            Some(Status::InvalidParameter)
        );
        // Lowering the maximum below the current minimum is rejected too
        assert_eq!(
            pib.try_set(PibValue::MAC_MAX_BE, &PibValue::MacMaxBe(4)),
            Some(Status::InvalidParameter)
        );
    }

    #[test]
    fn read_only_attributes_are_rejected() {
        let mut pib = MacPib::unassociated(ExtendedAddress(1));

        assert_eq!(
            pib.try_set(
                PibValue::MAC_EXTENDED_ADDRESS,
                &PibValue::MacExtendedAddress(ExtendedAddress(2))
            ),
            Some(Status::ReadOnly)
        );
        assert_eq!(
            pib.try_set(
                PibValue::MAC_ACK_WAIT_DURATION,
                &PibValue::MacAckWaitDuration(0)
            ),
            Some(Status::ReadOnly)
        );
    }

    #[test]
    fn type_mismatch_is_an_invalid_parameter() {
        let mut pib = MacPib::unassociated(ExtendedAddress(1));

        assert_eq!(
            pib.try_set(PibValue::MAC_MIN_BE, &PibValue::MacBattLifeExt(true)),
            Some(Status::InvalidParameter)
        );
    }

    #[test]
    fn unknown_attributes_are_unsupported() {
        let mut pib = MacPib::unassociated(ExtendedAddress(1));

        assert_eq!(
            pib.try_set("macBeaconOrder", &PibValue::MacMinBe(1)),
            Some(Status::UnsupportedAttribute)
        );
        assert_eq!(pib.try_set("phyCurrentChannel", &PibValue::None), None);
    }
}
