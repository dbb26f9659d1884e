#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![allow(async_fn_in_trait)]

use crate::wire::{ExtendedAddress, ShortAddress};

// This must go FIRST so that all the other modules see its macros.
mod fmt;

pub mod consts;
pub mod csma;
pub mod mac;
pub mod phy;
pub mod pib;
pub mod queue;
mod reqresp;
pub mod sap;
#[cfg(feature = "test_helpers")]
pub mod test_helpers;
pub mod time;
pub mod wire;

/// A device address in either of its two lengths, without the VPAN it
/// belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum DeviceAddress {
    Short(ShortAddress),
    Extended(ExtendedAddress),
}
