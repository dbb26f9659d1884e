//! The unslotted and slotted CSMA-CA channel access algorithm
//!
//! This is the pure bookkeeping half of channel access. The MAC engine
//! owns the clock and the radio: it waits out the backoff durations
//! produced here, runs the actual clear channel assessments and feeds
//! the results back through [CsmaCa::cca_confirm].

use rand_core::RngCore;

use crate::{consts::UNIT_BACKOFF_PERIOD, pib::MacPib, time::Duration};

/// In slotted mode with battery life extension the backoff exponent
/// starts clamped at this value
const BLE_MAX_STARTING_BE: u8 = 2;

/// The contention window length at the start of every slotted attempt
const INITIAL_CONTENTION_WINDOW: u8 = 2;

/// What the MAC engine must do next after a CCA result was processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum CsmaOutcome {
    /// The channel is clear, transmission may start
    ChannelIdle,
    /// Slotted mode found the channel clear but the contention window
    /// has not closed yet. Assess again right away.
    RepeatCca,
    /// The channel was busy. Draw a new backoff with
    /// [CsmaCa::random_backoff] and wait it out.
    Backoff,
    /// Every allowed backoff found the channel busy
    ChannelAccessFailure,
}

/// State of one channel access attempt
#[derive(Debug, Clone)]
pub struct CsmaCa {
    slotted: bool,
    nb: u8,
    cw: u8,
    be: u8,
    max_be: u8,
    max_csma_backoffs: u8,
    cca_request_running: bool,
}

impl CsmaCa {
    pub fn new(slotted: bool) -> Self {
        Self {
            slotted,
            nb: 0,
            cw: INITIAL_CONTENTION_WINDOW,
            be: 0,
            max_be: 0,
            max_csma_backoffs: 0,
            cca_request_running: false,
        }
    }

    pub fn is_slotted(&self) -> bool {
        self.slotted
    }

    /// The number of backoffs this attempt has performed so far
    pub fn backoff_count(&self) -> u8 {
        self.nb
    }

    /// Begin a new channel access attempt.
    ///
    /// The CSMA parameters are sampled from the PIB here, so a
    /// MLME-SET that happens mid-attempt only affects the next attempt.
    pub fn start(&mut self, pib: &MacPib) {
        self.nb = 0;
        self.cw = INITIAL_CONTENTION_WINDOW;
        // Battery life extension only applies to slotted attempts
        self.be = if self.slotted && pib.batt_life_ext {
            pib.min_be.min(BLE_MAX_STARTING_BE)
        } else {
            pib.min_be
        };
        self.max_be = pib.max_be;
        self.max_csma_backoffs = pib.max_csma_backoffs;
        self.cca_request_running = false;
    }

    /// Draw the random backoff period for the current backoff exponent.
    ///
    /// The period is a whole number of unit backoff periods, between
    /// zero and 2^BE - 1 of them, converted to wall time at the current
    /// symbol rate.
    pub fn random_backoff(&self, rng: &mut impl RngCore, symbol_rate: f32) -> Duration {
        let upper_bound = 1u64 << self.be;
        let units = rng.next_u64() % upper_bound;
        let symbols = units * UNIT_BACKOFF_PERIOD as u64;

        Duration::from_micros((symbols as f32 * 1_000_000.0 / symbol_rate) as i64)
    }

    /// Note that a clear channel assessment was handed to the radio.
    /// Its result is only accepted while this is outstanding.
    pub fn begin_cca(&mut self) {
        self.cca_request_running = true;
    }

    /// Abandon the attempt. A CCA result that is still in flight will
    /// be ignored when it arrives.
    pub fn cancel(&mut self) {
        self.cca_request_running = false;
    }

    /// Process the result of a clear channel assessment.
    ///
    /// Returns `None` when no assessment was outstanding, which happens
    /// when the attempt was cancelled while the radio was measuring.
    pub fn cca_confirm(&mut self, channel_idle: bool) -> Option<CsmaOutcome> {
        if !self.cca_request_running {
            return None;
        }
        self.cca_request_running = false;

        if channel_idle {
            if !self.slotted {
                return Some(CsmaOutcome::ChannelIdle);
            }

            self.cw -= 1;
            return Some(if self.cw == 0 {
                CsmaOutcome::ChannelIdle
            } else {
                CsmaOutcome::RepeatCca
            });
        }

        if self.slotted {
            self.cw = INITIAL_CONTENTION_WINDOW;
        }
        self.be = (self.be + 1).min(self.max_be);
        self.nb += 1;

        Some(if self.nb > self.max_csma_backoffs {
            CsmaOutcome::ChannelAccessFailure
        } else {
            CsmaOutcome::Backoff
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::ExtendedAddress;
    use rand::{rngs::StdRng, SeedableRng};

    fn test_pib() -> MacPib {
        MacPib::unassociated(ExtendedAddress(0))
    }

    #[test]
    fn unslotted_idle_channel_grants_access_immediately() {
        let mut csma = CsmaCa::new(false);
        csma.start(&test_pib());

        csma.begin_cca();
        assert_eq!(csma.cca_confirm(true), Some(CsmaOutcome::ChannelIdle));
    }

    #[test]
    fn slotted_mode_needs_two_idle_assessments() {
        let mut csma = CsmaCa::new(true);
        csma.start(&test_pib());

        csma.begin_cca();
        assert_eq!(csma.cca_confirm(true), Some(CsmaOutcome::RepeatCca));
        csma.begin_cca();
        assert_eq!(csma.cca_confirm(true), Some(CsmaOutcome::ChannelIdle));
    }

    #[test]
    fn busy_channel_reopens_the_contention_window() {
        let mut csma = CsmaCa::new(true);
        csma.start(&test_pib());

        csma.begin_cca();
        assert_eq!(csma.cca_confirm(true), Some(CsmaOutcome::RepeatCca));
        csma.begin_cca();
        assert_eq!(csma.cca_confirm(false), Some(CsmaOutcome::Backoff));

        // The window is back at two, so one idle assessment is not enough
        csma.begin_cca();
        assert_eq!(csma.cca_confirm(true), Some(CsmaOutcome::RepeatCca));
    }

    #[test]
    fn fails_after_max_csma_backoffs_busy_results() {
        let pib = test_pib();
        let mut csma = CsmaCa::new(false);
        csma.start(&pib);

        for _ in 0..pib.max_csma_backoffs {
            csma.begin_cca();
            assert_eq!(csma.cca_confirm(false), Some(CsmaOutcome::Backoff));
        }

        csma.begin_cca();
        assert_eq!(
            csma.cca_confirm(false),
            Some(CsmaOutcome::ChannelAccessFailure)
        );
    }

    #[test]
    fn stale_cca_results_are_ignored() {
        let mut csma = CsmaCa::new(false);
        csma.start(&test_pib());

        // No assessment was started
        assert_eq!(csma.cca_confirm(true), None);

        // The attempt was cancelled while the radio was measuring
        csma.begin_cca();
        csma.cancel();
        assert_eq!(csma.cca_confirm(true), None);
    }

    #[test]
    fn backoff_stays_below_the_exponent_bound() {
        let mut rng = StdRng::seed_from_u64(0x1234);
        let pib = test_pib();
        let mut csma = CsmaCa::new(false);
        csma.start(&pib);

        let symbol_rate = 250_000.0;
        let unit = Duration::from_micros(
            (UNIT_BACKOFF_PERIOD as f32 * 1_000_000.0 / symbol_rate) as i64,
        );
        let bound = unit * ((1 << pib.min_be) - 1);

        for _ in 0..1000 {
            let backoff = csma.random_backoff(&mut rng, symbol_rate);
            assert!(backoff >= Duration::from_ticks(0));
            assert!(backoff <= bound);
        }
    }

    #[test]
    fn exponent_growth_is_clamped_at_max_be() {
        let pib = test_pib();
        let mut csma = CsmaCa::new(false);
        csma.start(&pib);

        // More busy results than it takes to reach macMaxBE
        for _ in 0..pib.max_csma_backoffs {
            csma.begin_cca();
            csma.cca_confirm(false);
        }
        assert_eq!(csma.be, pib.max_be);
    }

    #[test]
    fn battery_life_extension_clamps_the_starting_exponent_when_slotted() {
        let pib = test_pib();
        let mut ble_pib = test_pib();
        ble_pib.batt_life_ext = true;

        let mut slotted = CsmaCa::new(true);
        slotted.start(&pib);
        assert_eq!(slotted.be, pib.min_be);

        slotted.start(&ble_pib);
        assert_eq!(slotted.be, BLE_MAX_STARTING_BE);

        // Unslotted attempts are not clamped
        let mut unslotted = CsmaCa::new(false);
        unslotted.start(&ble_pib);
        assert_eq!(unslotted.be, ble_pib.min_be);
    }
}
