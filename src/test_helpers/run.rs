use std::sync::Arc;

use rand::{rngs::StdRng, SeedableRng};
use tokio::task::AbortHandle;

use super::aether::{Aether, Coordinate};
use crate::{
    mac::{MacCommander, MacConfig},
    wire::fcs::FcsMode,
    wire::ExtendedAddress,
};

fn test_config(id: u64) -> MacConfig<StdRng, super::time::Delay> {
    MacConfig {
        extended_address: ExtendedAddress(id),
        rng: StdRng::seed_from_u64(id),
        delay: super::time::Delay,
        slotted_csma: false,
        fcs_mode: FcsMode::Enabled,
    }
}

/// Run a single mac engine
pub fn run_mac_engine_simple() -> Runner {
    let commander = Box::leak(Box::new(MacCommander::new()));
    let mut aether = Aether::new();

    let task_handle = tokio::spawn(crate::mac::run_mac_engine(
        aether.radio(),
        commander,
        test_config(0x0123456789abcdef),
    ))
    .abort_handle();

    Runner {
        commander,
        aether,
        task_handle,
    }
}

pub struct Runner {
    pub commander: &'static MacCommander,
    pub aether: Aether,
    task_handle: AbortHandle,
}

impl Drop for Runner {
    fn drop(&mut self) {
        self.task_handle.abort();
    }
}

/// Run multiple mac engines, all within range of each other
pub fn run_mac_engine_multi(count: usize) -> MultiRunner {
    run_mac_engine_positioned(vec![Coordinate::default(); count])
}

/// Run one mac engine per given coordinate. Devices further apart than
/// [RANGE](super::aether::RANGE) cannot hear each other.
pub fn run_mac_engine_positioned(positions: Vec<Coordinate>) -> MultiRunner {
    let commanders = Arc::from_iter(
        (0..positions.len()).map(|_| Box::leak(Box::new(MacCommander::new())) as &_),
    );
    let mut aether = Aether::new();

    let task_handles = positions
        .into_iter()
        .enumerate()
        .map(|(i, position)| {
            let commanders: Arc<[&'static MacCommander]> = Arc::clone(&commanders);
            let mut radio = aether.radio();
            radio.move_to(position);
            tokio::spawn(async move {
                crate::mac::run_mac_engine(radio, commanders[i], test_config(i as u64)).await
            })
            .abort_handle()
        })
        .collect();

    MultiRunner {
        commanders,
        aether,
        task_handles,
    }
}

pub struct MultiRunner {
    pub commanders: Arc<[&'static MacCommander]>,
    pub aether: Aether,
    task_handles: Vec<AbortHandle>,
}

impl Drop for MultiRunner {
    fn drop(&mut self) {
        self.task_handles.iter().for_each(|handle| handle.abort());
    }
}
