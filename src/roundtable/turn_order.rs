//! Per-round speaking order.
//!
//! Sequential rooms always speak in stored member order. Random rooms get a
//! fresh Fisher–Yates shuffle every round, with one constraint: the agent that
//! closed the previous round never opens the next one (when there is anyone
//! else to open it). Adjacent repeats inside a single round are not prevented.
//!
//! The random source is injected so tests can seed it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Decides who speaks, in which order, each round.
pub struct TurnOrderGenerator<R = StdRng> {
    rng: R,
}

impl TurnOrderGenerator<StdRng> {
    /// Generator seeded from OS entropy.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic generator for reproducible orders.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for TurnOrderGenerator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> TurnOrderGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Speaking order for one round.
    ///
    /// `last_speaker` is the agent that closed the previous round, if any; it
    /// is ignored for sequential rooms.
    pub fn order(
        &mut self,
        members: &[String],
        randomize: bool,
        last_speaker: Option<&str>,
    ) -> Vec<String> {
        if !randomize {
            return members.to_vec();
        }
        self.shuffle_avoiding(members, last_speaker)
    }

    fn shuffle_avoiding(&mut self, members: &[String], last_speaker: Option<&str>) -> Vec<String> {
        let mut order = members.to_vec();

        for i in (1..order.len()).rev() {
            let j = self.rng.gen_range(0..=i);
            order.swap(i, j);
        }

        if order.len() > 1 && last_speaker.is_some_and(|last| order[0] == last) {
            let swap_index = self.rng.gen_range(1..order.len());
            order.swap(0, swap_index);
        }

        order
    }
}
