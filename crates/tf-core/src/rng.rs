//! Seeded random streams.
//!
//! Two kinds of stream exist and neither is ever shared:
//!
//! - [`VehicleRng`] lives inside a vehicle and drives its turn choices.  It
//!   is seeded from `seed ^ id * GOLDEN`, so a vehicle's route does not
//!   depend on how many other vehicles drew before it.
//! - [`SimRng`] drives arrival processes.  The generator owns one root
//!   stream and splits a [`child`][SimRng::child] per entry point.
//!
//! Same seed, same scenario: same run, tick for tick.

use rand::distributions::uniform::{SampleRange, SampleUniform};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::VehicleId;

/// Odd 64-bit constant (2^64 / φ) used to spread sequential ids.
const GOLDEN: u64 = 0x9e37_79b9_7f4a_7c15;

#[inline]
fn mix(seed: u64, n: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed ^ n.wrapping_mul(GOLDEN))
}

/// Turn-choice stream owned by one vehicle.
#[derive(Clone, Debug)]
pub struct VehicleRng(SmallRng);

impl VehicleRng {
    pub fn new(run_seed: u64, vehicle: VehicleId) -> Self {
        Self(mix(run_seed, vehicle.0))
    }

    #[inline]
    pub fn gen_range<T: SampleUniform, R: SampleRange<T>>(&mut self, range: R) -> T {
        self.0.gen_range(range)
    }

    /// Bernoulli draw; `p` outside [0, 1] is clamped.
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }
}

/// Arrival-process stream.  Single-threaded.
#[derive(Clone, Debug)]
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }

    /// Split off an independent stream keyed by `index`.  Consumes one draw
    /// from `self`, so children must be split in a fixed order.
    pub fn child(&mut self, index: u64) -> SimRng {
        let base: u64 = self.0.r#gen();
        SimRng(mix(base, index))
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.0.r#gen()
    }

    /// Bernoulli draw; `p` outside [0, 1] is clamped.
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }
}
