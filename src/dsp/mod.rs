//! Block signal chain
//!
//! Architecture:
//! - Decimator: sums groups of `divider` raw samples, optional right shift
//! - DC blocker: first-order leaky-integrator high-pass, state across blocks
//! - Goertzel: single-bin power of one decimated block
//! - Smoother: exponential average of block power, thresholded to a decision
//!
//! Everything here is plain arithmetic on caller-owned state: no allocation,
//! no locks, fixed cost per block.

pub mod dc_blocker;
pub mod decimator;
pub mod goertzel;
pub mod smoother;

pub use dc_blocker::{DcBlocker, BLOCKING_FACTOR};
pub use decimator::{bits_to_shift, Decimator};
pub use goertzel::{coefficient, Goertzel, NORMALIZATION};
pub use smoother::PowerSmoother;
