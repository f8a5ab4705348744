//! Support utilities: logging helpers and a small RNG.

pub mod logging;
pub mod rng;

pub use logging::ScopedTimer;
pub use rng::XorShift64;
