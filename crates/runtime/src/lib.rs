//! CityFlow - Runtime
//!
//! Shared process plumbing for the long-running stages: the shutdown
//! signal and the fixed-cadence cycle scheduler.

mod cycle;
mod shutdown;

pub use cycle::CycleScheduler;
pub use shutdown::shutdown_token;
