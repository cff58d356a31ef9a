//! Test doubles for exercising pool and aggregator behavior without a
//! browser. Compiled only with the `testkit` feature (enabled for this
//! crate's own tests through the dev-dependency on itself).

pub mod driver;
pub mod pool;
