//! Testing utilities and helpers
//!
//! - **[`async_utils`]**: polling helpers for async tests
//! - **[`time`]**: [`MockClock`], a [`Clock`](crate::time::Clock) that only
//!   moves when told to
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//!
//! use levelset_common::testing::MockClock;
//! use levelset_common::time::Clock;
//!
//! let clock = MockClock::new();
//! let start = clock.now();
//! clock.advance(Duration::from_secs(5));
//! assert_eq!(clock.now().duration_since(start), Duration::from_secs(5));
//! ```

pub mod async_utils;
pub mod time;

pub use async_utils::poll_until;
pub use time::MockClock;
