//! Domain models for the phishing simulation tracker.
//!
//! - [`Attempt`]: one simulated phishing email sent to one recipient, tracked
//!   from send to click.
//! - [`AttemptStatus`]: the forward-only state of an attempt.

mod attempt;

pub use attempt::*;
