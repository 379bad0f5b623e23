//! The rules-engine seam and a concrete No-Limit Hold'em implementation.
//!
//! The session coordinator only ever talks to [`Rules`]. [`Holdem`] is the
//! engine the server plugs in; tests substitute scripted fakes.
mod action;
mod holdem;
mod legal;
mod rules;
mod seat;
mod settlement;
mod showdown;

pub use action::*;
pub use holdem::*;
pub use legal::*;
pub use rules::*;
pub use seat::*;
pub use settlement::*;
pub use showdown::*;
