//! Per-turn streaming state machine
//!
//! Pure transitions from runtime events to fragment operations plus the
//! assistant transcript buffer.

pub mod accumulator;
pub mod fragment;

#[cfg(test)]
mod proptests;

pub use accumulator::{transition, Transition, TurnAccumulator, TurnPhase};
pub use fragment::{FragmentDescriptor, FragmentOp};
