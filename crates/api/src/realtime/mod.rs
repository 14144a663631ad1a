//! Realtime propagation: one event bus with push and poll adapters.

pub mod bus;
pub mod poll;
pub mod socket;

pub use bus::{BusSettings, EventBus};
