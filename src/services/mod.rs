//! Services - core state machines and orchestration
//!
//! This module contains the controller's business logic:
//! - `sequencer` - Direction sequencing over the two doorway sensors
//! - `climate` - Occupancy-to-climate hysteresis policy
//! - `controller` - Control loop tying sampling, sequencing and dispatch

pub mod climate;
pub mod controller;
pub mod sequencer;

// Re-export commonly used types
pub use climate::ClimateController;
pub use controller::{ControllerState, RoomController};
pub use sequencer::DirectionSequencer;
