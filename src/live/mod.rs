// src/live/mod.rs

//! Real-time quiz flow over WebSockets.
//!
//! [`hub::SessionHub`] tracks which connections are present in which room,
//! [`coordinator`] turns inbound events into broadcasts, and [`socket`] owns
//! the per-connection read/write loops.

pub mod coordinator;
pub mod events;
pub mod hub;
pub mod socket;
