// src/services/mod.rs

pub mod ledger;
pub mod rooms;
pub mod roster;
pub mod scoring;
