// src/models/mod.rs

pub mod answer;
pub mod participant;
pub mod quiz;
pub mod room;
pub mod user;
