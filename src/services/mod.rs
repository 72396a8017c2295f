// src/services/mod.rs

pub mod moderation;
pub mod statistics;
