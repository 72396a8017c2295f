// src/utils/mod.rs

pub mod acting_user;
pub mod extract;
