// src/models/mod.rs

pub mod document;
pub mod question;
pub mod quiz;
pub mod statistic;
pub mod subject;
pub mod user;
