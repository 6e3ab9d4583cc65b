// src/handlers/mod.rs

pub mod auth;
pub mod catalog;
pub mod exam;
pub mod results;
