// src/tasks/mod.rs

pub mod points_expiry;
pub mod redemption_expiry;
