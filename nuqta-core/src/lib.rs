// src/lib.rs

pub mod db;
pub mod eventbus;
pub mod repositories;
pub mod services;
pub mod tasks;
pub mod test_utils;

pub use db::Database;
pub use nuqta_common::error::Error;
