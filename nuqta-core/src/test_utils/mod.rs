// File: nuqta-core/src/test_utils/mod.rs

pub mod helpers;

pub use helpers::{clean_database, create_test_db_pool, setup_test_database};
