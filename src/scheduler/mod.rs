//! Scheduled background jobs.

pub mod keep_alive;
