//! Phishing-awareness simulation tracker.
//!
//! Sends a templated email carrying a unique tracking link, stores an
//! [`models::Attempt`] for it, and marks the attempt as clicked when the link
//! is visited.

pub mod api;
pub mod config;
pub mod db;
pub mod mail;
pub mod models;
pub mod phishing;
