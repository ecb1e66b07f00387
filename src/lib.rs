//! Lesson gating and curriculum progression for the Jyotish learning
//! platform, plus the HTTP service that exposes it.

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod models;
pub mod progression;
pub mod routes;
pub mod store;
