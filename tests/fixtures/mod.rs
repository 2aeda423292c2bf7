//! Test fixtures for itinerary-router.
//!
//! Provides:
//! - Real Hangzhou locations, tagged with itinerary categories
//! - In-memory distance and route-detail services

#![allow(dead_code)]

pub mod hangzhou_locations;
pub mod services;

pub use hangzhou_locations::*;
pub use services::*;
