//! itinerary-router
//!
//! Orders the stops of a travel itinerary using distances from an external
//! routing provider, optionally splitting a trip over several days.

pub mod amap;
pub mod cache;
pub mod cluster;
pub mod error;
pub mod haversine;
pub mod matrix;
pub mod model;
pub mod optimizer;
pub mod osrm;
pub mod polyline;
pub mod sequencer;
pub mod throttle;
pub mod traits;
pub mod validator;
