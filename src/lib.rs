//! Fahregut Auto-Crawler: incremental discovery of classified car listings
//! with realtime fan-out to filtering subscribers.

pub mod core;
pub mod crawler;
pub mod distribution;
pub mod listings;
pub mod server;
