//! Itinerary generation engine: scores a destination's activity catalog
//! against a traveler persona, selects and places activities into day/time
//! slots, and persists the result with per-day training records.

pub mod db;
pub mod models;
pub mod services;
