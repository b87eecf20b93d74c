//! Staff attendance service: punch-in/punch-out tracking on IST calendar days,
//! lunch breaks, leave, and monthly expected-vs-actual working hours.

pub mod api;
pub mod auth;
pub mod calendar;
pub mod config;
pub mod db;
pub mod docs;
pub mod engine;
pub mod model;
pub mod routes;
pub mod store;
