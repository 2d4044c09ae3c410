//! Perim deliveries API.
//!
//! Customers, their addresses, deliverers and deliveries for a supermarket's
//! delivery desk, served as a JSON API over `PostgreSQL`.
//!
//! # Invariants
//!
//! - A customer with at least one address has exactly one principal address
//!   (see [`principal`]).
//! - A delivery's address belongs to the delivery's customer (see
//!   [`validation::ensure_address_belongs_to_customer`]).

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod principal;
pub mod routes;
pub mod services;
pub mod state;
pub mod validation;

pub use config::ServerConfig;
pub use error::AppError;
pub use state::AppState;
