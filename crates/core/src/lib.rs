//! Perim Core - Shared domain types.
//!
//! This crate provides the types used across all Perim components:
//! - `server` - JSON API for customers, addresses, deliverers and deliveries
//! - `cli` - Command-line tools for migrations, seeding and lookups
//!
//! # Architecture
//!
//! The core crate contains only types and pure validation - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, tax identifiers, phone numbers, postal codes and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
