//! Core types for LoveSense.
//!
//! This module provides type-safe wrappers and fixed schemas for the
//! persisted entities.

pub mod audit;
pub mod id;
pub mod order;
pub mod price;
pub mod status;
pub mod user;

pub use audit::{Actor, AuditAction, AuditEntry};
pub use id::{IdParseError, OrderId, UserId};
pub use order::Order;
pub use price::{CurrencyCode, Price};
pub use status::*;
pub use user::{UserPatch, UserRecord};
