//! LoveSense Core - Shared types and entitlement rules.
//!
//! This crate provides the domain model used by every LoveSense component:
//! - `bot` - Telegram front-end and status/administration HTTP API
//! - `cli` - Operator tooling that works directly on the data directory
//!
//! # Architecture
//!
//! The core crate contains only types, traits and pure logic - no I/O, no
//! file access, no HTTP clients. Persistence and transport live in the bot
//! crate and call into the rules defined here.
//!
//! # Modules
//!
//! - [`types`] - Ids, user records, orders, audit entries and statuses
//! - [`entitlement`] - Trial consumption and premium activation rules
//! - [`command`] - Typed admin commands and inbound user actions
//! - [`clock`] - Time source abstraction

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod clock;
pub mod command;
pub mod entitlement;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use command::{Action, AdminCommand, AdminPrompt, CommandParseError};
pub use entitlement::{
    Access, DEFAULT_TRIAL_ALLOWANCE, MANUAL_PAYMENT_GRANT_DAYS, SECONDS_PER_DAY, Stats,
};
pub use types::*;
