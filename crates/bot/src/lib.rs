//! `LoveSense` bot library.
//!
//! Entitlement and order state for a chat bot that sells premium AI
//! content: trial consumption, premium grants with expiry, manual payment
//! claims and the admin workflow that decides them. The same services back
//! the Telegram transport, the HTTP API and the operator CLI.
//!
//! # Layout
//!
//! - `store` - JSON-file user and order stores with atomic replace-on-write
//! - `audit` - Append-only action log
//! - `services` - Entitlements, admin gate, payment claims, chat actions
//! - `generation` - Text-generation client behind [`generation::ContentGenerator`]
//! - `telegram` - teloxide dispatcher, keyboards and admin notifier
//! - `routes` - axum HTTP API

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod audit;
pub mod config;
pub mod error;
pub mod generation;
pub mod i18n;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod telegram;
