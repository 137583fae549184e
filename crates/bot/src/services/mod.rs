//! Business logic services.
//!
//! # Services
//!
//! - `entitlement` - Trial consumption and premium grants over the user store
//! - `admin` - Admin gate and privileged commands
//! - `orders` - Manual payment claims and admin notification
//! - `actions` - Chat action dispatch producing transport-neutral replies

pub mod actions;
pub mod admin;
pub mod entitlement;
pub mod orders;

pub use actions::{ActionService, ChatUser, Menu, Reply};
pub use admin::{AdminError, AdminGate, AdminOutcome, AdminService, OrderDecision, UserSummary};
pub use entitlement::EntitlementService;
pub use orders::{AdminNotifier, Claim, NoopNotifier, NotifyError, OrderService};
