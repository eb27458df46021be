//! Domain services driven by the host's command surface and event dispatch.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the business logic; the host environment stays focused
//! on event plumbing and transport. Everything here operates on a shared
//! [`crate::state::AppState`] handle.

pub mod cache;
pub mod fastsend;
pub mod persistence;
pub mod placement;
pub mod registry;
pub mod reload;
