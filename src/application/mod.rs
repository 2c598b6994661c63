//! Application layer orchestrating the payout-activation workflow.
//!
//! Services are built from injected port implementations and hold no global
//! state. Onboarding collects and provisions bank details, reconciliation checks
//! subaccounts against the provider, the activation gate and bulk activator flip
//! records to active, and the admin service backs listings and backups.

pub mod activation;
pub mod admin;
pub mod onboarding;
pub mod reconciliation;
