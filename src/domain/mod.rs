//! Domain model of the organizer payout-activation workflow.
//!
//! Records, value objects and the ports the application layer talks through.

pub mod bank;
pub mod organizer;
pub mod ports;
pub mod provisioning;
pub mod subaccount;
