//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the business rules for the Imail notifier: door
//! tracking, operator notices, and chat command handling.  All interaction
//! with hardware and the network happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod monitor;
pub mod ports;
pub mod servicer;
pub mod service;
