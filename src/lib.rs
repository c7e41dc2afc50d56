//! perfchart — batch dual-axis performance charts from spreadsheet workbooks.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
pub mod telemetry;
