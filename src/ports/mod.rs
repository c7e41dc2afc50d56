//! Port traits (interfaces) for the hexagonal architecture.

pub mod chart_port;
pub mod config_port;
pub mod workbook_port;
