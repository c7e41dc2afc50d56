//! Core domain types and logic.

pub mod axis;
pub mod axis_config;
pub mod batch;
pub mod chart;
pub mod column;
pub mod entity_match;
pub mod error;
pub mod series;
pub mod settings;
pub mod table;
pub mod ticks;
