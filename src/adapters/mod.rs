//! Concrete adapter implementations for ports.

pub mod file_config_adapter;
pub mod fonts;
pub mod plotters_chart;
pub mod xlsx_adapter;
