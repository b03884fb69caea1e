//! Adapter implementations of the port traits.

pub mod bar_series;
pub mod csv_adapter;
pub mod file_config_adapter;
