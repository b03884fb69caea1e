//! Core domain types and logic.

pub mod backtest;
pub mod bar;
pub mod config_validation;
pub mod criteria;
pub mod error;
pub mod execution;
pub mod indicator;
pub mod num;
pub mod rule;
pub mod strategy;
pub mod trade;
pub mod trading_record;
