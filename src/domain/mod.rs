//! Core domain types and logic.

pub mod agent;
pub mod allocation;
pub mod backtest;
pub mod bar;
pub mod config_validation;
pub mod cycle;
pub mod engine;
pub mod error;
pub mod execution;
pub mod feed;
pub mod indicator;
pub mod market;
pub mod metrics;
pub mod position;
pub mod risk;
pub mod scoring;
pub mod sentiment;
pub mod settings;
pub mod strategy;
