//! Infrastructure layer (adapters/implementations).
//!
//! This module contains the SQLite persistence and configuration loading.

pub mod app_config;
pub mod db;
