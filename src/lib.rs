//! # Applied AI API Library
//!
//! Core functionality for the Applied AI website backend: catalog and news
//! handlers, landing-page subscriptions, third-party integrations and server
//! configuration.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod integrations;
pub mod models;
pub mod pagination;
pub mod repositories;
pub mod search;
pub mod server;
pub mod storage;
pub mod subscription;
pub mod telemetry;
pub use migration;
