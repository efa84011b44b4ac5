//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the sonification core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//! - Startup readiness tracking
//!
//! ## Overview
//!
//! This crate contains the core runtime utilities that other modules depend on.
//! It establishes the async runtime patterns, logging conventions, event
//! broadcasting mechanisms, and the startup gate used to hold an application
//! until its sound assets are decoded.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod readiness;

pub use error::{Error, Result};
