//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (e.g., `core-service`, `core-sonics`, `bridge-headless`).
//! Host applications can depend on `sonics-workspace` and enable the documented
//! features without needing to wire each crate individually.
