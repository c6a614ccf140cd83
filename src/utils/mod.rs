//! Shared utilities for scorestream binaries and services.

pub mod bootstrap;
pub mod retry;
