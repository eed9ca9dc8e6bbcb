//! System utilities
//!
//! Accelerator detection used when choosing where to place a model.

pub mod gpu;
