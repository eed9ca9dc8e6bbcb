//! DuoChat Library
//!
//! Core library for the DuoChat desktop application: a local chatbot over two
//! small Japanese instruction models with answer rating and history analysis.

pub mod app;
pub mod inference;
pub mod metrics;
pub mod navigation;
pub mod report;
pub mod storage;
pub mod system;
pub mod types;
pub mod ui;
