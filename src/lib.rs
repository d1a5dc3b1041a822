//! Asmig core library.
//!
//! This crate exposes programmatic APIs for scanning B&R Automation
//! Studio 4 projects for deprecated constructs and converting them to
//! the AS6 format.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `rules`: The read-only AS4-to-AS6 deprecation catalog.
//! - `store`: In-memory artifact store keyed by relative path.
//! - `scan`: Per-dialect scanners producing findings and side tables.
//! - `registry`: Finding ids, ordering, filtering, and selection.
//! - `convert`: Pure before/after conversion generation.
//! - `txn`: Apply/undo/skip transaction log.
//! - `engine`: Facade tying store, registry, and log together.
//! - `ingest`: Filesystem loading into the store.
//! - `report`: Deterministic report building and CSV rendering.
//! - `output`: Human/JSON printers for findings, conversions, reports.
//! - `models`: Data models for findings, conversions, and reports.
//!
//! Note: All documentation comments are written in English by convention.
pub mod cli;
pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod models;
pub mod output;
pub mod registry;
pub mod report;
pub mod rules;
pub mod scan;
pub mod store;
pub mod txn;
