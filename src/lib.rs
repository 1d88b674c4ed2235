//! cht - Congressional hearing transcripts.
//!
//! Acquires House committee hearing documents from the GovInfo archive,
//! tracks what has been downloaded in a SQLite catalog, and keeps that
//! catalog honest about what is actually on disk.

pub mod cli;
pub mod config;
pub mod govinfo;
pub mod migrations;
pub mod models;
pub mod repository;
pub mod schema;
pub mod services;
pub mod storage;
pub mod utils;
