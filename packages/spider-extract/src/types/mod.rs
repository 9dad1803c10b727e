//! Data types shared by the scanner, filters and pipeline.

pub mod cert;
pub mod config;
pub mod page;
