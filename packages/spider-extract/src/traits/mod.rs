//! Core trait abstractions for the extraction library.
//!
//! The crawler that feeds the pipeline is an external collaborator;
//! applications implement [`PageSource`] to plug it in.

pub mod source;

pub use source::{IterSource, PageSource, StreamSource};
