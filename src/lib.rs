//! callboard: call-record analytics from a tabular data API.
//!
//! Raw rows come from a [`source::CallSource`], are normalized into
//! [`records::CallRecord`]s, and feed the pure aggregations in
//! [`analytics`]. The CLI and the local web dashboard are thin renderers on
//! top.

pub mod analytics;
pub mod cli;
pub mod config;
pub mod error;
pub mod records;
pub mod source;
pub mod web;
