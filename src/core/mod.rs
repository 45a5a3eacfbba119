//! Core domain modules for EventScope.
//!
//! Contains the query model, process execution, XML repair and parsing,
//! provider decoding, record normalization, and the cycle collector.

pub mod collector;
pub mod event_record;
pub mod process_runner;
pub mod provider_decoder;
pub mod query;
pub mod xml_parser;
