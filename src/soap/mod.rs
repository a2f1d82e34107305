//! # SOAP Edge
//!
//! Streaming access to the upstream SIPSA SOAP service: the HTTP client
//! with retry/backoff, the lazy pull parser over the XML body, and the
//! per-method raw record types.

pub mod client;
pub mod fields;
pub mod parser;
pub mod records;

pub use client::{BodyStream, SoapClient, SoapSource};
pub use parser::RecordStream;
pub use records::{
    CityRecord, MonthlyRecord, PartialRecord, SoapRecord, SupplyRecord, WeeklyRecord,
};
