//! Interactive world atlas library
//!
//! Re-exports modules for use by binaries and tools.

pub mod countries;
pub mod drilldown;
pub mod explorer;
pub mod export;
pub mod geodata;
pub mod geometry;
pub mod palette;
pub mod sentiments;
