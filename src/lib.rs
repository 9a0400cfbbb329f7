//! OPDS catalog browsing.
//!
//! [`catalog`] turns OPDS feeds into normalized [`catalog::Catalog`] models,
//! [`download`] acquires EPUBs, and [`history`] tracks back-navigation.

pub mod catalog;
pub mod config;
pub mod download;
pub mod history;
pub mod util;
