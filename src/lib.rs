//! Decode a tree of stored `.eml` messages, normalize each one into a
//! canonical record and publish it to a per-case Solr core.

pub mod config;
pub mod discovery;
pub mod domain;
pub mod error;
pub mod extract;
pub mod index;
pub mod mail;
pub mod normalize;
pub mod pipeline;
