#![doc = "versioned-docs-core: core logic library for versioned-docs."]

//! This crate contains the data model and pipeline that turn the tagged history
//! of a GitHub repository into one documentation page per markdown file per version.
//! Site-builder specific output (writing pages to disk) is not included here.
//!
//! # Usage
//! Depend on this crate for the contracts ([`contract`]), the GitHub client
//! ([`github`]) and the top-level [`pipeline::build`] entrypoint.

pub mod config;
pub mod contract;
pub mod fetch;
pub mod github;
pub mod headings;
pub mod origin;
pub mod pipeline;
pub mod transform;
pub mod versions;
