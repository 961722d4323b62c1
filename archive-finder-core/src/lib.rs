#![doc = "archive-finder-core: core logic library for archive-finder."]

//! This crate contains the scanning pipeline, data models and report sinks for archive-finder.
//! The binary crate only parses arguments, loads configuration and prints the summary.
//!
//! # Usage
//! Build a [`config::ScanConfig`], use [`gcloud::CloudCli`] for the auth check and project list,
//! then hand the projects to [`scan::Scanner`] together with a [`contract::DeniedSink`].

pub mod command;
pub mod config;
pub mod contract;
pub mod error;
pub mod gcloud;
pub mod report;
pub mod scan;
pub mod search;
