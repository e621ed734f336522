//! `s3lurk`: multi-provider S3 bucket discovery and permission scanning.

pub mod bucket;
pub mod cli;
pub mod client_registry;
pub mod config;
pub mod credentials;
pub mod enumerate;
pub mod error;
pub mod existence;
pub mod groups;
pub mod input;
pub mod logging;
pub mod permission;
pub mod persistence;
pub mod pipeline;
pub mod provider;
pub mod worker;
