//! Shared test utilities for the slice-manager workspace.
//!
//! This crate provides standardised in-memory fakes for the four external
//! collaborator seams, plus resource builders. It is a dev-dependency only
//! and never published.
//!
//! # Modules
//!
//! - [`cluster`]: [`FakeCluster`](cluster::FakeCluster), an in-memory
//!   resource store implementing `ClusterHandle`
//! - [`git`]: [`FakeGit`](git::FakeGit), a canned desired-state repository
//! - [`ports`]: fake package validator and metrics collector
//! - [`resource`]: builders for common resource documents

pub mod cluster;
pub mod git;
pub mod ports;
pub mod resource;

pub use cluster::FakeCluster;
pub use git::FakeGit;
pub use ports::{FakeMetrics, FakeValidator};
