//! WaniKani API client for fetching SRS review statistics.
//!
//! This crate provides [`WaniKaniClient`], which turns the paginated
//! `/v2/assignments` collection and the `/v2/user` resource into a
//! single [`wkstats_types::Snapshot`] for today.
//!
//! Authentication is a bearer token; pass your WaniKani personal access
//! token to [`WaniKaniClient::new`].

pub mod client;

pub use client::{DEFAULT_BASE_URL, Error, Result, WaniKaniClient};
