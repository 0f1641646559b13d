//! Library entry for catalog-feed exposing the feed pipeline for the binary and integration tests.
//!
//! Data flows from [`sources`] (HTTP page fetcher and cache) into a
//! [`feed::FeedView`], whose loader accumulates pages; each render tick ranks
//! the accumulated items with [`logic::rank`] and windows them with
//! [`logic::viewport`]. A [`feed::ScrollTrigger`] turns scroll positions near
//! the bottom into the next page request.

pub mod app;
pub mod args;
pub mod config;
pub mod feed;
pub mod logic;
pub mod sources;
pub mod state;
pub mod ui;

#[cfg(test)]
mod test_utils;
