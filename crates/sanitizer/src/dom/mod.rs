// ABOUTME: DOM model and cleaning passes for product description markup.
// ABOUTME: Wraps scraper parsing in an editable arena tree the passes rewrite in place.

//! DOM utilities for description cleaning.
//!
//! `tree` holds the editable fragment, `cleaners` the ordered passes that run
//! over it, `preserve` the opaque block matching, `brs` the line-break helpers
//! and `tags` the element classification tables.

pub mod brs;
pub mod cleaners;
pub mod preserve;
pub mod tags;
pub mod tree;
