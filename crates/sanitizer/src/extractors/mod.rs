// ABOUTME: Read-only extraction over descriptions, separate from the cleaning pipeline.
// ABOUTME: Currently heading structure and unification.

//! Extraction module.
//!
//! Submodules:
//! - `headings`: heading lists, counts and the unified `<h3><em>` block.

pub mod headings;
