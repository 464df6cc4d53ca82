//! In-memory DOM model
//!
//! The pipeline never owns element lifetime; it annotates elements living in
//! a [`Document`] through side tables keyed by [`ElementId`]. This module
//! provides:
//! - ElementNode: value data of a DOM element (tag, text, attributes, geometry)
//! - Document: arena-backed tree with viewport and scroll state
//! - ElementId: stable, never-reused element identity

pub mod document;
pub mod element;

pub use document::{Document, ElementId, Viewport};
pub use element::{BoundingBox, ElementNode};
