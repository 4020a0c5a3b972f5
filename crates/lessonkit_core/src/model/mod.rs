//! Lesson content domain model.
//!
//! # Responsibility
//! - Define the content block shape and its per-type attribute structs.
//! - Define the lesson record that owns an ordered block list.
//! - Define media metadata returned by the external upload collaborator.
//!
//! # Invariants
//! - Block positions inside one lesson are contiguous `0..len-1`.
//! - Block ids are unique inside one lesson and never reused.
//! - A block's type never changes after creation.

pub mod block;
pub mod lesson;
pub mod media;
