//! Block mutation engine.
//!
//! # Responsibility
//! - Provide pure, invariant-preserving transformations over a lesson's
//!   ordered block sequence.
//! - Normalize externally loaded sequences before first render/edit.
//!
//! # Invariants
//! - Every operation returns a new sequence whose positions are `0..len-1`
//!   in array order and whose ids are unique.
//! - Operations on unknown ids return a sequence equal to the input.
//! - No operation fails or panics on well-formed input.
//!
//! Every structural operation ends with [`reindex`], which is public so
//! tests and load paths can rely on the same renumbering rule.

mod mutation;

pub use mutation::{
    append, find, insert, is_well_formed, move_down, move_to, move_up, normalize_loaded, reindex,
    remove, update_attributes, update_content,
};
