//! Query construction: predicates, ordered sort terms and limits.
//!
//! # Responsibility
//! - Describe which records a caller wants, independent of the engine.
//!
//! # Invariants
//! - Sort terms are an ordered sequence; the first term has highest
//!   precedence and engines must submit them in that order.
//! - `limit == 0` means unbounded.

pub mod predicate;
pub mod request;
