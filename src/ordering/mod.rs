//! # Ordering Engine
//!
//! Posts are persisted as a flat collection where each record holds its own
//! integer rank. The engine keeps those ranks dense (`0..N-1`) by computing,
//! for every insert, move and delete, the set of `(id, order)` pairs whose
//! stored value must change.
//!
//! The engine is pure. It holds no state between calls: the caller passes
//! the full current snapshot each time, and the caller writes the plan.
//! Every plan is a full O(N) renumbering; only records whose computed rank
//! differs from their stored one are emitted.

mod engine;
mod errors;

pub use engine::{
    detect_inconsistency, plan_insert, plan_removal, plan_resequence, position_of, rank_cmp,
    ranked, sort_by_rank, OrderAssignment, Ranked,
};
pub use errors::{OrderingError, OrderingResult};
