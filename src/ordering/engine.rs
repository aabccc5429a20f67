//! Rank sort and write plans

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::errors::{OrderingError, OrderingResult};

/// Anything that carries a persisted rank
pub trait Ranked {
    fn id(&self) -> &str;

    /// Stored rank; `None` for rows written before ranks existed
    fn stored_order(&self) -> Option<u32>;

    fn created_at(&self) -> Option<DateTime<Utc>>;
}

/// One write in a plan: set `order` of record `id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderAssignment {
    pub id: String,
    pub order: u32,
}

impl OrderAssignment {
    pub fn new(id: impl Into<String>, order: u32) -> Self {
        Self {
            id: id.into(),
            order,
        }
    }
}

/// Display ordering.
///
/// Stored rank ascending with missing ranks last, then newest first with
/// missing timestamps last, then id. Total even when stored ranks are
/// duplicated or absent.
pub fn rank_cmp<T: Ranked + ?Sized>(a: &T, b: &T) -> Ordering {
    let by_order = match (a.stored_order(), b.stored_order()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_order
        .then_with(|| match (a.created_at(), b.created_at()) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.id().cmp(b.id()))
}

/// Sort in place by display ordering
pub fn sort_by_rank<T: Ranked>(items: &mut [T]) {
    items.sort_by(|a, b| rank_cmp(a, b));
}

/// Borrowed view of `items` in display ordering
pub fn ranked<T: Ranked>(items: &[T]) -> Vec<&T> {
    let mut view: Vec<&T> = items.iter().collect();
    view.sort_by(|a, b| rank_cmp(*a, *b));
    view
}

/// Display position of `id`, if present
pub fn position_of<T: Ranked>(current: &[T], id: &str) -> Option<usize> {
    ranked(current).iter().position(|item| item.id() == id)
}

/// Plan placing `moved` at `target_position`.
///
/// `excluding_id` is removed from the sequence first; pass the moved record's
/// own id to move an existing record, `None` to insert a new one. Valid
/// positions are `0..=len` of the sequence after exclusion.
pub fn plan_insert<T: Ranked>(
    current: &[T],
    excluding_id: Option<&str>,
    moved: &T,
    target_position: usize,
) -> OrderingResult<Vec<OrderAssignment>> {
    let mut sequence: Vec<&T> = ranked(current)
        .into_iter()
        .filter(|item| Some(item.id()) != excluding_id)
        .collect();

    if sequence.iter().any(|item| item.id() == moved.id()) {
        return Err(OrderingError::DuplicateRecord(moved.id().to_string()));
    }
    if target_position > sequence.len() {
        return Err(OrderingError::PositionOutOfRange {
            position: target_position,
            max: sequence.len(),
        });
    }

    sequence.insert(target_position, moved);
    Ok(renumber(&sequence))
}

/// Plan closing the gap left by `removed_id`.
///
/// An id that is not present degrades to a plain resequence.
pub fn plan_removal<T: Ranked>(current: &[T], removed_id: &str) -> Vec<OrderAssignment> {
    let sequence: Vec<&T> = ranked(current)
        .into_iter()
        .filter(|item| item.id() != removed_id)
        .collect();
    renumber(&sequence)
}

/// Repair plan over the full set
pub fn plan_resequence<T: Ranked>(current: &[T]) -> Vec<OrderAssignment> {
    renumber(&ranked(current))
}

/// True if any stored rank differs from its display position.
pub fn detect_inconsistency<T: Ranked>(loaded: &[T]) -> bool {
    ranked(loaded)
        .iter()
        .enumerate()
        .any(|(index, item)| !matches_index(*item, index))
}

fn renumber<T: Ranked>(sequence: &[&T]) -> Vec<OrderAssignment> {
    sequence
        .iter()
        .enumerate()
        .filter(|(index, item)| !matches_index(**item, *index))
        .map(|(index, item)| OrderAssignment::new(item.id(), index as u32))
        .collect()
}

fn matches_index<T: Ranked + ?Sized>(item: &T, index: usize) -> bool {
    item.stored_order().map(|o| o as usize) == Some(index)
}
