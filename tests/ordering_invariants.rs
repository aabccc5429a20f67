//! Ordering Invariant Tests
//!
//! Drives the ordering engine through long mixed sequences of inserts,
//! moves and removals, writing each plan back the way the post service
//! does, and checks after every step that:
//! - stored ranks are exactly 0..N-1
//! - the placed record lands at the requested position
//! - records not named by a plan keep their rank

use chrono::{DateTime, TimeZone, Utc};
use folio::ordering::{
    detect_inconsistency, plan_insert, plan_removal, plan_resequence, position_of, ranked,
    OrderAssignment, Ranked,
};

// =============================================================================
// Test Utilities
// =============================================================================

#[derive(Debug, Clone)]
struct Row {
    id: String,
    order: Option<u32>,
    created: Option<DateTime<Utc>>,
}

impl Ranked for Row {
    fn id(&self) -> &str {
        &self.id
    }
    fn stored_order(&self) -> Option<u32> {
        self.order
    }
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created
    }
}

/// Small deterministic generator so failures reproduce.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: usize) -> usize {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 33) as usize) % bound.max(1)
    }
}

fn apply(rows: &mut [Row], plan: &[OrderAssignment]) {
    for assignment in plan {
        let row = rows
            .iter_mut()
            .find(|r| r.id == assignment.id)
            .expect("plan names an unknown row");
        row.order = Some(assignment.order);
    }
}

fn assert_dense(rows: &[Row]) {
    let mut orders: Vec<u32> = rows.iter().map(|r| r.order.expect("rank missing")).collect();
    orders.sort_unstable();
    let expected: Vec<u32> = (0..rows.len() as u32).collect();
    assert_eq!(orders, expected);
    assert!(!detect_inconsistency(rows));
}

fn display_ids(rows: &[Row]) -> Vec<String> {
    ranked(rows).iter().map(|r| r.id.clone()).collect()
}

fn created(seconds: i64) -> Option<DateTime<Utc>> {
    Some(Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap())
}

// =============================================================================
// Mixed operation sequences
// =============================================================================

#[test]
fn test_random_operations_keep_ranks_dense() {
    for seed in [1u64, 7, 42, 2024] {
        let mut rng = Lcg(seed);
        let mut rows: Vec<Row> = Vec::new();
        let mut next_id = 0;

        for step in 0..300 {
            match rng.next(4) {
                // insert
                0 | 1 => {
                    let target = rng.next(rows.len() + 1);
                    let row = Row {
                        id: format!("r{}", next_id),
                        order: None,
                        created: created(step),
                    };
                    next_id += 1;

                    let plan = plan_insert(&rows, None, &row, target).unwrap();
                    rows.push(row.clone());
                    apply(&mut rows, &plan);

                    assert_eq!(position_of(&rows, &row.id), Some(target));
                }
                // move
                2 if !rows.is_empty() => {
                    let id = rows[rng.next(rows.len())].id.clone();
                    let target = rng.next(rows.len());
                    let before = display_ids(&rows);
                    let moved = rows.iter().find(|r| r.id == id).cloned().unwrap();

                    let plan = plan_insert(&rows, Some(&id), &moved, target).unwrap();
                    apply(&mut rows, &plan);

                    assert_eq!(position_of(&rows, &id), Some(target));
                    let mut expected: Vec<String> =
                        before.into_iter().filter(|other| *other != id).collect();
                    expected.insert(target, id);
                    assert_eq!(display_ids(&rows), expected);
                }
                // remove
                _ if !rows.is_empty() => {
                    let id = rows[rng.next(rows.len())].id.clone();
                    let before = display_ids(&rows);

                    let plan = plan_removal(&rows, &id);
                    rows.retain(|r| r.id != id);
                    apply(&mut rows, &plan);

                    let expected: Vec<String> =
                        before.into_iter().filter(|other| *other != id).collect();
                    assert_eq!(display_ids(&rows), expected);
                }
                _ => {}
            }
            assert_dense(&rows);
        }
    }
}

#[test]
fn test_plans_only_name_changed_rows() {
    let mut rows: Vec<Row> = (0..8)
        .map(|i| Row {
            id: format!("r{}", i),
            order: Some(i),
            created: created(i as i64),
        })
        .collect();

    // Moving r2 to position 5 shifts r3..r5 up by one and nothing else.
    let moved = rows[2].clone();
    let plan = plan_insert(&rows, Some("r2"), &moved, 5).unwrap();
    let mut named: Vec<&str> = plan.iter().map(|a| a.id.as_str()).collect();
    named.sort_unstable();
    assert_eq!(named, vec!["r2", "r3", "r4", "r5"]);

    apply(&mut rows, &plan);
    assert_dense(&rows);
    assert_eq!(
        display_ids(&rows),
        vec!["r0", "r1", "r3", "r4", "r5", "r2", "r6", "r7"]
    );
}

// =============================================================================
// Repair of legacy and corrupted ranks
// =============================================================================

#[test]
fn test_resequence_repairs_any_starting_state() {
    let mut rng = Lcg(99);
    for _ in 0..50 {
        let len = rng.next(12) + 1;
        let mut rows: Vec<Row> = (0..len)
            .map(|i| Row {
                id: format!("r{}", i),
                order: match rng.next(3) {
                    0 => None,
                    _ => Some(rng.next(len * 2) as u32),
                },
                created: if rng.next(4) == 0 { None } else { created(rng.next(100) as i64) },
            })
            .collect();

        let before = display_ids(&rows);
        let plan = plan_resequence(&rows);
        apply(&mut rows, &plan);

        assert_dense(&rows);
        // Repair keeps the display order it found.
        assert_eq!(display_ids(&rows), before);
        assert!(plan_resequence(&rows).is_empty());
    }
}

#[test]
fn test_missing_ranks_sort_after_ranked_newest_first() {
    let rows = vec![
        Row { id: "old".into(), order: None, created: created(1) },
        Row { id: "ranked".into(), order: Some(0), created: created(0) },
        Row { id: "new".into(), order: None, created: created(5) },
        Row { id: "undated".into(), order: None, created: None },
    ];
    assert_eq!(display_ids(&rows), vec!["ranked", "new", "old", "undated"]);
    assert!(detect_inconsistency(&rows));
}
