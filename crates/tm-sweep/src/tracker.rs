//! Branch tracking: persistent identities for roots across a sweep.
//!
//! At every condition the live branches (by their latest root) are matched
//! against the new roots, cheapest pair first. A branch left unmatched dies
//! and is never revived; an unmatched root starts a new branch.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tm_core::BranchId;
use tracing::debug;

/// Branch matching settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Pairs costing this much or more are never matched
    pub max_match_cost: f64,
    /// Unmatched roots start new branches; otherwise they are unassigned
    pub allow_births: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_match_cost: 0.25,
            allow_births: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchPoint<R> {
    pub condition: usize,
    pub root: R,
    /// Match cost from the previous point; zero where the branch started
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Branch<R> {
    pub id: BranchId,
    /// Strictly increasing in `condition`
    pub points: Vec<BranchPoint<R>>,
    pub alive: bool,
}

impl<R> Branch<R> {
    pub fn first_condition(&self) -> Option<usize> {
        self.points.first().map(|p| p.condition)
    }

    pub fn last_condition(&self) -> Option<usize> {
        self.points.last().map(|p| p.condition)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TrackerEvent {
    Birth { branch: BranchId, condition: usize },
    Death { branch: BranchId, condition: usize },
    Unassigned { condition: usize, root_index: usize },
}

/// Incremental tracker fed one condition at a time.
#[derive(Debug, Clone)]
pub struct BranchTracker<R> {
    config: TrackerConfig,
    branches: BTreeMap<BranchId, Branch<R>>,
    events: Vec<TrackerEvent>,
    assignments: Vec<Vec<Option<BranchId>>>,
    next_id: u32,
}

impl<R: Clone> BranchTracker<R> {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            branches: BTreeMap::new(),
            events: Vec::new(),
            assignments: Vec::new(),
            next_id: 0,
        }
    }

    /// Assign this condition's roots to branches.
    ///
    /// Returns one entry per root: its branch, or `None` if it was left
    /// unassigned. Roots at the first condition seed branches without
    /// birth events.
    pub fn step<D>(&mut self, roots: &[R], distance: D) -> Vec<Option<BranchId>>
    where
        D: Fn(&R, &R) -> f64,
    {
        let condition = self.assignments.len();
        let mut assigned = vec![None; roots.len()];

        let live: Vec<BranchId> = self
            .branches
            .values()
            .filter(|b| b.alive)
            .map(|b| b.id)
            .collect();

        // Candidate pairs under the threshold, cheapest first, ties row-major
        let mut candidates = Vec::new();
        for (row, id) in live.iter().enumerate() {
            let Some(last) = self.branches.get(id).and_then(|b| b.points.last()) else {
                continue;
            };
            for (col, root) in roots.iter().enumerate() {
                let cost = distance(&last.root, root);
                if cost < self.config.max_match_cost {
                    candidates.push((cost, row, col));
                }
            }
        }
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

        let mut row_used = vec![false; live.len()];
        for (cost, row, col) in candidates {
            if row_used[row] || assigned[col].is_some() {
                continue;
            }
            row_used[row] = true;
            let id = live[row];
            assigned[col] = Some(id);
            if let Some(branch) = self.branches.get_mut(&id) {
                branch.points.push(BranchPoint {
                    condition,
                    root: roots[col].clone(),
                    cost,
                });
            }
        }

        for (row, id) in live.iter().enumerate() {
            if !row_used[row] {
                if let Some(branch) = self.branches.get_mut(id) {
                    branch.alive = false;
                }
                debug!(branch = %id, condition, "branch died");
                self.events.push(TrackerEvent::Death {
                    branch: *id,
                    condition,
                });
            }
        }

        for (col, slot) in assigned.iter_mut().enumerate() {
            if slot.is_some() {
                continue;
            }
            if !self.config.allow_births && condition > 0 {
                self.events.push(TrackerEvent::Unassigned {
                    condition,
                    root_index: col,
                });
                continue;
            }
            let id = BranchId::from_index(self.next_id);
            self.next_id += 1;
            self.branches.insert(
                id,
                Branch {
                    id,
                    points: vec![BranchPoint {
                        condition,
                        root: roots[col].clone(),
                        cost: 0.0,
                    }],
                    alive: true,
                },
            );
            if condition > 0 {
                debug!(branch = %id, condition, "branch born");
                self.events.push(TrackerEvent::Birth {
                    branch: id,
                    condition,
                });
            }
            *slot = Some(id);
        }

        self.assignments.push(assigned.clone());
        assigned
    }

    pub fn finish(self) -> TrackingResult<R> {
        TrackingResult {
            branch_ids: self.branches.keys().copied().collect(),
            branches: self.branches,
            events: self.events,
            assignments: self.assignments,
        }
    }
}

/// Full tracking history over a sequence of conditions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackingResult<R> {
    /// Per condition, per root: the branch it was assigned to
    pub assignments: Vec<Vec<Option<BranchId>>>,
    pub branches: BTreeMap<BranchId, Branch<R>>,
    /// Sorted ascending (birth order)
    pub branch_ids: Vec<BranchId>,
    pub events: Vec<TrackerEvent>,
}

impl<R> TrackingResult<R> {
    pub fn births(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, TrackerEvent::Birth { .. }))
            .count()
    }

    pub fn deaths(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, TrackerEvent::Death { .. }))
            .count()
    }
}

/// Track branches over all conditions at once.
pub fn track_branches<R, D>(
    conditions: &[Vec<R>],
    distance: D,
    config: &TrackerConfig,
) -> TrackingResult<R>
where
    R: Clone,
    D: Fn(&R, &R) -> f64,
{
    let mut tracker = BranchTracker::new(config.clone());
    for roots in conditions {
        tracker.step(roots, &distance);
    }
    tracker.finish()
}
