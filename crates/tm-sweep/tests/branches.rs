//! Branch tracking over synthetic root sequences.

use tm_core::BranchId;
use tm_sweep::{TrackerConfig, TrackerEvent, track_branches};

fn abs_diff(a: &f64, b: &f64) -> f64 {
    (a - b).abs()
}

#[test]
fn branch_appearing_once_is_born_and_dies() {
    // Branch A drifts smoothly; a second root exists only at condition 1
    let conditions = vec![vec![1.0], vec![1.05, 3.0], vec![1.1]];
    let result = track_branches(&conditions, abs_diff, &TrackerConfig::default());

    let a = BranchId::from_index(0);
    let b = BranchId::from_index(1);
    assert_eq!(result.branch_ids, vec![a, b]);

    let spanning = &result.branches[&a];
    let conditions_a: Vec<usize> = spanning.points.iter().map(|p| p.condition).collect();
    assert_eq!(conditions_a, vec![0, 1, 2]);
    assert!(spanning.alive);

    let short = &result.branches[&b];
    assert_eq!(short.first_condition(), Some(1));
    assert_eq!(short.last_condition(), Some(1));
    assert!(!short.alive);

    assert_eq!(result.births(), 1);
    assert_eq!(result.deaths(), 1);
    assert_eq!(
        result.events,
        vec![
            TrackerEvent::Birth {
                branch: b,
                condition: 1
            },
            TrackerEvent::Death {
                branch: b,
                condition: 2
            },
        ]
    );
}

#[test]
fn assignments_cover_every_root() {
    let conditions = vec![vec![0.0, 5.0], vec![0.1, 5.1, 9.0], vec![]];
    let result = track_branches(&conditions, abs_diff, &TrackerConfig::default());
    for (roots, assigned) in conditions.iter().zip(&result.assignments) {
        assert_eq!(roots.len(), assigned.len());
        assert!(assigned.iter().all(Option::is_some));
    }
    // Everything alive at condition 1 dies at the empty condition 2
    assert_eq!(result.deaths(), 3);
}

#[test]
fn conditions_strictly_increase_within_a_branch() {
    let conditions: Vec<Vec<f64>> = (0..20)
        .map(|i| {
            let t = i as f64 * 0.01;
            vec![t, 1.0 + t, 2.0 - t]
        })
        .collect();
    let result = track_branches(&conditions, abs_diff, &TrackerConfig::default());
    assert_eq!(result.branch_ids.len(), 3);
    for branch in result.branches.values() {
        assert!(branch.points.windows(2).all(|w| w[1].condition > w[0].condition));
        assert_eq!(branch.points.len(), 20);
    }
}
