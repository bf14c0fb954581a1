//! Progress roll-up over the activity hierarchy
//!
//! Leaves carry the real progress; parents are summarized as the
//! duration-weighted mean of the leaves beneath them. A leaf without a
//! positive duration weighs 1.

use crate::scale::round_percentage;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use wpt_store::{Activity, ActivityId, WorkId};

/// Roll-up for one work
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub work_id: WorkId,
    /// Weighted completion over every leaf
    pub overall_percentage: f64,
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub not_started: usize,
    pub main_activities: Vec<MainActivitySummary>,
}

/// Roll-up for one main activity's subtree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MainActivitySummary {
    pub activity_id: ActivityId,
    pub activity_code: String,
    pub activity_name: String,
    pub percentage: f64,
    pub leaf_count: usize,
}

struct Hierarchy<'a> {
    by_id: HashMap<ActivityId, &'a Activity>,
    children: HashMap<ActivityId, Vec<&'a Activity>>,
}

impl<'a> Hierarchy<'a> {
    fn build(activities: &'a [Activity]) -> Self {
        let by_id: HashMap<_, _> = activities.iter().map(|a| (a.id, a)).collect();

        let mut ordered: Vec<&Activity> = activities.iter().collect();
        ordered.sort_by_key(|a| (a.display_order, a.id));

        let mut children: HashMap<ActivityId, Vec<&Activity>> = HashMap::new();
        for activity in ordered {
            if let Some(parent) = activity.parent_activity_id {
                if parent != activity.id && by_id.contains_key(&parent) {
                    children.entry(parent).or_default().push(activity);
                }
            }
        }

        Self { by_id, children }
    }

    fn has_children(&self, id: ActivityId) -> bool {
        self.children.get(&id).is_some_and(|c| !c.is_empty())
    }

    fn is_root(&self, activity: &Activity) -> bool {
        activity
            .parent_activity_id
            .map_or(true, |parent| !self.by_id.contains_key(&parent))
    }

    /// Leaves under `root`, in depth-first order; survives cycles
    fn leaves(&self, root: &'a Activity) -> Vec<&'a Activity> {
        let mut leaves = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            if !seen.insert(node.id) {
                continue;
            }
            match self.children.get(&node.id) {
                Some(children) if !children.is_empty() => {
                    stack.extend(children.iter().rev().copied());
                }
                _ => leaves.push(node),
            }
        }
        leaves
    }
}

fn weighted_mean(leaves: &[&Activity]) -> f64 {
    let (weighted, weight) = leaves.iter().fold((0.0, 0.0), |(sum, total), leaf| {
        let w = leaf.duration.filter(|d| d.is_finite() && *d > 0.0).unwrap_or(1.0);
        (sum + leaf.progress_percentage * w, total + w)
    });
    if weight > 0.0 {
        round_percentage(weighted / weight)
    } else {
        0.0
    }
}

/// Summarize a work's activities
#[must_use]
pub fn summarize(work_id: WorkId, activities: &[Activity]) -> ProgressSummary {
    let hierarchy = Hierarchy::build(activities);

    let leaves: Vec<&Activity> = activities
        .iter()
        .filter(|a| !hierarchy.has_children(a.id))
        .collect();

    let completed = activities
        .iter()
        .filter(|a| a.progress_percentage >= 100.0)
        .count();
    let not_started = activities
        .iter()
        .filter(|a| a.progress_percentage <= 0.0)
        .count();

    let mut mains: Vec<&Activity> = activities
        .iter()
        .filter(|a| a.is_main_activity || (hierarchy.is_root(a) && hierarchy.has_children(a.id)))
        .collect();
    mains.sort_by_key(|a| (a.display_order, a.id));

    let main_activities = mains
        .into_iter()
        .map(|main| {
            let subtree = hierarchy.leaves(main);
            MainActivitySummary {
                activity_id: main.id,
                activity_code: main.activity_code.clone(),
                activity_name: main.activity_name.clone(),
                percentage: weighted_mean(&subtree),
                leaf_count: subtree.len(),
            }
        })
        .collect();

    ProgressSummary {
        work_id,
        overall_percentage: weighted_mean(&leaves),
        total: activities.len(),
        completed,
        in_progress: activities.len() - completed - not_started,
        not_started,
        main_activities,
    }
}
