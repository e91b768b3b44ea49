//! Task-load spreading.
//!
//! A large academic task is not worked on only on its deadline. Eligible
//! tasks are booked as equal daily sessions over a window that ends on the
//! deadline; every other task is booked in full on the deadline.

use crate::models::{
    ACADEMIC_CATEGORY, ActivityEvent, ActivitySource, CanonicalTaskRecord, LoadType,
};
use chrono::Days;

/// Suffix marking an event as one fragment of a spread task.
pub const SPREAD_SUFFIX: &str = " (spread)";

/// Whether a task's effort may be spread over several days.
///
/// The category match is exact, so "academic" is not eligible.
pub fn is_spreadable(task: &CanonicalTaskRecord) -> bool {
    task.load_type == LoadType::Spread
        && task.estimation_hours > 0.0
        && task.category == ACADEMIC_CATEGORY
}

/// Number of days to spread a workload over.
pub fn window_days(hours: f64) -> u64 {
    if hours > 100.0 {
        120
    } else if hours > 20.0 {
        14
    } else {
        7
    }
}

/// Expand one task into its activity events.
pub fn task_activities(task: &CanonicalTaskRecord) -> Vec<ActivityEvent> {
    if !is_spreadable(task) {
        return vec![ActivityEvent {
            date: task.deadline,
            title: task.task_name.clone(),
            duration_hours: task.estimation_hours,
            category: task.category.clone(),
            source: ActivitySource::TaskList,
        }];
    }

    let window = window_days(task.estimation_hours);
    let daily_load = task.estimation_hours / window as f64;
    let title = format!("{}{}", task.task_name, SPREAD_SUFFIX);

    (0..window)
        .rev()
        .filter_map(|offset| task.deadline.checked_sub_days(Days::new(offset)))
        .map(|date| ActivityEvent {
            date,
            title: title.clone(),
            duration_hours: daily_load,
            category: task.category.clone(),
            source: ActivitySource::TaskList,
        })
        .collect()
}
