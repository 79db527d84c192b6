use crate::kv::{KvStore, keys};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

pub const MILESTONES: [u32; 4] = [25, 50, 75, 100];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GoalCategory {
    Quran,
    Prayer,
    Charity,
    Fasting,
    Personal,
    Custom,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Goal {
    pub id: String,
    pub title: String,
    pub category: GoalCategory,
    pub target_value: f64,
    pub current_value: f64,
    pub unit: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_completed: bool,
    pub milestones_notified: Vec<u32>,
    pub created_at: DateTime<Utc>,
}

impl Goal {
    pub fn progress_percent(&self) -> u32 {
        if self.target_value <= 0.0 {
            return 0;
        }
        (self.current_value / self.target_value * 100.0).round().max(0.0) as u32
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewGoal {
    pub title: String,
    pub category: GoalCategory,
    pub target_value: f64,
    pub unit: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoalLog {
    pub id: String,
    pub goal_id: String,
    pub date: NaiveDate,
    pub value_added: f64,
    pub note: String,
    pub logged_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressLogged {
    pub goal: Goal,
    pub milestone: Option<u32>,
}

fn logs_key(goal_id: &str) -> String {
    format!("{}{}", keys::GOAL_LOGS_PREFIX, goal_id)
}

pub fn goals(store: &KvStore) -> Vec<Goal> {
    store.get(keys::GOALS).unwrap_or_default()
}

pub fn add_goal(store: &mut KvStore, new_goal: NewGoal, now: DateTime<Utc>) -> Goal {
    let goal = Goal {
        id: Uuid::new_v4().to_string(),
        title: new_goal.title,
        category: new_goal.category,
        target_value: new_goal.target_value,
        current_value: 0.0,
        unit: new_goal.unit,
        start_date: new_goal.start_date,
        end_date: new_goal.end_date,
        is_completed: false,
        milestones_notified: Vec::new(),
        created_at: now,
    };

    let mut all = goals(store);
    all.push(goal.clone());
    store.set(keys::GOALS, &all);
    goal
}

pub fn delete_goal(store: &mut KvStore, goal_id: &str) -> bool {
    let mut all = goals(store);
    let before = all.len();
    all.retain(|goal| goal.id != goal_id);
    if all.len() == before {
        return false;
    }
    store.set(keys::GOALS, &all);
    store.delete(&logs_key(goal_id));
    true
}

pub fn log_progress(
    store: &mut KvStore,
    goal_id: &str,
    value: f64,
    note: &str,
    now: DateTime<Utc>,
) -> Option<ProgressLogged> {
    let mut all = goals(store);
    let goal = all.iter_mut().find(|goal| goal.id == goal_id)?;

    goal.current_value += value;
    goal.is_completed = goal.current_value >= goal.target_value;

    let progress = goal.progress_percent();
    let mut milestone = None;
    for mark in MILESTONES {
        if progress >= mark && !goal.milestones_notified.contains(&mark) {
            goal.milestones_notified.push(mark);
            milestone = Some(mark);
        }
    }
    if let Some(mark) = milestone {
        debug!(goal = %goal.id, mark, "goal milestone crossed");
    }

    let updated = goal.clone();
    store.set(keys::GOALS, &all);

    let key = logs_key(goal_id);
    let mut logs: Vec<GoalLog> = store.get(&key).unwrap_or_default();
    logs.push(GoalLog {
        id: Uuid::new_v4().to_string(),
        goal_id: goal_id.to_string(),
        date: now.date_naive(),
        value_added: value,
        note: note.to_string(),
        logged_at: now,
    });
    store.set(&key, &logs);

    Some(ProgressLogged {
        goal: updated,
        milestone,
    })
}

pub fn goal_logs(store: &KvStore, goal_id: &str) -> Vec<GoalLog> {
    store.get(&logs_key(goal_id)).unwrap_or_default()
}
