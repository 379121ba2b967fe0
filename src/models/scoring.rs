//! The scoring core: points aggregation, level progression, badge ranks and
//! streaks, derived from read-only snapshots of the entity collections.
//!
//! Everything here is a pure function of its arguments. Nothing reads
//! contract state or the environment, so the whole module is callable from
//! plain unit tests and safe to re-run on every state change. Malformed
//! input (duplicate or unparseable history dates, penalty overflow) is
//! clamped or skipped, never surfaced as an error.

use schemars::JsonSchema;
use near_sdk::borsh::{self, BorshDeserialize, BorshSerialize};
use near_sdk::serde::{Deserialize, Serialize};

use crate::models::config::scoring::*;
use crate::models::date::{self, EpochDay};
use crate::models::habit::{Habit, HabitHistoryEntry};
use crate::models::project::{CompletedProject, Project};
use crate::models::settings::ScoringSettings;
use crate::models::task::Task;

// === Core Enums ===

/// The twelve badge ranks, lowest to highest.
#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize,
    Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, JsonSchema)]
#[serde(crate = "near_sdk::serde")]
#[serde(rename_all = "lowercase")]
pub enum BadgeRank {
    Bronze3,
    Bronze2,
    Bronze1,
    Silver3,
    Silver2,
    Silver1,
    Gold3,
    Gold2,
    Gold1,
    Diamond,
    Platinum,
    Ruby,
}

/// Fixed rank breakpoints, checked in order with strict less-than; at or
/// above the last breakpoint the rank is `Ruby`.
const BADGE_BREAKPOINTS: [(u32, BadgeRank); 11] = [
    (100, BadgeRank::Bronze3),
    (250, BadgeRank::Bronze2),
    (500, BadgeRank::Bronze1),
    (750, BadgeRank::Silver3),
    (1000, BadgeRank::Silver2),
    (1500, BadgeRank::Silver1),
    (2000, BadgeRank::Gold3),
    (3000, BadgeRank::Gold2),
    (4000, BadgeRank::Gold1),
    (5000, BadgeRank::Diamond),
    (7500, BadgeRank::Platinum),
];

// === Return Types ===
#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize,
    Debug, PartialEq, Clone, Copy, JsonSchema)]
#[serde(crate = "near_sdk::serde")]
pub struct LevelProgress {
    pub level: u32,
    pub next_level_percentage: u32,
}

/// Everything the presentation side needs, recomputed in one call.
#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize,
    Debug, PartialEq, Clone, JsonSchema)]
#[serde(crate = "near_sdk::serde")]
pub struct ScoringSnapshot {
    pub total_points: u32,
    pub level: u32,
    pub next_level_percentage: u32,
    pub badge: BadgeRank,
}

#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize,
    Debug, PartialEq, Clone, JsonSchema)]
#[serde(crate = "near_sdk::serde")]
pub struct HabitStats {
    pub completed_days: u32,
    pub failed_days: u32,
    pub not_tracked_days: u32,
    pub completion_rate: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
}

#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize,
    Debug, PartialEq, Clone, JsonSchema)]
#[serde(crate = "near_sdk::serde")]
pub struct ProjectStatistics {
    pub total_projects: u32,
    pub ongoing_projects: u32,
    pub completed_projects: u32,
    pub total_points: u32,
    pub average_completion: u32,
    pub average_duration_days: u32,
}

// Integer equivalent of JS Math.round for non-negative ratios: half rounds
// up.
fn round_ratio(numerator: u64, denominator: u64) -> u64 {
    (2 * numerator + denominator) / (2 * denominator)
}

// === Points Aggregation ===

/// The single recomputation entry point: total points, level progression and
/// badge rank from one pass over the collections.
pub fn recompute_scoring(
    habits: &[Habit],
    tasks: &[Task],
    projects: &[Project],
    completed_projects: &[CompletedProject],
    settings: &ScoringSettings,
) -> ScoringSnapshot {
    let total = total_points(habits, tasks, projects, completed_projects, settings);
    let progress = calculate_level(total, &settings.level_thresholds);

    ScoringSnapshot {
        total_points: total,
        level: progress.level,
        next_level_percentage: progress.next_level_percentage,
        badge: calculate_badge(total),
    }
}

/// Net point total across every source, clamped to `[0, u32::MAX]` so the
/// failure penalty can never push the level or badge inputs negative.
pub fn total_points(
    habits: &[Habit],
    tasks: &[Task],
    projects: &[Project],
    completed_projects: &[CompletedProject],
    settings: &ScoringSettings,
) -> u32 {
    let earned = habit_points(habits, settings)
        + task_points(tasks, settings)
        + active_project_points(projects, settings)
        + completed_project_points(completed_projects);

    let net = earned as i128 - task_penalty(tasks) as i128;
    net.clamp(0, u32::MAX as i128) as u32
}

/// Completed history entries across all habits, at the configured per-habit
/// value. Entries are counted as stored; deduplication is the owning layer's
/// invariant.
pub fn habit_points(habits: &[Habit], settings: &ScoringSettings) -> u64 {
    let completed_days: u64 = habits.iter()
        .map(|habit| habit.history.iter().filter(|entry| entry.completed).count() as u64)
        .sum();
    completed_days * settings.points_per_habit as u64
}

/// Completed tasks at their custom value when one is set (and positive),
/// else the configured per-task value.
pub fn task_points(tasks: &[Task], settings: &ScoringSettings) -> u64 {
    tasks.iter()
        .filter(|task| task.completed)
        .map(|task| match task.custom_points {
            Some(points) if points > 0 => points as u64,
            _ => settings.points_per_task as u64,
        })
        .sum()
}

/// Flat deduction per failed task, regardless of its completion state.
pub fn task_penalty(tasks: &[Task]) -> u64 {
    tasks.iter().filter(|task| task.failed).count() as u64 * TASK_FAILURE_PENALTY as u64
}

/// Completed-stage points of one project; a stage with no point value falls
/// back to the configured per-stage value.
pub fn project_stage_points(project: &Project, settings: &ScoringSettings) -> u64 {
    project.stages.iter()
        .filter(|stage| stage.completed)
        .map(|stage| {
            if stage.points > 0 {
                stage.points as u64
            } else {
                settings.points_per_project_stage as u64
            }
        })
        .sum()
}

/// 20% of earned stage points, rounded.
pub fn completion_bonus(stage_points: u64) -> u64 {
    round_ratio(stage_points, COMPLETION_BONUS_DIVISOR)
}

/// Stage points of every project still in the active list, plus the
/// completion bonus for those already marked completed.
pub fn active_project_points(projects: &[Project], settings: &ScoringSettings) -> u64 {
    projects.iter()
        .map(|project| {
            let stage_points = project_stage_points(project, settings);
            if project.is_completed {
                stage_points + completion_bonus(stage_points)
            } else {
                stage_points
            }
        })
        .sum()
}

/// Archived projects contribute the snapshot taken at completion, as stored.
pub fn completed_project_points(completed_projects: &[CompletedProject]) -> u64 {
    completed_projects.iter()
        .map(|project| project.total_points as u64)
        .sum()
}

/// Live point value of a project: completed stages, completed todos at the
/// per-task value, and the completion bonus once the project is completed.
pub fn calculate_project_points(project: &Project, settings: &ScoringSettings) -> u32 {
    project_points_with_completion(project, settings, project.is_completed)
}

/// The completion-time snapshot: same as [`calculate_project_points`] but
/// with the bonus always counted, since the project is transitioning to
/// completed.
pub fn completion_snapshot_points(project: &Project, settings: &ScoringSettings) -> u32 {
    project_points_with_completion(project, settings, true)
}

fn project_points_with_completion(
    project: &Project,
    settings: &ScoringSettings,
    completed: bool,
) -> u32 {
    let stage_points = project_stage_points(project, settings);
    let todo_points = project.todos.iter().filter(|todo| todo.completed).count() as u64
        * settings.points_per_task as u64;
    let bonus = if completed { completion_bonus(stage_points) } else { 0 };

    (stage_points + todo_points + bonus).min(u32::MAX as u64) as u32
}

// === Level Calculation ===

/// Maps a point total onto the threshold ladder.
///
/// Level 1 covers `[0, t0)`; each threshold is the inclusive floor of the
/// next level. Past the last threshold the next goal is synthesized as twice
/// the last one, so progression never caps. The percentage toward the next
/// level is rounded and clamped to 100. An empty ladder (invalid upstream)
/// degrades to level 1.
pub fn calculate_level(points: u32, thresholds: &[u32]) -> LevelProgress {
    if thresholds.is_empty() {
        return LevelProgress { level: 1, next_level_percentage: 0 };
    }

    let points = points as u64;
    let mut level: u32 = 1;
    let mut floor: u64 = 0;
    let mut next: u64 = thresholds[0] as u64;

    for (index, &threshold) in thresholds.iter().enumerate() {
        if points >= threshold as u64 {
            level = index as u32 + 2;
            floor = threshold as u64;
            next = thresholds.get(index + 1)
                .map(|&t| t as u64)
                .unwrap_or(threshold as u64 * 2);
        } else {
            next = threshold as u64;
            break;
        }
    }

    let span = next.saturating_sub(floor);
    let next_level_percentage = if span == 0 {
        100
    } else {
        round_ratio((points - floor) * 100, span).min(100) as u32
    };

    LevelProgress { level, next_level_percentage }
}

// === Badge Classification ===

/// Rank for a point total; first breakpoint the total is below wins.
pub fn calculate_badge(points: u32) -> BadgeRank {
    for &(breakpoint, rank) in BADGE_BREAKPOINTS.iter() {
        if points < breakpoint {
            return rank;
        }
    }
    BadgeRank::Ruby
}

// === Streak Calculation ===

// First-inserted entry per date is authoritative; unparseable dates are
// treated as absent.
fn entry_for_day(history: &[HabitHistoryEntry], day: EpochDay) -> Option<&HabitHistoryEntry> {
    history.iter().find(|entry| date::parse_date(&entry.date) == Some(day))
}

/// Consecutive completed calendar days ending today.
///
/// Zero unless today's entry exists and is completed; from there the walk
/// moves backward one calendar day at a time, so a day with no entry breaks
/// the streak even when older entries exist.
pub fn current_streak(history: &[HabitHistoryEntry], today: EpochDay) -> u32 {
    match entry_for_day(history, today) {
        Some(entry) if entry.completed => {},
        _ => return 0,
    }

    let mut streak = 1;
    let mut day = today - 1;
    while let Some(entry) = entry_for_day(history, day) {
        if !entry.completed {
            break;
        }
        streak += 1;
        day -= 1;
    }
    streak
}

/// Longest run of completed entries over the date-sorted history.
///
/// The scan walks entries, not calendar days: two completed entries on
/// either side of an unrecorded gap extend the same run. The current-streak
/// walk above is stricter; the asymmetry is intentional.
pub fn longest_streak(history: &[HabitHistoryEntry]) -> u32 {
    let mut days: Vec<(EpochDay, bool)> = Vec::with_capacity(history.len());
    for entry in history {
        if let Some(day) = date::parse_date(&entry.date) {
            if !days.iter().any(|&(seen, _)| seen == day) {
                days.push((day, entry.completed));
            }
        }
    }
    days.sort_unstable_by_key(|&(day, _)| day);

    let mut longest = 0;
    let mut current = 0;
    for &(_, completed) in &days {
        if completed {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

// === Derived Stats ===

pub fn habit_stats(habit: &Habit, today: EpochDay) -> HabitStats {
    let total = habit.history.len() as u32;
    let completed_days = habit.history.iter().filter(|entry| entry.completed).count() as u32;
    let failed_days = habit.history.iter().filter(|entry| entry.failed).count() as u32;

    let completion_rate = if total == 0 {
        0
    } else {
        round_ratio(completed_days as u64 * 100, total as u64) as u32
    };

    HabitStats {
        completed_days,
        failed_days,
        not_tracked_days: total.saturating_sub(completed_days + failed_days),
        completion_rate,
        current_streak: current_streak(&habit.history, today),
        longest_streak: longest_streak(&habit.history),
    }
}

/// Share of completed tasks, as a rounded percentage; 0 for no tasks.
pub fn completion_rate(tasks: &[Task]) -> u32 {
    if tasks.is_empty() {
        return 0;
    }
    let completed = tasks.iter().filter(|task| task.completed).count() as u64;
    round_ratio(completed * 100, tasks.len() as u64) as u32
}

pub fn project_statistics(
    projects: &[Project],
    completed_projects: &[CompletedProject],
    settings: &ScoringSettings,
) -> ProjectStatistics {
    let active_points: u64 = projects.iter()
        .map(|project| {
            project.total_points
                .filter(|&snapshot| snapshot > 0)
                .unwrap_or_else(|| calculate_project_points(project, settings)) as u64
        })
        .sum();
    let archived_points: u64 = completed_projects.iter()
        .map(|project| project.total_points as u64)
        .sum();

    let average_completion = if projects.is_empty() {
        0
    } else {
        let progress_sum: u64 = projects.iter().map(|project| project.progress as u64).sum();
        round_ratio(progress_sum, projects.len() as u64) as u32
    };

    let average_duration_days = if completed_projects.is_empty() {
        0
    } else {
        let duration_sum: u64 = completed_projects.iter()
            .map(|project| project.duration_days as u64)
            .sum();
        round_ratio(duration_sum, completed_projects.len() as u64) as u32
    };

    ProjectStatistics {
        total_projects: (projects.len() + completed_projects.len()) as u32,
        ongoing_projects: projects.len() as u32,
        completed_projects: completed_projects.len() as u32,
        total_points: (active_points + archived_points).min(u32::MAX as u64) as u32,
        average_completion,
        average_duration_days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::habit::HabitFrequency;
    use crate::models::task::Priority;
    use near_sdk::test_utils::{accounts, VMContextBuilder};
    use near_sdk::testing_env;

    const DAY_NS: u64 = 24 * 60 * 60 * 1_000_000_000;
    const TODAY: EpochDay = 20000;

    fn setup() {
        let mut builder = VMContextBuilder::new();
        builder
            .current_account_id(accounts(0))
            .predecessor_account_id(accounts(1))
            .block_timestamp(TODAY as u64 * DAY_NS);
        testing_env!(builder.build());
    }

    fn entry(day: EpochDay, completed: bool) -> HabitHistoryEntry {
        HabitHistoryEntry {
            date: date::format_date(day),
            completed,
            failed: false,
        }
    }

    fn habit_with_history(history: Vec<HabitHistoryEntry>) -> Habit {
        let mut habit = Habit::new(
            "Read".to_string(),
            HabitFrequency::Daily,
            "#10b981".to_string(),
            accounts(1),
        ).unwrap();
        habit.history = history;
        habit
    }

    fn completed_task(custom_points: Option<u32>) -> Task {
        let mut task = Task::new(
            "Task".to_string(),
            date::format_date(TODAY),
            false,
            custom_points,
            Some(Priority::Low),
            None,
            accounts(1),
        ).unwrap();
        task.completed = true;
        task
    }

    fn project_with_stages(stage_points: &[u32], completed: bool) -> Project {
        let mut project = Project::new(
            "Build".to_string(),
            String::new(),
            None,
            Priority::High,
            Vec::new(),
            accounts(1),
        ).unwrap();
        for &points in stage_points {
            let id = project.add_stage(format!("Stage {}", points), points, None, 20).unwrap();
            project.toggle_stage(&id, None).unwrap();
        }
        project.is_completed = completed;
        project
    }

    // === Scenario Coverage ===

    #[test]
    fn empty_inputs_score_zero() {
        let settings = ScoringSettings::default();
        let snapshot = recompute_scoring(&[], &[], &[], &[], &settings);
        assert_eq!(snapshot.total_points, 0);
        assert_eq!(snapshot.level, 1);
        assert_eq!(snapshot.next_level_percentage, 0);
        assert_eq!(snapshot.badge, BadgeRank::Bronze3);
    }

    #[test]
    fn habit_points_multiply_completed_entries() {
        setup();
        let settings = ScoringSettings::default();
        let history = (0..5).map(|back| entry(TODAY - back, true)).collect();
        let habit = habit_with_history(history);

        assert_eq!(habit_points(&[habit.clone()], &settings), 50);
        assert_eq!(current_streak(&habit.history, TODAY), 5);
    }

    #[test]
    fn custom_points_override_the_default() {
        setup();
        let settings = ScoringSettings::default();
        assert_eq!(task_points(&[completed_task(Some(25))], &settings), 25);
        assert_eq!(task_points(&[completed_task(None)], &settings), 5);
    }

    #[test]
    fn threshold_is_inclusive_floor_of_next_level() {
        let thresholds = ScoringSettings::default().level_thresholds;
        let progress = calculate_level(100, &thresholds);
        assert_eq!(progress.level, 2);
        assert_eq!(progress.next_level_percentage, 0);

        let below = calculate_level(99, &thresholds);
        assert_eq!(below.level, 1);
        assert_eq!(below.next_level_percentage, 99);
    }

    #[test]
    fn badge_flips_exactly_at_the_top_breakpoint() {
        assert_eq!(calculate_badge(7499), BadgeRank::Platinum);
        assert_eq!(calculate_badge(7500), BadgeRank::Ruby);
    }

    #[test]
    fn completed_project_earns_stage_points_plus_bonus() {
        setup();
        let settings = ScoringSettings::default();
        let project = project_with_stages(&[20, 30], true);

        assert_eq!(project_stage_points(&project, &settings), 50);
        assert_eq!(active_project_points(&[project], &settings), 60);
    }

    // === Aggregation Properties ===

    #[test]
    fn totals_never_decrease_when_work_completes() {
        setup();
        let settings = ScoringSettings::default();
        let mut tasks = vec![completed_task(None)];
        let before = total_points(&[], &tasks, &[], &[], &settings);

        tasks.push(completed_task(Some(1)));
        let after = total_points(&[], &tasks, &[], &[], &settings);
        assert!(after >= before);
    }

    #[test]
    fn aggregation_is_idempotent() {
        setup();
        let settings = ScoringSettings::default();
        let habits = [habit_with_history(vec![entry(TODAY, true)])];
        let tasks = [completed_task(Some(7))];

        let first = total_points(&habits, &tasks, &[], &[], &settings);
        let second = total_points(&habits, &tasks, &[], &[], &settings);
        assert_eq!(first, second);
    }

    #[test]
    fn penalty_applies_per_failed_task_and_clamps_at_zero() {
        setup();
        let settings = ScoringSettings::default();
        let mut failed = completed_task(None);
        failed.completed = false;
        failed.failed = true;

        // One failed task, nothing earned: clamped, not negative.
        assert_eq!(total_points(&[], &[failed.clone()], &[], &[], &settings), 0);

        // Earned points net the penalty.
        let tasks = [completed_task(None), failed];
        assert_eq!(total_points(&[], &tasks, &[], &[], &settings), 3);
    }

    #[test]
    fn failed_but_completed_task_still_pays_the_penalty() {
        setup();
        let settings = ScoringSettings::default();
        let mut task = completed_task(None);
        task.failed = true;
        assert_eq!(total_points(&[], &[task], &[], &[], &settings), 3);
    }

    #[test]
    fn archived_snapshots_are_summed_verbatim() {
        setup();
        let settings = ScoringSettings::default();
        let mut project = project_with_stages(&[20, 30], false);
        let record = project.complete(None, 60).unwrap();

        assert_eq!(completed_project_points(&[record]), 60);
        // The source project stays in the active list and now carries the
        // completion bonus as well.
        assert_eq!(active_project_points(&[project], &settings), 60);
    }

    #[test]
    fn snapshot_counts_todos_and_bonus() {
        setup();
        let settings = ScoringSettings::default();
        let mut project = project_with_stages(&[20, 30], false);
        let todo = project.add_todo("Wrap up".to_string()).unwrap();
        project.toggle_todo(&todo).unwrap();

        // Not yet completed: no bonus in the live value.
        assert_eq!(calculate_project_points(&project, &settings), 55);
        // At completion the bonus is always in.
        assert_eq!(completion_snapshot_points(&project, &settings), 65);
    }

    // === Level Calculation ===

    #[test]
    fn level_is_monotonic_in_points() {
        let thresholds = ScoringSettings::default().level_thresholds;
        let mut previous = 0;
        for points in [0, 50, 99, 100, 101, 249, 250, 999, 1000, 9999, 10000, 50000] {
            let level = calculate_level(points, &thresholds).level;
            assert!(level >= previous, "level dropped at {} points", points);
            previous = level;
        }
    }

    #[test]
    fn percentage_is_rounded_within_the_band() {
        // Level 1 band is [0, 100): 33 points is 33%.
        let progress = calculate_level(33, &[100, 250]);
        assert_eq!(progress.level, 1);
        assert_eq!(progress.next_level_percentage, 33);

        // Band [100, 250): 175 points is exactly half.
        let progress = calculate_level(175, &[100, 250]);
        assert_eq!(progress.level, 2);
        assert_eq!(progress.next_level_percentage, 50);
    }

    #[test]
    fn past_the_ladder_the_next_goal_doubles() {
        // Last threshold 200: next goal synthesized at 400.
        let progress = calculate_level(300, &[100, 200]);
        assert_eq!(progress.level, 3);
        assert_eq!(progress.next_level_percentage, 50);

        // Beyond even the synthesized goal the percentage pins at 100.
        let progress = calculate_level(900, &[100, 200]);
        assert_eq!(progress.level, 3);
        assert_eq!(progress.next_level_percentage, 100);
    }

    #[test]
    fn empty_ladder_degrades_to_level_one() {
        let progress = calculate_level(500, &[]);
        assert_eq!(progress, LevelProgress { level: 1, next_level_percentage: 0 });
    }

    // === Badge Classification ===

    #[test]
    fn every_breakpoint_flips_the_rank_exactly_once() {
        let boundaries = [
            (100, BadgeRank::Bronze3, BadgeRank::Bronze2),
            (250, BadgeRank::Bronze2, BadgeRank::Bronze1),
            (500, BadgeRank::Bronze1, BadgeRank::Silver3),
            (750, BadgeRank::Silver3, BadgeRank::Silver2),
            (1000, BadgeRank::Silver2, BadgeRank::Silver1),
            (1500, BadgeRank::Silver1, BadgeRank::Gold3),
            (2000, BadgeRank::Gold3, BadgeRank::Gold2),
            (3000, BadgeRank::Gold2, BadgeRank::Gold1),
            (4000, BadgeRank::Gold1, BadgeRank::Diamond),
            (5000, BadgeRank::Diamond, BadgeRank::Platinum),
            (7500, BadgeRank::Platinum, BadgeRank::Ruby),
        ];
        for (breakpoint, below, at) in boundaries {
            assert_eq!(calculate_badge(breakpoint - 1), below, "below {}", breakpoint);
            assert_eq!(calculate_badge(breakpoint), at, "at {}", breakpoint);
        }
    }

    #[test]
    fn badge_rank_serializes_to_lowercase_names() {
        assert_eq!(serde_json::to_string(&BadgeRank::Bronze3).unwrap(), r#""bronze3""#);
        assert_eq!(serde_json::to_string(&BadgeRank::Ruby).unwrap(), r#""ruby""#);
    }

    // === Streak Calculation ===

    #[test]
    fn streaks_on_empty_history_are_zero() {
        assert_eq!(current_streak(&[], TODAY), 0);
        assert_eq!(longest_streak(&[]), 0);
    }

    #[test]
    fn current_streak_requires_today_completed() {
        // Five completed days ending yesterday: no current streak.
        let history: Vec<_> = (1..=5).map(|back| entry(TODAY - back, true)).collect();
        assert_eq!(current_streak(&history, TODAY), 0);

        // Today tracked but not completed.
        let mut history = history;
        history.push(entry(TODAY, false));
        assert_eq!(current_streak(&history, TODAY), 0);
    }

    #[test]
    fn current_streak_breaks_on_unrecorded_days() {
        // Today and the day before yesterday, nothing between.
        let history = vec![entry(TODAY, true), entry(TODAY - 2, true)];
        assert_eq!(current_streak(&history, TODAY), 1);
    }

    #[test]
    fn breaking_a_run_shortens_the_current_streak() {
        let full: Vec<_> = (0..7).map(|back| entry(TODAY - back, true)).collect();
        assert_eq!(current_streak(&full, TODAY), 7);

        let mut broken = full;
        broken[3].completed = false;
        assert!(current_streak(&broken, TODAY) < 7);
        assert_eq!(current_streak(&broken, TODAY), 3);
    }

    #[test]
    fn longest_streak_resets_on_an_uncompleted_entry() {
        let history = vec![
            entry(TODAY - 5, true),
            entry(TODAY - 4, true),
            entry(TODAY - 3, false),
            entry(TODAY - 2, true),
            entry(TODAY - 1, true),
            entry(TODAY, true),
        ];
        assert_eq!(longest_streak(&history), 3);
    }

    #[test]
    fn longest_streak_spans_unrecorded_days() {
        // Entries on day 1, day 2 and day 10, all completed: the scan walks
        // entries rather than calendar days, so the unrecorded week does not
        // reset the run. The current streak does not share this behavior.
        let history = vec![entry(TODAY - 9, true), entry(TODAY - 8, true), entry(TODAY, true)];
        assert_eq!(longest_streak(&history), 3);
        assert_eq!(current_streak(&history, TODAY), 1);
    }

    #[test]
    fn longest_streak_ignores_insertion_order() {
        let history = vec![
            entry(TODAY, true),
            entry(TODAY - 2, true),
            entry(TODAY - 1, true),
            entry(TODAY - 3, false),
        ];
        assert_eq!(longest_streak(&history), 3);
    }

    #[test]
    fn duplicate_dates_resolve_to_the_first_inserted_entry() {
        let mut history = vec![entry(TODAY, true)];
        history.push(entry(TODAY, false));
        assert_eq!(current_streak(&history, TODAY), 1);
        assert_eq!(longest_streak(&history), 1);

        // And the other way round: an uncompleted first entry wins too.
        let history = vec![entry(TODAY, false), entry(TODAY, true)];
        assert_eq!(current_streak(&history, TODAY), 0);
        assert_eq!(longest_streak(&history), 0);
    }

    #[test]
    fn unparseable_dates_are_skipped() {
        let mut history = vec![entry(TODAY, true)];
        history.push(HabitHistoryEntry {
            date: "not-a-date".to_string(),
            completed: true,
            failed: false,
        });
        assert_eq!(current_streak(&history, TODAY), 1);
        assert_eq!(longest_streak(&history), 1);
    }

    // === Derived Stats ===

    #[test]
    fn habit_stats_count_day_kinds() {
        setup();
        let mut history = vec![entry(TODAY, true), entry(TODAY - 1, true), entry(TODAY - 2, false)];
        history[2].failed = true;
        history.push(entry(TODAY - 3, false));
        let habit = habit_with_history(history);

        let stats = habit_stats(&habit, TODAY);
        assert_eq!(stats.completed_days, 2);
        assert_eq!(stats.failed_days, 1);
        assert_eq!(stats.not_tracked_days, 1);
        assert_eq!(stats.completion_rate, 50);
        assert_eq!(stats.current_streak, 2);
        assert_eq!(stats.longest_streak, 2);
    }

    #[test]
    fn completion_rate_rounds_and_handles_empty() {
        setup();
        assert_eq!(completion_rate(&[]), 0);

        let mut tasks = vec![completed_task(None), completed_task(None)];
        tasks[1].completed = false;
        tasks.push({
            let mut open = completed_task(None);
            open.completed = false;
            open
        });
        // 1 of 3.
        assert_eq!(completion_rate(&tasks), 33);
    }

    #[test]
    fn project_statistics_prefer_stored_snapshots() {
        setup();
        let settings = ScoringSettings::default();
        let mut archived_source = project_with_stages(&[40], false);
        let record = archived_source.complete(None, 100).unwrap();
        let live = project_with_stages(&[20, 30], false);

        let stats = project_statistics(
            &[archived_source, live],
            &[record],
            &settings,
        );
        assert_eq!(stats.total_projects, 3);
        assert_eq!(stats.ongoing_projects, 2);
        assert_eq!(stats.completed_projects, 1);
        // 100 (stored on the completed source) + 50 (live) + 100 (archive).
        assert_eq!(stats.total_points, 250);
        // Progress 100 and 100 (both stages of the live project are done).
        assert_eq!(stats.average_completion, 100);
        assert_eq!(stats.average_duration_days, 0);
    }
}
