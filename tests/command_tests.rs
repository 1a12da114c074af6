use taskplan::commands::*;
use taskplan::config::{Config, Theme};
use taskplan::models::{Priority, TaskKind};
use taskplan::storage::{load_task, load_tasks};
use chrono::NaiveDate;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

// Use a mutex to ensure tests run serially since they modify the environment variable
static TEST_MUTEX: Mutex<()> = Mutex::new(());

fn with_test_db<F>(test_name: &str, f: F)
where
    F: FnOnce(PathBuf),
{
    let _guard = TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());

    let mut db_path = env::temp_dir();
    db_path.push(format!("taskplan_test_{}.json", test_name));
    let mut config_path = env::temp_dir();
    config_path.push(format!("taskplan_test_{}_config.json", test_name));

    // Set env vars
    env::set_var("TASKS_DB", db_path.to_str().unwrap());
    env::set_var("TASKPLAN_CONFIG", config_path.to_str().unwrap());

    // Clean up before test
    for p in [&db_path, &config_path] {
        if p.exists() {
            fs::remove_file(p).unwrap();
        }
    }

    // Run test
    f(db_path.clone());

    // Clean up after test
    for p in [&db_path, &config_path] {
        if p.exists() {
            fs::remove_file(p).unwrap();
        }
    }
    env::remove_var("TASKS_DB");
    env::remove_var("TASKPLAN_CONFIG");
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn new_task(title: &str, start: &str) -> NewTask {
    NewTask {
        title: title.into(),
        start: Some(start.into()),
        ..Default::default()
    }
}

#[test]
fn test_add_and_list() {
    with_test_db("add_list", |_path| {
        let input = NewTask {
            time: Some("09:30".into()),
            priority: Some("high".into()),
            subtasks: vec!["Bring card".into(), " ".into()],
            ..new_task("Dentist", "2025-03-04")
        };
        let ids = cmd_add(input, RecurrenceArgs::default(), &Config::default(), true).unwrap();
        assert_eq!(ids, vec![1]);

        let tasks = load_tasks();
        assert_eq!(tasks.len(), 1);
        let t = &tasks[0];
        assert_eq!(t.title, "Dentist");
        assert_eq!(t.kind, TaskKind::Daily);
        assert_eq!(t.start, date(2025, 3, 4));
        assert_eq!(t.end, t.start);
        assert_eq!(t.priority, Priority::High);
        assert_eq!(t.subtasks.len(), 1);
        assert!(t.group_id.is_none());
    });
}

#[test]
fn test_add_weekly_and_custom() {
    with_test_db("add_kinds", |_path| {
        let weekly = NewTask { kind: Some("weekly".into()), ..new_task("Sprint", "2025-03-05") };
        cmd_add(weekly, RecurrenceArgs::default(), &Config::default(), true).unwrap();
        let custom = NewTask { end: Some("2025-03-12".into()), ..new_task("Trip", "2025-03-08") };
        cmd_add(custom, RecurrenceArgs::default(), &Config::default(), true).unwrap();

        let sprint = load_task(1).unwrap();
        assert_eq!((sprint.start, sprint.end), (date(2025, 3, 3), date(2025, 3, 9)));
        let trip = load_task(2).unwrap();
        assert_eq!(trip.kind, TaskKind::Custom);
        assert_eq!(trip.duration_days(), 5);
    });
}

#[test]
fn test_add_rejects_bad_input() {
    with_test_db("add_invalid", |_path| {
        let backwards = NewTask { end: Some("2025-03-01".into()), ..new_task("Backwards", "2025-03-08") };
        assert!(cmd_add(backwards, RecurrenceArgs::default(), &Config::default(), true).is_none());

        let bad_color = NewTask { color: Some("blue".into()), ..new_task("Colored", "2025-03-08") };
        assert!(cmd_add(bad_color, RecurrenceArgs::default(), &Config::default(), true).is_none());

        let blank = new_task("   ", "2025-03-08");
        assert!(cmd_add(blank, RecurrenceArgs::default(), &Config::default(), true).is_none());

        assert!(load_tasks().is_empty());
    });
}

#[test]
fn test_add_recurring_series() {
    with_test_db("add_series", |_path| {
        let recur = RecurrenceArgs {
            freq: Some("weekly".into()),
            weekdays: Some("MO,WE".into()),
            count: Some(4),
            ..Default::default()
        };
        let input = NewTask { color: Some("5".into()), ..new_task("Gym", "2024-01-01") };
        let ids = cmd_add(input, recur, &Config::default(), true).unwrap();
        assert_eq!(ids, vec![1, 2, 3, 4]);

        let tasks = load_tasks();
        let starts: Vec<NaiveDate> = tasks.iter().map(|t| t.start).collect();
        assert_eq!(starts, vec![date(2024, 1, 1), date(2024, 1, 3), date(2024, 1, 8), date(2024, 1, 10)]);
        let group = tasks[0].group_id.clone();
        assert!(group.is_some());
        assert!(tasks.iter().all(|t| t.group_id == group));
        assert!(tasks.iter().all(|t| t.title == "Gym" && t.color == "#d32f2f"));
    });
}

#[test]
fn test_invalid_recurrence_adds_nothing() {
    with_test_db("add_series_invalid", |_path| {
        let zero_interval = RecurrenceArgs {
            freq: Some("daily".into()),
            interval: Some(0),
            count: Some(3),
            ..Default::default()
        };
        assert!(cmd_add(new_task("Nope", "2025-01-01"), zero_interval, &Config::default(), true).is_none());

        let ends_early = RecurrenceArgs {
            freq: Some("daily".into()),
            until: Some("2024-12-31".into()),
            ..Default::default()
        };
        assert!(cmd_add(new_task("Nope", "2025-01-01"), ends_early, &Config::default(), true).is_none());

        let no_end = RecurrenceArgs { freq: Some("daily".into()), ..Default::default() };
        assert!(cmd_add(new_task("Nope", "2025-01-01"), no_end, &Config::default(), true).is_none());

        assert!(load_tasks().is_empty());
    });
}

#[test]
fn test_series_respects_configured_limit() {
    with_test_db("series_limit", |_path| {
        let mut config = Config::default();
        assert!(cmd_config_set(&mut config, "max-occurrences", "3", true));
        let recur = RecurrenceArgs {
            freq: Some("daily".into()),
            until: Some("2025-12-31".into()),
            ..Default::default()
        };
        let ids = cmd_add(new_task("Water plants", "2025-01-01"), recur, &config, true).unwrap();
        assert_eq!(ids.len(), 3);
    });
}

#[test]
fn test_toggle_task() {
    with_test_db("toggle", |_path| {
        cmd_add(new_task("Task to complete", "2025-12-01"), RecurrenceArgs::default(), &Config::default(), true);

        assert_eq!(cmd_toggle(1, true), Some(true));
        assert!(load_task(1).unwrap().completed);
        assert_eq!(cmd_toggle(1, true), Some(false));
        assert!(!load_task(1).unwrap().completed);
        assert_eq!(cmd_toggle(99, true), None);
    });
}

#[test]
fn test_remove_task_and_series() {
    with_test_db("remove", |_path| {
        let recur = RecurrenceArgs {
            freq: Some("monthly".into()),
            month_days: Some("15".into()),
            count: Some(3),
            ..Default::default()
        };
        cmd_add(new_task("Rent", "2025-01-01"), recur, &Config::default(), true).unwrap();
        cmd_add(new_task("Standalone", "2025-01-02"), RecurrenceArgs::default(), &Config::default(), true).unwrap();
        assert_eq!(load_tasks().len(), 4);

        // A single occurrence goes alone.
        assert!(cmd_remove(2, false, true));
        assert_eq!(load_tasks().len(), 3);

        // The rest of the series goes together.
        assert!(cmd_remove(1, true, true));
        let tasks = load_tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Standalone");

        assert!(!cmd_remove(42, false, true));
    });
}

#[test]
fn test_edit_task() {
    with_test_db("edit", |_path| {
        let input = NewTask { end: Some("2025-03-12".into()), ..new_task("Trip", "2025-03-08") };
        cmd_add(input, RecurrenceArgs::default(), &Config::default(), true).unwrap();

        let edit = TaskEdit {
            title: Some("Holiday".into()),
            start: Some("2025-04-01".into()),
            time: Some("18:00".into()),
            priority: Some("low".into()),
            ..Default::default()
        };
        assert!(cmd_edit(1, edit, &Config::default(), true));

        let t = load_task(1).unwrap();
        assert_eq!(t.title, "Holiday");
        assert_eq!((t.start, t.end), (date(2025, 4, 1), date(2025, 4, 5)));
        assert_eq!(t.priority, Priority::Low);
        assert!(t.time.is_some());

        // Invalid edits leave the task untouched.
        let bad = TaskEdit { end: Some("2025-01-01".into()), ..Default::default() };
        assert!(!cmd_edit(1, bad, &Config::default(), true));
        assert_eq!(load_task(1).unwrap().end, date(2025, 4, 5));

        let clear = TaskEdit { time: Some(String::new()), ..Default::default() };
        assert!(cmd_edit(1, clear, &Config::default(), true));
        assert!(load_task(1).unwrap().time.is_none());
    });
}

#[test]
fn test_subtasks() {
    with_test_db("subtasks", |_path| {
        cmd_add(new_task("Move house", "2025-05-01"), RecurrenceArgs::default(), &Config::default(), true).unwrap();

        assert!(cmd_subtask_add(1, "Boxes".into(), true));
        assert!(cmd_subtask_add(1, "Van".into(), true));
        assert!(!cmd_subtask_add(1, "  ".into(), true));
        assert!(cmd_subtask_toggle(1, 2, true));
        assert_eq!(load_task(1).unwrap().subtask_progress(), (1, 2));

        assert!(!cmd_subtask_toggle(1, 0, true));
        assert!(!cmd_subtask_remove(1, 3, true));
        assert!(cmd_subtask_remove(1, 1, true));
        let t = load_task(1).unwrap();
        assert_eq!(t.subtasks.len(), 1);
        assert_eq!(t.subtasks[0].title, "Van");
        assert!(t.subtasks[0].completed);
    });
}

#[test]
fn test_config_set_and_reload() {
    with_test_db("config", |_path| {
        let mut config = Config::load();
        assert_eq!(config, Config::default());

        assert!(cmd_config_set(&mut config, "theme", "dark", true));
        assert!(cmd_config_set(&mut config, "color", "#2E7D32", true));
        assert!(!cmd_config_set(&mut config, "color", "green", true));
        assert!(!cmd_config_set(&mut config, "font", "mono", true));

        let reloaded = Config::load();
        assert_eq!(reloaded.theme, Theme::Dark);
        assert_eq!(reloaded.default_color, "#2e7d32");
        assert_eq!(reloaded.resolve_color(None).unwrap(), "#2e7d32");
        assert_eq!(reloaded.resolve_color(Some("1")).unwrap(), "#1976d2");
        assert!(reloaded.resolve_color(Some("9")).is_err());
    });
}

#[test]
fn test_reset() {
    with_test_db("reset", |path| {
        cmd_add(new_task("Temporary", "2025-01-01"), RecurrenceArgs::default(), &Config::default(), true).unwrap();
        assert!(path.exists());

        cmd_reset(true);
        assert!(load_tasks().is_empty());
    });
}

#[test]
fn test_weekly_task_with_daily_rule_adds_nothing() {
    with_test_db("weekly_daily_rule", |_path| {
        let recur = RecurrenceArgs {
            freq: Some("daily".into()),
            count: Some(3),
            ..Default::default()
        };
        let input = NewTask { kind: Some("weekly".into()), ..new_task("Sprint", "2025-03-03") };
        assert!(plan_tasks(&input, &recur, &Config::default()).is_err());
        assert!(cmd_add(input, recur, &Config::default(), true).is_none());
        assert!(load_tasks().is_empty());
    });
}

#[test]
fn test_corrupt_database_is_not_overwritten() {
    with_test_db("corrupt", |path| {
        let broken = r#"[{"id":1,"title":"keep me","start":"2025-01-01","end":"2025-01-01"}, BROKEN"#;
        fs::write(&path, broken).unwrap();

        assert!(cmd_add(new_task("new", "2025-01-02"), RecurrenceArgs::default(), &Config::default(), true).is_none());
        assert!(!cmd_remove(1, false, true));
        assert_eq!(fs::read_to_string(&path).unwrap(), broken);
        assert!(taskplan::storage::try_load_tasks().is_err());
    });
}

#[test]
fn test_list_filters_and_counts() {
    with_test_db("list_filter", |_path| {
        let trip = NewTask { end: Some("2025-03-12".into()), ..new_task("Trip", "2025-03-08") };
        cmd_add(trip, RecurrenceArgs::default(), &Config::default(), true).unwrap();
        cmd_add(new_task("Dentist", "2025-03-10"), RecurrenceArgs::default(), &Config::default(), true).unwrap();
        cmd_add(new_task("Groceries", "2025-03-20"), RecurrenceArgs::default(), &Config::default(), true).unwrap();
        cmd_toggle(2, true);

        let tasks = load_tasks();
        assert_eq!(status_counts(&tasks), (2, 1));

        let titles = |filter, day| -> Vec<String> {
            select_tasks(&tasks, filter, day).into_iter().map(|t| t.title).collect()
        };
        assert_eq!(titles(StatusFilter::Pending, None), vec!["Trip", "Groceries"]);
        assert_eq!(titles(StatusFilter::Done, None), vec!["Dentist"]);
        assert_eq!(titles(StatusFilter::All, None), vec!["Trip", "Dentist", "Groceries"]);
        assert_eq!(titles(StatusFilter::All, Some(date(2025, 3, 10))), vec!["Trip", "Dentist"]);
        assert_eq!(titles(StatusFilter::Pending, Some(date(2025, 3, 10))), vec!["Trip"]);

        // Printing does not touch the stored tasks.
        cmd_list(StatusFilter::Done, Some("2025-03-10".into()));
        assert_eq!(load_tasks().len(), 3);
    });
}
