//! WPT operator console
//!
//! Drives a [`ScheduleSynchronizer`] over a SQLite database. Every command
//! prints the operation's JSON result; a failed operation exits with status 1.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use wpt_store::{ActivityId, NewWork, WorkId};
use wpt_sync::{OperationResult, ProgressEntry, ScheduleSynchronizer, SyncConfig, SyncError};

/// Printed output of one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub json: String,
    pub success: bool,
}

impl Outcome {
    fn from_result<T: Serialize>(result: &OperationResult<T>) -> Result<Self> {
        Ok(Self {
            json: serde_json::to_string_pretty(result).context("failed to render result")?,
            success: result.success,
        })
    }

    /// Process exit code
    #[inline]
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(!self.success)
    }
}

fn work_arg() -> Arg {
    Arg::new("work")
        .required(true)
        .value_parser(value_parser!(i64))
        .help("Work id")
}

fn input_arg(help: &'static str) -> Arg {
    Arg::new("input").required(true).help(help)
}

/// Console definition
#[must_use]
pub fn command() -> Command {
    Command::new("wpt")
        .version(wpt_sync::VERSION)
        .about("Works progress tracker: schedule/activity reconciliation console")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("SQLite database (overrides config)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("import-work")
                .about("Register a work, optionally with its schedule")
                .arg(
                    Arg::new("id")
                        .long("id")
                        .value_parser(value_parser!(i64))
                        .help("Explicit work id"),
                )
                .arg(Arg::new("name").long("name").required(true).help("Work name"))
                .arg(
                    Arg::new("schedule")
                        .long("schedule")
                        .help("Schedule JSON file, or - for stdin"),
                ),
        )
        .subcommand(
            Command::new("save")
                .about("Save a schedule document and rebuild activities")
                .arg(work_arg())
                .arg(input_arg("Schedule JSON file, or - for stdin")),
        )
        .subcommand(
            Command::new("show")
                .about("Print the reconciled schedule")
                .arg(work_arg()),
        )
        .subcommand(
            Command::new("activities")
                .about("List activities in display order")
                .arg(work_arg()),
        )
        .subcommand(
            Command::new("update")
                .about("Set one activity's progress")
                .arg(work_arg())
                .arg(
                    Arg::new("activity")
                        .required(true)
                        .value_parser(value_parser!(i64))
                        .help("Activity id"),
                )
                .arg(
                    Arg::new("percent")
                        .required(true)
                        .value_parser(value_parser!(f64))
                        .allow_negative_numbers(true)
                        .help("Progress percentage"),
                ),
        )
        .subcommand(
            Command::new("bulk-update")
                .about("Apply [{activityCode, progress}] updates")
                .arg(work_arg())
                .arg(input_arg("Updates JSON file, or - for stdin")),
        )
        .subcommand(
            Command::new("sync")
                .about("Rewrite the document from activity progress")
                .arg(work_arg()),
        )
        .subcommand(
            Command::new("init")
                .about("Derive activities for a work that has none")
                .arg(work_arg()),
        )
        .subcommand(
            Command::new("reinit")
                .about("Delete and re-derive a work's activities")
                .arg(work_arg()),
        )
        .subcommand(
            Command::new("reinit-all")
                .about("Initialize every work with a schedule")
                .arg(
                    Arg::new("force")
                        .long("force")
                        .action(ArgAction::SetTrue)
                        .help("Rebuild works that already have activities"),
                ),
        )
        .subcommand(
            Command::new("summary")
                .about("Progress roll-up")
                .arg(work_arg()),
        )
        .subcommand(
            Command::new("inspect")
                .about("Sync state and diverged tasks")
                .arg(work_arg()),
        )
}

/// Configuration from `--config`, with `--db` applied on top
///
/// # Errors
/// Unreadable or invalid configuration file.
pub fn load_config(matches: &ArgMatches) -> Result<SyncConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => SyncConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SyncConfig::default(),
    };
    if let Some(db) = matches.get_one::<PathBuf>("db") {
        config = config.with_database_path(db);
    }
    Ok(config)
}

fn read_input(source: &str) -> Result<String> {
    if source == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read stdin")?;
        Ok(buffer)
    } else {
        let path = Path::new(source);
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
    }
}

fn work_id(args: &ArgMatches) -> WorkId {
    WorkId(args.get_one::<i64>("work").copied().unwrap_or_default())
}

/// Run a parsed command
///
/// # Errors
/// Input that cannot be read or parsed. Operation failures are not errors;
/// they come back as an unsuccessful [`Outcome`].
pub async fn execute(matches: &ArgMatches, sync: &ScheduleSynchronizer) -> Result<Outcome> {
    let Some((name, args)) = matches.subcommand() else {
        anyhow::bail!("no command given");
    };
    tracing::debug!("Running {}", name);

    match name {
        "import-work" => import_work(args, sync).await,
        "save" => {
            let raw = read_input(input(args)?)?;
            Outcome::from_result(&sync.save_schedule(work_id(args), &raw).await)
        }
        "show" => Outcome::from_result(&sync.load_schedule(work_id(args)).await),
        "activities" => Outcome::from_result(&sync.list_activities(work_id(args)).await),
        "update" => {
            let activity = args.get_one::<i64>("activity").copied().unwrap_or_default();
            let percent = args.get_one::<f64>("percent").copied().unwrap_or_default();
            Outcome::from_result(
                &sync
                    .update_activity_progress(ActivityId(activity), percent, work_id(args))
                    .await,
            )
        }
        "bulk-update" => {
            let raw = read_input(input(args)?)?;
            let updates: Vec<ProgressEntry> =
                serde_json::from_str(&raw).context("updates must be [{activityCode, progress}]")?;
            Outcome::from_result(
                &sync
                    .bulk_update_activities_progress(work_id(args), &updates)
                    .await,
            )
        }
        "sync" => Outcome::from_result(&sync.sync_document_from_activities(work_id(args)).await),
        "init" => Outcome::from_result(
            &sync
                .initialize_activities_from_schedule(work_id(args))
                .await,
        ),
        "reinit" => Outcome::from_result(&sync.reinitialize_activities(work_id(args)).await),
        "reinit-all" => {
            let force = args.get_flag("force") || sync.config().force_reinit_all;
            Outcome::from_result(&sync.reinitialize_all(force).await)
        }
        "summary" => Outcome::from_result(&sync.progress_summary(work_id(args)).await),
        "inspect" => Outcome::from_result(&sync.inspect(work_id(args)).await),
        other => anyhow::bail!("unknown command {other}"),
    }
}

fn input(args: &ArgMatches) -> Result<&str> {
    args.get_one::<String>("input")
        .map(String::as_str)
        .context("missing input")
}

async fn import_work(args: &ArgMatches, sync: &ScheduleSynchronizer) -> Result<Outcome> {
    let name = args.get_one::<String>("name").context("missing --name")?;
    let mut work = NewWork::named(name.as_str());
    if let Some(id) = args.get_one::<i64>("id") {
        work = work.with_id(WorkId(*id));
    }

    let inserted = match sync.store().insert_work(work).await {
        Ok(record) => record,
        Err(e) => {
            let failed: OperationResult<()> = OperationResult::failed(&SyncError::from(e));
            return Outcome::from_result(&failed);
        }
    };
    tracing::info!("Registered work {} ({})", inserted.id, inserted.name);

    match args.get_one::<String>("schedule") {
        Some(source) => {
            let raw = read_input(source)?;
            Outcome::from_result(&sync.save_schedule(inserted.id, &raw).await)
        }
        None => Outcome::from_result(&OperationResult::ok(inserted)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::sync::Arc;
    use wpt_store::MemoryStore;
    use wpt_test_utils::SAMPLE_SCHEDULE;

    fn synchronizer() -> ScheduleSynchronizer {
        ScheduleSynchronizer::from_config(Arc::new(MemoryStore::new()), SyncConfig::default())
    }

    async fn run(sync: &ScheduleSynchronizer, argv: &[&str]) -> Outcome {
        let matches = command()
            .try_get_matches_from(std::iter::once("wpt").chain(argv.iter().copied()))
            .unwrap();
        execute(&matches, sync).await.unwrap()
    }

    fn parsed(outcome: &Outcome) -> Value {
        serde_json::from_str(&outcome.json).unwrap()
    }

    #[test]
    fn command_is_well_formed() {
        command().debug_assert();
    }

    #[test]
    fn db_flag_overrides_config() {
        let matches = command()
            .try_get_matches_from(["wpt", "--db", "/tmp/x.db", "show", "1"])
            .unwrap();
        let config = load_config(&matches).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn config_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wpt.toml");
        std::fs::write(&path, "force_reinit_all = true\n[cache]\nenabled = false\n").unwrap();

        let matches = command()
            .try_get_matches_from(["wpt", "--config", path.to_str().unwrap(), "reinit-all"])
            .unwrap();
        let config = load_config(&matches).unwrap();
        assert!(config.force_reinit_all);
        assert!(!config.cache.enabled);
    }

    #[tokio::test]
    async fn import_save_update_flow() {
        let dir = tempfile::tempdir().unwrap();
        let schedule = dir.path().join("schedule.json");
        std::fs::write(&schedule, SAMPLE_SCHEDULE).unwrap();
        let sync = synchronizer();

        let imported = run(
            &sync,
            &["import-work", "--id", "42", "--name", "Ring road", "--schedule", schedule.to_str().unwrap()],
        )
        .await;
        assert!(imported.success);
        assert_eq!(parsed(&imported)["data"]["task_count"], 4);

        let activities = run(&sync, &["activities", "42"]).await;
        let rows = parsed(&activities)["data"].as_array().cloned().unwrap();
        assert_eq!(rows.len(), 4);
        let id = rows[0]["id"].as_i64().unwrap().to_string();

        let updated = run(&sync, &["update", "42", &id, "55"]).await;
        assert!(updated.success);
        assert_eq!(updated.exit_code(), 0);

        let shown = run(&sync, &["show", "42"]).await;
        assert_eq!(parsed(&shown)["data"]["data"][0]["progress"], 0.55);
    }

    #[tokio::test]
    async fn bulk_update_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let updates = dir.path().join("updates.json");
        std::fs::write(
            &updates,
            r#"[{"activityCode":"2","progress":10},{"activityCode":"nope","progress":5}]"#,
        )
        .unwrap();
        let sync = synchronizer();
        sync.store()
            .insert_work(NewWork::named("Canal").with_id(WorkId(7)).with_schedule(SAMPLE_SCHEDULE))
            .await
            .unwrap();
        assert!(run(&sync, &["init", "7"]).await.success);

        let outcome = run(&sync, &["bulk-update", "7", updates.to_str().unwrap()]).await;
        let value = parsed(&outcome);
        assert_eq!(value["data"]["updated"], 1);
        assert_eq!(value["data"]["skipped"][0]["activity_code"], "nope");
    }

    #[tokio::test]
    async fn failures_exit_non_zero() {
        let sync = synchronizer();

        let outcome = run(&sync, &["show", "404"]).await;
        assert!(!outcome.success);
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(parsed(&outcome)["error_kind"], "NotFound");

        let outcome = run(&sync, &["update", "1", "1", "-5"]).await;
        assert_eq!(parsed(&outcome)["error_kind"], "Validation");
    }

    #[tokio::test]
    async fn duplicate_import_is_a_failed_outcome() {
        let sync = synchronizer();
        assert!(run(&sync, &["import-work", "--id", "1", "--name", "A"]).await.success);

        let again = run(&sync, &["import-work", "--id", "1", "--name", "B"]).await;
        assert!(!again.success);
        assert_eq!(parsed(&again)["error_kind"], "Persistence");
    }
}
