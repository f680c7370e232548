//! Duty-roster CLI - the operator front end for the scheduling engine.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::Level;

use dutyroster_core::{
    Candidate, CourseEntry, RosterItem, RuleCode, RuleToggle, Semester, SemesterId, TimeSlot,
    UnavailableEntry, UserId,
};
use dutyroster_engine::{DraftItemPatch, RosterService};
use dutyroster_storage::{JsonStorage, Storage};

#[derive(Parser)]
#[command(name = "dutyroster")]
#[command(about = "Student-union duty scheduling", long_about = None)]
struct Cli {
    /// Storage directory
    #[arg(long, default_value = ".dutyroster")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load semesters, slots, timetables, the duty pool and rule toggles
    /// from a JSON fixture
    Seed {
        /// Fixture file
        file: PathBuf,
    },
    /// List the rule inventory and toggle state
    Rules,
    /// Enable or disable a configurable rule
    SetRule {
        /// Rule code (R1..R6)
        code: String,
        /// "on" or "off"
        state: String,
    },
    /// Run the scheduler and install a new draft roster
    Generate {
        /// Semester ID
        #[arg(long)]
        semester: String,
        /// Operator user ID
        #[arg(long)]
        operator: String,
    },
    /// Show the semester's active roster
    Show {
        /// Semester ID
        #[arg(long)]
        semester: String,
    },
    /// Show one member's shifts
    My {
        /// Semester ID
        #[arg(long)]
        semester: String,
        /// Member user ID
        #[arg(long)]
        user: String,
    },
    /// Publish a draft or needs-regeneration roster
    Publish {
        /// Roster ID
        #[arg(long)]
        roster: String,
        /// Operator user ID
        #[arg(long)]
        operator: String,
    },
    /// Edit a line item while the roster is a draft
    EditItem {
        /// Item ID
        #[arg(long)]
        item: String,
        /// New member user ID
        #[arg(long)]
        member: Option<String>,
        /// New location ID
        #[arg(long)]
        location: Option<String>,
        /// Operator user ID
        #[arg(long)]
        operator: String,
    },
    /// List every eligible candidate's availability for one item
    Candidates {
        /// Item ID
        #[arg(long)]
        item: String,
    },
    /// Check one candidate against one item
    Validate {
        /// Item ID
        #[arg(long)]
        item: String,
        /// Candidate user ID
        #[arg(long)]
        candidate: String,
    },
    /// Reassign a published item (audited)
    Override {
        /// Item ID
        #[arg(long)]
        item: String,
        /// Replacement member user ID
        #[arg(long)]
        member: String,
        /// Justification, recorded in the change log
        #[arg(long)]
        reason: String,
        /// Operator user ID
        #[arg(long)]
        operator: String,
    },
    /// Page through a roster's override audit trail
    Changelog {
        /// Roster ID
        #[arg(long)]
        roster: String,
        /// 1-based page
        #[arg(long, default_value = "1")]
        page: usize,
        /// Page size
        #[arg(long, default_value = "20")]
        page_size: usize,
    },
    /// Compare the live pool against the roster's snapshot
    CheckScope {
        /// Roster ID
        #[arg(long)]
        roster: String,
    },
}

/// Fixture format accepted by `seed`.
#[derive(Deserialize)]
struct SeedFile {
    #[serde(default)]
    semesters: Vec<Semester>,
    #[serde(default)]
    time_slots: Vec<TimeSlot>,
    #[serde(default)]
    courses: Vec<CourseEntry>,
    #[serde(default)]
    unavailable: Vec<UnavailableEntry>,
    #[serde(default)]
    pool: Vec<PoolMember>,
    #[serde(default)]
    rules: Vec<RuleToggle>,
}

#[derive(Deserialize)]
struct PoolMember {
    semester_id: SemesterId,
    #[serde(flatten)]
    candidate: Candidate,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    let storage = Arc::new(Mutex::new(JsonStorage::new(&cli.data_dir).await?));
    let service = RosterService::with_shared(storage.clone());

    match cli.command {
        Commands::Seed { file } => {
            let json = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let seed: SeedFile = serde_json::from_str(&json)?;

            let mut storage = storage.lock().await;
            for semester in &seed.semesters {
                storage.save_semester(semester).await?;
            }
            for slot in &seed.time_slots {
                storage.save_time_slot(slot).await?;
            }
            for course in &seed.courses {
                storage.save_course(course).await?;
            }
            for entry in &seed.unavailable {
                storage.save_unavailable(entry).await?;
            }
            for member in &seed.pool {
                storage.save_candidate(member.semester_id, &member.candidate).await?;
            }
            for toggle in &seed.rules {
                storage.save_rule_toggle(toggle).await?;
            }
            println!(
                "seeded {} semesters, {} slots, {} courses, {} unavailable, {} pool members",
                seed.semesters.len(),
                seed.time_slots.len(),
                seed.courses.len(),
                seed.unavailable.len(),
                seed.pool.len(),
            );
        }

        Commands::Rules => {
            for toggle in service.rule_toggles().await? {
                let state = if toggle.enabled { "on" } else { "off" };
                let lock = if toggle.code.configurable() { "" } else { " (always enforced)" };
                println!(
                    "{}  {:<3}  {}{}",
                    toggle.code,
                    state,
                    toggle.code.describe(),
                    lock,
                );
            }
        }

        Commands::SetRule { code, state } => {
            let code: RuleCode = code.parse()?;
            let enabled = match state.as_str() {
                "on" => true,
                "off" => false,
                other => return Err(anyhow!("expected \"on\" or \"off\", got {other:?}")),
            };
            let toggle = service.set_rule_enabled(code, enabled).await?;
            println!("{} is now {}", toggle.code, if toggle.enabled { "on" } else { "off" });
        }

        Commands::Generate { semester, operator } => {
            let outcome = service
                .generate(parse_id(&semester)?, parse_id(&operator)?)
                .await?;
            println!(
                "roster {} (draft): {}/{} slots filled",
                outcome.roster.id, outcome.filled_slots, outcome.total_slots,
            );
            for warning in &outcome.warnings {
                println!("warning: {warning}");
            }
        }

        Commands::Show { semester } => {
            let view = service.roster_for_semester(parse_id(&semester)?).await?;
            println!(
                "roster {}  status={}  version={}",
                view.roster.id, view.roster.status, view.roster.version,
            );
            if let Some(published_at) = view.roster.published_at {
                println!("published at {published_at}");
            }
            let names = member_names(&storage, view.roster.semester_id).await?;
            for item in &view.items {
                println!("{}", render_item(&storage, item, &names).await?);
            }
        }

        Commands::My { semester, user } => {
            let items = service
                .personal_assignments(parse_id(&semester)?, parse_id(&user)?)
                .await?;
            if items.is_empty() {
                println!("no shifts assigned");
            }
            for item in &items {
                println!("{}", render_item(&storage, item, &HashMap::new()).await?);
            }
        }

        Commands::Publish { roster, operator } => {
            let published = service
                .publish(parse_id(&roster)?, parse_id(&operator)?)
                .await?;
            println!("roster {} published", published.id);
        }

        Commands::EditItem { item, member, location, operator } => {
            let patch = DraftItemPatch {
                member_id: member.as_deref().map(parse_id).transpose()?,
                location_id: location.as_deref().map(parse_id).transpose()?,
            };
            let updated = service
                .update_draft_item(parse_id(&item)?, patch, parse_id(&operator)?)
                .await?;
            println!("item {} updated (version {})", updated.id, updated.version);
        }

        Commands::Candidates { item } => {
            for row in service.list_candidates(parse_id(&item)?).await? {
                if row.available {
                    println!("{}  {}  available", row.candidate.user_id, row.candidate.name);
                } else {
                    println!(
                        "{}  {}  unavailable: {}",
                        row.candidate.user_id,
                        row.candidate.name,
                        row.conflicts.join("; "),
                    );
                }
            }
        }

        Commands::Validate { item, candidate } => {
            let verdict = service
                .validate_candidate(parse_id(&item)?, parse_id(&candidate)?)
                .await?;
            if verdict.valid {
                println!("valid");
            } else {
                println!("invalid: {}", verdict.conflicts.join("; "));
            }
        }

        Commands::Override { item, member, reason, operator } => {
            let updated = service
                .override_published_item(
                    parse_id(&item)?,
                    parse_id(&member)?,
                    reason,
                    parse_id(&operator)?,
                )
                .await?;
            println!("item {} reassigned to {}", updated.id, updated.member_id);
        }

        Commands::Changelog { roster, page, page_size } => {
            let (entries, total) = service
                .change_log(parse_id(&roster)?, page, page_size)
                .await?;
            println!("{total} entries");
            for entry in entries {
                println!(
                    "{}  {} -> {}  by {}  \"{}\"",
                    entry.created_at,
                    entry.original_member_id,
                    entry.new_member_id,
                    entry.operator_id,
                    entry.reason,
                );
            }
        }

        Commands::CheckScope { roster } => {
            let drift = service.check_scope(parse_id(&roster)?).await?;
            if !drift.changed {
                println!("pool unchanged since generation");
            } else {
                println!("pool drifted, roster flagged for regeneration");
                for name in &drift.added_names {
                    println!("added: {name}");
                }
                for id in &drift.removed_ids {
                    println!("removed: {id}");
                }
            }
        }
    }

    Ok(())
}

fn parse_id<T>(s: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    s.parse().map_err(|e| anyhow!("invalid id {s:?}: {e}"))
}

async fn member_names(
    storage: &Arc<Mutex<JsonStorage>>,
    semester_id: SemesterId,
) -> Result<HashMap<UserId, String>> {
    let pool = storage.lock().await.list_duty_pool(semester_id).await?;
    Ok(pool.into_iter().map(|c| (c.user_id, c.name)).collect())
}

async fn render_item(
    storage: &Arc<Mutex<JsonStorage>>,
    item: &RosterItem,
    names: &HashMap<UserId, String>,
) -> Result<String> {
    let slot = storage.lock().await.load_time_slot(item.time_slot_id).await?;
    let member = names
        .get(&item.member_id)
        .cloned()
        .unwrap_or_else(|| item.member_id.to_string());
    let line = match slot {
        Some(slot) => format!(
            "{}  week {}  {} {}-{}  {}  {}",
            item.id,
            item.week.as_u8(),
            slot.day_of_week,
            slot.start.format("%H:%M"),
            slot.end.format("%H:%M"),
            slot.name,
            member,
        ),
        None => format!("{}  week {}  (slot removed)  {}", item.id, item.week.as_u8(), member),
    };
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dutyroster_core::{RosterId, RosterItemId};

    #[test]
    fn seed_file_accepts_partial_fixtures() {
        let seed: SeedFile = serde_json::from_str(r#"{"semesters": []}"#).unwrap();
        assert!(seed.semesters.is_empty());
        assert!(seed.rules.is_empty());
    }

    #[test]
    fn pool_member_flattens_candidate() {
        let json = format!(
            r#"{{
                "semester_id": "{}",
                "user_id": "{}",
                "name": "user-1",
                "department_id": "{}",
                "submitted": true
            }}"#,
            SemesterId::new(),
            UserId::new(),
            dutyroster_core::DepartmentId::new(),
        );
        let member: PoolMember = serde_json::from_str(&json).unwrap();
        assert_eq!(member.candidate.name, "user-1");
        assert!(member.candidate.submitted);
    }

    #[test]
    fn parse_id_rejects_garbage() {
        assert!(parse_id::<RosterId>("not-an-id").is_err());
        let id = RosterItemId::new();
        let parsed: RosterItemId = parse_id(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
    }
}
