//! Demo candidate screens and dataset.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;

use vista_core::config::{
    ActionSpec, ActionVariant, Align, Breadcrumb, ColumnSpec, ColumnType, DetailViewConfig, EmptyState, FilterOption,
    FilterSpec, JourneyStep, LinkAction, ListViewConfig, MetricSpec, QueryDescriptor, SectionSpec, SortOrder,
    StatFormat, StatsCard,
};
use vista_core::{display_value, BoardRecord, ConfigError, Record, StatusConfig, StatusTable, EMPTY_DISPLAY};
use vista_engine::{ColumnMapping, InMemorySource};

pub const LIST_QUERY: &str = "candidates.list";
pub const GET_QUERY: &str = "candidates.getById";
pub const STATS_QUERY: &str = "candidates.stats";
pub const SUBMISSIONS_QUERY: &str = "candidates.submissions";
pub const STATUS_MUTATION: &str = "candidates.updateStatus";
pub const NAMESPACE: &str = "candidate";

const BASE_ROUTE: &str = "/recruiting/candidates";

// =============================================================================
// Record
// =============================================================================

/// A candidate as the list and detail screens see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub status: String,
    #[serde(default)]
    pub experience_years: Option<u32>,
    #[serde(default)]
    pub hourly_rate: Option<u32>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub is_on_hotlist: bool,
}

impl Candidate {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

impl Record for Candidate {
    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> Option<&str> {
        Some(&self.status)
    }

    fn field(&self, key: &str) -> Option<Value> {
        let value = match key {
            "id" => json!(self.id),
            "first_name" => json!(self.first_name),
            "last_name" => json!(self.last_name),
            "email" => json!(self.email),
            "title" => json!(self.title),
            "location" => json!(self.location),
            "status" => json!(self.status),
            "experience_years" => json!(self.experience_years),
            "hourly_rate" => json!(self.hourly_rate),
            "source" => json!(self.source),
            "is_on_hotlist" => json!(self.is_on_hotlist),
            _ => return None,
        };
        Some(value)
    }

    fn field_names() -> Option<&'static [&'static str]> {
        Some(&[
            "id",
            "first_name",
            "last_name",
            "email",
            "title",
            "location",
            "status",
            "experience_years",
            "hourly_rate",
            "source",
            "is_on_hotlist",
        ])
    }
}

impl BoardRecord for Candidate {
    fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }
}

// =============================================================================
// Configuration
// =============================================================================

pub fn status_table() -> StatusTable {
    StatusTable::new()
        .with("active", StatusConfig::new("Active", "green").with_icon("check-circle"))
        .with("screening", StatusConfig::new("Screening", "blue").with_icon("search"))
        .with("interviewing", StatusConfig::new("Interviewing", "purple").with_icon("calendar"))
        .with("placed", StatusConfig::new("Placed", "gold").with_icon("award"))
        .with("bench", StatusConfig::new("On Bench", "amber").with_icon("clock"))
        .with("inactive", StatusConfig::new("Inactive", "charcoal").with_icon("x-circle"))
}

fn rate(value: &Value) -> String {
    match value.as_u64() {
        Some(rate) => format!("${}/hr", rate),
        None => EMPTY_DISPLAY.to_string(),
    }
}

pub fn list_config(page_size: usize) -> Result<ListViewConfig<Candidate>, ConfigError> {
    ListViewConfig::builder("candidate")
        .title("Candidates")
        .description("Search and manage your candidate database")
        .icon("user")
        .base_route(BASE_ROUTE)
        .primary_action(LinkAction::new("Add Candidate", format!("{}/new", BASE_ROUTE)))
        .list_query(LIST_QUERY)
        .page_size(page_size)
        .stats_query(STATS_QUERY)
        .stats_card(StatsCard::new("total", "Total Candidates"))
        .stats_card(StatsCard::new("active", "Active").color("green"))
        .stats_card(StatsCard::new("placementRate", "Placement Rate").format(StatFormat::Percent))
        .filter(FilterSpec::search("search", "Candidates").with_placeholder("Search by name, email, title..."))
        .filter(FilterSpec::select("status", "Status", status_table().filter_options("All Status")))
        .filter(FilterSpec::select(
            "source",
            "Source",
            vec![
                FilterOption::new("all", "All Sources"),
                FilterOption::new("linkedin", "LinkedIn"),
                FilterOption::new("referral", "Referral"),
                FilterOption::new("job_board", "Job Board"),
            ],
        ))
        .filter(FilterSpec::toggle("is_on_hotlist", "Hotlist Only"))
        .column(
            ColumnSpec::new("last_name", "Name")
                .sortable()
                .render(|_, candidate: &Candidate| candidate.full_name()),
        )
        .column(ColumnSpec::new("title", "Title").sortable())
        .column(ColumnSpec::new("location", "Location").sortable())
        .column(ColumnSpec::new("status", "Status").of_type(ColumnType::Status).sortable())
        .column(
            ColumnSpec::new("experience_years", "Exp")
                .of_type(ColumnType::Number)
                .align(Align::Right)
                .sortable()
                .render(|value, _| match value.as_u64() {
                    Some(years) => format!("{} yrs", years),
                    None => EMPTY_DISPLAY.to_string(),
                }),
        )
        .column(
            ColumnSpec::new("hourly_rate", "Rate")
                .of_type(ColumnType::Currency)
                .align(Align::Right)
                .render(|value, _| rate(value)),
        )
        .column(
            ColumnSpec::new("is_on_hotlist", "Hotlist")
                .of_type(ColumnType::Boolean)
                .align(Align::Center)
                .render(|value, _| {
                    let mark = if value.as_bool() == Some(true) { "★" } else { EMPTY_DISPLAY };
                    mark.to_string()
                }),
        )
        .status_table(status_table())
        .default_sort("last_name", SortOrder::Asc)
        .empty_state(
            EmptyState::new("No candidates found")
                .unfiltered("Add your first candidate to start building your talent database")
                .action(LinkAction::new("Add Candidate", format!("{}/new", BASE_ROUTE))),
        )
        .quick_action(ActionSpec::navigate("view", "View", format!("{}/{{id}}", BASE_ROUTE)).variant(ActionVariant::Ghost))
        .quick_action(
            ActionSpec::open_dialog("submit-to-job", "Submit to Job", NAMESPACE, "submitToJob")
                .icon("briefcase")
                .visible_for_statuses(&["active", "bench"]),
        )
        .build()
}

pub fn detail_config() -> Result<DetailViewConfig<Candidate>, ConfigError> {
    DetailViewConfig::builder("candidate")
        .base_route(BASE_ROUTE)
        .event_namespace(NAMESPACE)
        .entity_query(GET_QUERY)
        .title_with(|candidate: &Candidate| {
            let name = candidate.full_name();
            if name.is_empty() {
                "Unknown Candidate".to_string()
            } else {
                name
            }
        })
        .status_table(status_table())
        .breadcrumb(Breadcrumb::new("Recruiting", "/recruiting"))
        .breadcrumb(Breadcrumb::new("Candidates", BASE_ROUTE))
        .subtitle_field(ColumnSpec::new("title", "Title"))
        .subtitle_field(ColumnSpec::new("location", "Location").icon("map-pin"))
        .subtitle_field(ColumnSpec::new("email", "Email").icon("mail"))
        .metric(
            MetricSpec::new("experience", "Years Exp", |c: &Candidate| json!(c.experience_years.unwrap_or(0)))
                .icon("briefcase")
                .tooltip("Years of experience"),
        )
        .metric(
            MetricSpec::new("rate", "Desired Rate", |c: &Candidate| json!(c.hourly_rate))
                .format(rate)
                .tooltip("Desired hourly rate"),
        )
        .metric(MetricSpec::new("hotlist", "Hotlist", |c: &Candidate| json!(c.is_on_hotlist)))
        .section(SectionSpec::new("overview", "Overview").icon("user"))
        .section(
            SectionSpec::new("submissions", "Submissions")
                .icon("send")
                .with_count()
                .component("submissions"),
        )
        .section(SectionSpec::new("activities", "Activities").icon("activity"))
        .default_section("overview")
        .journey_step(
            JourneyStep::new("sourced", "Sourced")
                .active_on(&["active"])
                .completed_on(&["screening", "interviewing", "placed", "bench"]),
        )
        .journey_step(
            JourneyStep::new("screening", "Screening")
                .active_on(&["screening"])
                .completed_on(&["interviewing", "placed", "bench"]),
        )
        .journey_step(
            JourneyStep::new("interviewing", "Interviewing")
                .active_on(&["interviewing"])
                .completed_on(&["placed", "bench"]),
        )
        .journey_step(JourneyStep::new("placed", "Placed").active_on(&["placed"]))
        .quick_action(
            ActionSpec::open_dialog("submit-to-job", "Submit to Job", NAMESPACE, "submitToJob")
                .icon("briefcase")
                .visible_for_statuses(&["active", "bench"]),
        )
        .quick_action(
            ActionSpec::open_dialog("add-to-hotlist", "Add to Hotlist", NAMESPACE, "addToHotlist")
                .icon("star")
                .variant(ActionVariant::Outline)
                .visible_when(|c: &Candidate| !c.is_on_hotlist),
        )
        .quick_action(
            ActionSpec::navigate("start-screening", "Start Screening", format!("{}/{{id}}/screening", BASE_ROUTE))
                .variant(ActionVariant::Outline)
                .visible_for_statuses(&["active"]),
        )
        .menu_action(ActionSpec::navigate("edit", "Edit Candidate", format!("{}/{{id}}/edit", BASE_ROUTE)))
        .menu_action(ActionSpec::open_dialog("log-activity", "Log Activity", NAMESPACE, "logActivity"))
        .menu_separator()
        .menu_action(
            ActionSpec::mutate("mark-inactive", "Mark as Inactive", STATUS_MUTATION)
                .with_param("status", json!("inactive"))
                .invalidating(&[LIST_QUERY, GET_QUERY])
                .variant(ActionVariant::Destructive)
                .visible_when(|c: &Candidate| c.status != "inactive"),
        )
        .related(
            "submissions",
            QueryDescriptor::new(SUBMISSIONS_QUERY).param("candidate_id", json!("{id}")),
        )
        .build()
}

/// Pipeline board over the candidate statuses.
pub fn board_mapping() -> Result<ColumnMapping, ConfigError> {
    ColumnMapping::builder()
        .column("sourced", "Sourced", &["active"])
        .color("green")
        .column("screening", "Screening", &["screening"])
        .color("blue")
        .column("interviewing", "Interviewing", &["interviewing"])
        .color("purple")
        .column("placed", "Placed", &["placed", "bench"])
        .color("gold")
        .fallback("sourced")
        .hidden(&["inactive"])
        .build()
}

// =============================================================================
// Data
// =============================================================================

/// Read candidates from a JSON array, or use the built-in set.
pub fn load_candidates(path: Option<&Path>) -> Result<Vec<Value>> {
    let Some(path) = path else {
        return Ok(sample_candidates());
    };
    let source = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let records: Vec<Value> = serde_json::from_str(&source).with_context(|| format!("parsing {}", path.display()))?;
    for (index, record) in records.iter().enumerate() {
        serde_json::from_value::<Candidate>(record.clone())
            .with_context(|| format!("record {} in {} is not a candidate", index, path.display()))?;
    }
    tracing::info!("Loaded {} candidates from {}", records.len(), path.display());
    Ok(records)
}

/// The data source the demo screens run against.
pub fn source(candidates: Vec<Value>) -> InMemorySource {
    let stats = stats(&candidates);
    let submissions = submissions(&candidates);
    InMemorySource::new()
        .with_collection("candidates", candidates)
        .with_collection("submissions", submissions)
        .list_route(LIST_QUERY, "candidates", &["first_name", "last_name", "email", "title"])
        .get_route(GET_QUERY, "candidates")
        .where_route(SUBMISSIONS_QUERY, "submissions", "candidate_id")
        .value_route(STATS_QUERY, stats)
        .status_route(STATUS_MUTATION, "candidates")
}

fn stats(candidates: &[Value]) -> Value {
    let count = |status: &str| {
        candidates
            .iter()
            .filter(|c| c.get("status").and_then(Value::as_str) == Some(status))
            .count()
    };
    let total = candidates.len();
    let placed = count("placed");
    let placement_rate = if total == 0 { 0 } else { placed * 100 / total };
    json!({
        "total": total,
        "active": count("active"),
        "placementRate": placement_rate,
    })
}

fn submissions(candidates: &[Value]) -> Vec<Value> {
    candidates
        .iter()
        .filter(|c| {
            matches!(
                c.get("status").and_then(Value::as_str),
                Some("interviewing" | "placed")
            )
        })
        .enumerate()
        .map(|(i, c)| {
            json!({
                "id": format!("s{}", i + 1),
                "candidate_id": c.get("id").cloned().unwrap_or(Value::Null),
                "job": display_value(c.get("title").unwrap_or(&Value::Null)),
            })
        })
        .collect()
}

fn sample_candidates() -> Vec<Value> {
    let rows = [
        ("c01", "Ada", "Lovelace", "Staff Engineer", "London", "active", 12, 140, "referral", true),
        ("c02", "Grace", "Hopper", "Compiler Engineer", "Arlington", "interviewing", 20, 160, "linkedin", false),
        ("c03", "Alan", "Turing", "Research Scientist", "Manchester", "screening", 8, 120, "job_board", false),
        ("c04", "Katherine", "Johnson", "Data Analyst", "Hampton", "placed", 15, 110, "referral", false),
        ("c05", "Edsger", "Dijkstra", "Backend Engineer", "Austin", "bench", 18, 130, "linkedin", true),
        ("c06", "Barbara", "Liskov", "Architect", "Boston", "active", 22, 175, "linkedin", false),
        ("c07", "Ken", "Thompson", "Systems Engineer", "Berkeley", "inactive", 25, 150, "job_board", false),
        ("c08", "Margaret", "Hamilton", "Engineering Manager", "Cambridge", "active", 16, 165, "referral", false),
        ("c09", "Dennis", "Ritchie", "Platform Engineer", "Murray Hill", "interviewing", 19, 145, "job_board", false),
        ("c10", "Frances", "Allen", "Performance Engineer", "Peru", "active", 14, 135, "linkedin", true),
    ];
    rows.iter()
        .map(|(id, first, last, title, location, status, years, rate, source, hot)| {
            json!({
                "id": id,
                "first_name": first,
                "last_name": last,
                "email": format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase()),
                "title": title,
                "location": location,
                "status": status,
                "experience_years": years,
                "hourly_rate": rate,
                "source": source,
                "is_on_hotlist": hot,
            })
        })
        .collect()
}
