//! Recurring report schedules.
//!
//! Schedules are kept on an in-memory board and mirrored to the source
//! service so they survive restarts. All next-run arithmetic is
//! phase-preserving: a late or missed run advances from the previous
//! `next_run`, not from the wall clock, so a 09:00 schedule stays a 09:00
//! schedule no matter how late the runner fires.
//!
//! Calendar frequencies are evaluated in the schedule's own timezone.
//! A wall time erased by a DST gap resolves to the next valid local time
//! and an ambiguous wall time takes its earlier occurrence.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{
    DateTime, Duration, LocalResult, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    Timelike, Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cqrd_source::types::ScheduleRecord;
use cqrd_source::SourceClient;

use crate::error::ReportError;

/// How often a scheduled report runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Hourly => "hourly",
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "hourly" => Ok(Frequency::Hourly),
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            other => Err(format!("unknown frequency '{other}'")),
        }
    }
}

/// One recurring report schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSchedule {
    pub id: Uuid,
    pub template_id: String,
    pub frequency: Frequency,
    pub time_of_day: NaiveTime,
    pub timezone: Tz,
    pub recipients: Vec<String>,
    pub enabled: bool,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: DateTime<Utc>,
}

impl ReportSchedule {
    /// The wire shape sent to `PUT /v1/schedules/{id}`.
    #[must_use]
    pub fn to_record(&self) -> ScheduleRecord {
        ScheduleRecord {
            id: self.id,
            template_id: self.template_id.clone(),
            frequency: self.frequency.as_str().to_owned(),
            time_of_day: self.time_of_day.format("%H:%M:%S").to_string(),
            timezone: self.timezone.name().to_owned(),
            recipients: self.recipients.clone(),
            enabled: self.enabled,
            last_run: self.last_run,
            next_run: Some(self.next_run),
        }
    }

    /// Rebuilds a schedule from its persisted record.
    ///
    /// A record without a stored `next_run` gets one computed from `now`.
    ///
    /// # Errors
    ///
    /// [`ReportError::InvalidSchedule`] when the frequency, time of day, or
    /// timezone does not parse.
    pub fn from_record(record: ScheduleRecord, now: DateTime<Utc>) -> Result<Self, ReportError> {
        let frequency: Frequency = record
            .frequency
            .parse()
            .map_err(ReportError::InvalidSchedule)?;
        let time_of_day = parse_time_of_day(&record.time_of_day)?;
        let timezone: Tz = record.timezone.parse().map_err(|_| {
            ReportError::InvalidSchedule(format!("unknown timezone '{}'", record.timezone))
        })?;
        let next_run = record
            .next_run
            .unwrap_or_else(|| initial_next_run(frequency, time_of_day, timezone, now));
        Ok(Self {
            id: record.id,
            template_id: record.template_id,
            frequency,
            time_of_day,
            timezone,
            recipients: record.recipients,
            enabled: record.enabled,
            last_run: record.last_run,
            next_run,
        })
    }
}

/// Parses a schedule time as `HH:MM:SS`, or `HH:MM` with seconds zero.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, ReportError> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| ReportError::InvalidSchedule(format!("invalid time of day '{value}'")))
}

/// First run at or after `now`.
///
/// Hourly schedules fire at the schedule's minute each hour; calendar
/// schedules fire at the schedule's wall time on the current local date,
/// rolling to the next day once the time has passed. Weekly and monthly
/// schedules anchor on that first day and keep its weekday or day of month.
#[must_use]
pub fn initial_next_run(
    frequency: Frequency,
    time_of_day: NaiveTime,
    tz: Tz,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    match frequency {
        Frequency::Hourly => {
            let into_hour = Duration::minutes(i64::from(now.minute()))
                + Duration::seconds(i64::from(now.second()))
                + Duration::nanoseconds(i64::from(now.timestamp_subsec_nanos()));
            let mut next = now - into_hour + Duration::minutes(i64::from(time_of_day.minute()));
            while next < now {
                next += Duration::hours(1);
            }
            next
        }
        Frequency::Daily | Frequency::Weekly | Frequency::Monthly => {
            let local_date = now.with_timezone(&tz).date_naive();
            let today = resolve_local(tz, local_date.and_time(time_of_day));
            if today >= now {
                today
            } else {
                resolve_local(tz, (local_date + Duration::days(1)).and_time(time_of_day))
            }
        }
    }
}

/// Next run strictly after `now`, advanced from the run that just fired.
///
/// `prev_next_run` is the slot that triggered the run. Missed slots are
/// skipped in whole periods so the schedule keeps its phase.
#[must_use]
pub fn advance_after_run(
    prev_next_run: DateTime<Utc>,
    frequency: Frequency,
    time_of_day: NaiveTime,
    tz: Tz,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    if frequency == Frequency::Hourly {
        let mut next = prev_next_run + Duration::hours(1);
        while next <= now {
            next += Duration::hours(1);
        }
        return next;
    }

    let mut date = prev_next_run.with_timezone(&tz).date_naive();
    loop {
        date = advance_date(date, frequency);
        let next = resolve_local(tz, date.and_time(time_of_day));
        if next > now {
            return next;
        }
    }
}

fn advance_date(date: NaiveDate, frequency: Frequency) -> NaiveDate {
    match frequency {
        Frequency::Hourly | Frequency::Daily => date + Duration::days(1),
        Frequency::Weekly => date + Duration::days(7),
        // Clamps to the last day of shorter months, Jan 31 -> Feb 28.
        Frequency::Monthly => date
            .checked_add_months(Months::new(1))
            .unwrap_or_else(|| date + Duration::days(30)),
    }
}

/// Maps a local wall time to UTC.
///
/// A time erased by a DST gap probes forward in half-hour steps until it
/// lands on a valid wall time; an ambiguous time takes the earlier instant.
fn resolve_local(tz: Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    let mut candidate = naive;
    loop {
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(local) => return local.with_timezone(&Utc),
            LocalResult::Ambiguous(earliest, _) => return earliest.with_timezone(&Utc),
            LocalResult::None => candidate += Duration::minutes(30),
        }
    }
}

/// Outcome reported back to the board when a scheduled run finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    Failure,
}

/// Typed fields for a new schedule.
#[derive(Debug, Clone)]
pub struct NewSchedule {
    pub template_id: String,
    pub frequency: Frequency,
    pub time_of_day: NaiveTime,
    pub timezone: Tz,
    pub recipients: Vec<String>,
}

struct BoardEntry {
    schedule: ReportSchedule,
    running: bool,
}

/// In-memory schedule board, mirrored to the source service.
///
/// Mutations persist best-effort: the board is the runtime authority and a
/// failed mirror write is logged, not propagated.
pub struct ScheduleBoard {
    source: Arc<SourceClient>,
    entries: RwLock<HashMap<Uuid, BoardEntry>>,
}

impl ScheduleBoard {
    #[must_use]
    pub fn new(source: Arc<SourceClient>) -> Self {
        Self {
            source,
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn read_entries(&self) -> RwLockReadGuard<'_, HashMap<Uuid, BoardEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, BoardEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the board with the schedules persisted at the source.
    ///
    /// Records that no longer parse are skipped with a warning rather than
    /// failing the whole load. Returns how many schedules were restored.
    ///
    /// # Errors
    ///
    /// [`ReportError::Source`] when the schedule listing itself fails.
    pub async fn load(&self) -> Result<usize, ReportError> {
        let records = self.source.list_schedules().await?;
        let now = Utc::now();
        let mut entries = HashMap::new();
        for record in records {
            let id = record.id;
            match ReportSchedule::from_record(record, now) {
                Ok(schedule) => {
                    entries.insert(
                        id,
                        BoardEntry {
                            schedule,
                            running: false,
                        },
                    );
                }
                Err(e) => {
                    tracing::warn!(schedule_id = %id, error = %e, "skipping invalid persisted schedule");
                }
            }
        }
        let count = entries.len();
        *self.write_entries() = entries;
        Ok(count)
    }

    /// Registers a new schedule and mirrors it to the source.
    pub async fn schedule(&self, new: NewSchedule, now: DateTime<Utc>) -> ReportSchedule {
        let schedule = ReportSchedule {
            id: Uuid::new_v4(),
            next_run: initial_next_run(new.frequency, new.time_of_day, new.timezone, now),
            template_id: new.template_id,
            frequency: new.frequency,
            time_of_day: new.time_of_day,
            timezone: new.timezone,
            recipients: new.recipients,
            enabled: true,
            last_run: None,
        };
        self.write_entries().insert(
            schedule.id,
            BoardEntry {
                schedule: schedule.clone(),
                running: false,
            },
        );
        self.persist(&schedule).await;
        tracing::info!(
            schedule_id = %schedule.id,
            template_id = %schedule.template_id,
            frequency = %schedule.frequency,
            next_run = %schedule.next_run,
            "registered report schedule"
        );
        schedule
    }

    /// Claims every schedule due at `now` and marks it running.
    ///
    /// A schedule stays claimed until [`ScheduleBoard::complete_run`] is
    /// called for it, so an overrunning report cannot trigger a second
    /// overlapping run.
    pub fn claim_due(&self, now: DateTime<Utc>) -> Vec<ReportSchedule> {
        let mut entries = self.write_entries();
        let mut due: Vec<ReportSchedule> = entries
            .values_mut()
            .filter(|entry| {
                entry.schedule.enabled && !entry.running && entry.schedule.next_run <= now
            })
            .map(|entry| {
                entry.running = true;
                entry.schedule.clone()
            })
            .collect();
        due.sort_by_key(|s| (s.next_run, s.id));
        due
    }

    /// Releases a claimed schedule and advances its next run.
    ///
    /// `last_run` only moves on success; the next slot advances either way
    /// so a persistently failing report does not spin on every tick.
    pub async fn complete_run(&self, id: Uuid, now: DateTime<Utc>, outcome: RunOutcome) {
        let updated = {
            let mut entries = self.write_entries();
            let Some(entry) = entries.get_mut(&id) else {
                tracing::warn!(schedule_id = %id, "completed run for unknown schedule");
                return;
            };
            entry.running = false;
            if outcome == RunOutcome::Success {
                entry.schedule.last_run = Some(now);
            }
            entry.schedule.next_run = advance_after_run(
                entry.schedule.next_run,
                entry.schedule.frequency,
                entry.schedule.time_of_day,
                entry.schedule.timezone,
                now,
            );
            entry.schedule.clone()
        };
        self.persist(&updated).await;
    }

    /// Disables a schedule. Returns false when the id is unknown.
    pub async fn unschedule(&self, id: Uuid) -> bool {
        let updated = {
            let mut entries = self.write_entries();
            let Some(entry) = entries.get_mut(&id) else {
                return false;
            };
            entry.schedule.enabled = false;
            entry.schedule.clone()
        };
        self.persist(&updated).await;
        tracing::info!(schedule_id = %id, "disabled report schedule");
        true
    }

    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<ReportSchedule> {
        self.read_entries().get(&id).map(|e| e.schedule.clone())
    }

    /// All schedules, soonest next run first.
    #[must_use]
    pub fn list(&self) -> Vec<ReportSchedule> {
        let mut schedules: Vec<ReportSchedule> = self
            .read_entries()
            .values()
            .map(|e| e.schedule.clone())
            .collect();
        schedules.sort_by_key(|s| (s.next_run, s.id));
        schedules
    }

    async fn persist(&self, schedule: &ReportSchedule) {
        if let Err(e) = self.source.put_schedule(&schedule.to_record()).await {
            tracing::error!(
                schedule_id = %schedule.id,
                error = %e,
                "failed to persist schedule state"
            );
        }
    }
}
