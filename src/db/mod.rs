mod schema;

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use crate::models::*;
use crate::rotation::{self, HouseholdRotationStatus, RotationError, RotationOverview};

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Where `open_default` stores the database.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "greenpia")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(dirs.data_dir().join("greenpia.db"))
    }

    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Household operations
    // ============================================================

    pub fn get_all_households(&self) -> Result<Vec<Household>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT household_id, resident_name, move_in_date, leader_history_count, contact, created_at, updated_at
             FROM households ORDER BY household_id",
        )?;

        let households = stmt
            .query_map([], |row| {
                Ok(Household {
                    household_id: row.get(0)?,
                    resident_name: row.get(1)?,
                    move_in_date: row.get::<_, Option<String>>(2)?.map(parse_date),
                    leader_history_count: row.get(3)?,
                    contact: row.get(4)?,
                    created_at: parse_datetime(row.get::<_, String>(5)?),
                    updated_at: parse_datetime(row.get::<_, String>(6)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(households)
    }

    pub fn get_household(&self, household_id: &str) -> Result<Option<Household>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT household_id, resident_name, move_in_date, leader_history_count, contact, created_at, updated_at
             FROM households WHERE household_id = ?",
        )?;

        let mut rows = stmt.query([household_id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Household {
                household_id: row.get(0)?,
                resident_name: row.get(1)?,
                move_in_date: row.get::<_, Option<String>>(2)?.map(parse_date),
                leader_history_count: row.get(3)?,
                contact: row.get(4)?,
                created_at: parse_datetime(row.get::<_, String>(5)?),
                updated_at: parse_datetime(row.get::<_, String>(6)?),
            }))
        } else {
            Ok(None)
        }
    }

    pub fn create_household(&self, input: CreateHouseholdInput) -> Result<Household> {
        if self.get_household(&input.household_id)?.is_some() {
            anyhow::bail!("Household {} already registered", input.household_id);
        }

        let conn = self.conn.lock().expect("database lock poisoned");
        let now = Utc::now();

        conn.execute(
            "INSERT INTO households (household_id, resident_name, move_in_date, leader_history_count, contact, created_at, updated_at)
             VALUES (?, ?, ?, 0, ?, ?, ?)",
            (
                &input.household_id,
                &input.resident_name,
                input.move_in_date.map(|d| d.to_string()),
                &input.contact,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(Household {
            household_id: input.household_id,
            resident_name: input.resident_name,
            move_in_date: input.move_in_date,
            leader_history_count: 0,
            contact: input.contact,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_household(
        &self,
        household_id: &str,
        input: UpdateHouseholdInput,
    ) -> Result<Option<Household>> {
        let Some(existing) = self.get_household(household_id)? else {
            return Ok(None);
        };

        let conn = self.conn.lock().expect("database lock poisoned");
        let now = Utc::now();
        let resident_name = input.resident_name.unwrap_or(existing.resident_name);
        let move_in_date = input.move_in_date.or(existing.move_in_date);
        let contact = input.contact.or(existing.contact);

        conn.execute(
            "UPDATE households SET resident_name = ?, move_in_date = ?, contact = ?, updated_at = ? WHERE household_id = ?",
            (
                &resident_name,
                move_in_date.map(|d| d.to_string()),
                &contact,
                now.to_rfc3339(),
                household_id,
            ),
        )?;

        Ok(Some(Household {
            household_id: household_id.to_string(),
            resident_name,
            move_in_date,
            leader_history_count: existing.leader_history_count,
            contact,
            created_at: existing.created_at,
            updated_at: now,
        }))
    }

    pub fn delete_household(&self, household_id: &str) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM households WHERE household_id = ?", [household_id])?;
        Ok(rows > 0)
    }

    /// Record a completed leader term.
    ///
    /// The rotation selector never writes `leader_history_count`; this is the
    /// single place it is incremented.
    pub fn complete_leader_term(&self, household_id: &str) -> Result<Option<Household>> {
        if self.get_household(household_id)?.is_none() {
            return Ok(None);
        }

        {
            let conn = self.conn.lock().expect("database lock poisoned");
            let now = Utc::now();
            conn.execute(
                "UPDATE households SET leader_history_count = leader_history_count + 1, updated_at = ? WHERE household_id = ?",
                (now.to_rfc3339(), household_id),
            )?;
        }

        self.get_household(household_id)
    }

    // ============================================================
    // Exemption operations
    // ============================================================

    pub fn list_exemptions(
        &self,
        year: Option<i32>,
        status: Option<ExemptionStatus>,
    ) -> Result<Vec<ExemptionRequest>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, household_id, year, reason, status, created_at, updated_at
             FROM exemption_requests
             WHERE (?1 IS NULL OR year = ?1) AND (?2 IS NULL OR status = ?2)
             ORDER BY year DESC, created_at",
        )?;

        let exemptions = stmt
            .query_map(
                (year, status.map(|s| s.as_str())),
                |row| {
                    Ok(ExemptionRequest {
                        id: parse_uuid(row.get::<_, String>(0)?),
                        household_id: row.get(1)?,
                        year: row.get(2)?,
                        reason: row.get(3)?,
                        status: ExemptionStatus::from_str(&row.get::<_, String>(4)?)
                            .unwrap_or(ExemptionStatus::Pending),
                        created_at: parse_datetime(row.get::<_, String>(5)?),
                        updated_at: parse_datetime(row.get::<_, String>(6)?),
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(exemptions)
    }

    pub fn get_exemption(&self, id: Uuid) -> Result<Option<ExemptionRequest>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, household_id, year, reason, status, created_at, updated_at
             FROM exemption_requests WHERE id = ?",
        )?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(ExemptionRequest {
                id: parse_uuid(row.get::<_, String>(0)?),
                household_id: row.get(1)?,
                year: row.get(2)?,
                reason: row.get(3)?,
                status: ExemptionStatus::from_str(&row.get::<_, String>(4)?)
                    .unwrap_or(ExemptionStatus::Pending),
                created_at: parse_datetime(row.get::<_, String>(5)?),
                updated_at: parse_datetime(row.get::<_, String>(6)?),
            }))
        } else {
            Ok(None)
        }
    }

    pub fn create_exemption(&self, input: CreateExemptionInput) -> Result<ExemptionRequest> {
        self.get_household(&input.household_id)?
            .ok_or_else(|| anyhow::anyhow!("Household not found"))?;

        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO exemption_requests (id, household_id, year, reason, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, 'pending', ?, ?)",
            (
                id.to_string(),
                &input.household_id,
                input.year,
                &input.reason,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(ExemptionRequest {
            id,
            household_id: input.household_id,
            year: input.year,
            reason: input.reason,
            status: ExemptionStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn set_exemption_status(
        &self,
        id: Uuid,
        status: ExemptionStatus,
    ) -> Result<Option<ExemptionRequest>> {
        let Some(existing) = self.get_exemption(id)? else {
            return Ok(None);
        };

        let conn = self.conn.lock().expect("database lock poisoned");
        let now = Utc::now();
        conn.execute(
            "UPDATE exemption_requests SET status = ?, updated_at = ? WHERE id = ?",
            (status.as_str(), now.to_rfc3339(), id.to_string()),
        )?;

        Ok(Some(ExemptionRequest {
            status,
            updated_at: now,
            ..existing
        }))
    }

    /// Household ids holding an approved exemption for the given year.
    pub fn approved_exemption_ids(&self, year: i32) -> Result<HashSet<String>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT household_id FROM exemption_requests WHERE year = ? AND status = 'approved'",
        )?;

        let ids = stmt
            .query_map([year], |row| row.get(0))?
            .collect::<Result<HashSet<String>, _>>()?;

        Ok(ids)
    }

    // ============================================================
    // Schedule operations
    // ============================================================

    pub fn get_all_schedules(&self) -> Result<Vec<LeaderScheduleEntry>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, year, primary_household_id, backup_household_id, status, reason, created_at
             FROM leader_schedules ORDER BY year, created_at",
        )?;

        let entries = stmt
            .query_map([], map_schedule_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// The schedule entry for a year, or `None`.
    ///
    /// The calculate path can leave duplicate rows for a year; readers take
    /// the most recently created one.
    pub fn get_schedule_for_year(&self, year: i32) -> Result<Option<LeaderScheduleEntry>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, year, primary_household_id, backup_household_id, status, reason, created_at
             FROM leader_schedules WHERE year = ? ORDER BY created_at DESC LIMIT 1",
        )?;

        let mut rows = stmt.query([year])?;
        if let Some(row) = rows.next()? {
            Ok(Some(map_schedule_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// All schedule rows for a year, oldest first. Surfaces duplicates left
    /// by repeated calculate calls.
    pub fn get_schedules_for_year(&self, year: i32) -> Result<Vec<LeaderScheduleEntry>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, year, primary_household_id, backup_household_id, status, reason, created_at
             FROM leader_schedules WHERE year = ? ORDER BY created_at",
        )?;

        let entries = stmt
            .query_map([year], map_schedule_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    pub fn delete_schedules_for_year(&self, year: i32) -> Result<usize> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM leader_schedules WHERE year = ?", [year])?;
        Ok(rows)
    }

    fn insert_schedule(
        &self,
        year: i32,
        selection: &rotation::Selection,
        reason: &str,
    ) -> Result<LeaderScheduleEntry> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO leader_schedules (id, year, primary_household_id, backup_household_id, status, reason, created_at)
             VALUES (?, ?, ?, ?, 'draft', ?, ?)",
            (
                id.to_string(),
                year,
                &selection.primary_household_id,
                &selection.backup_household_id,
                reason,
                now.to_rfc3339(),
            ),
        )?;

        Ok(LeaderScheduleEntry {
            id,
            year,
            primary_household_id: selection.primary_household_id.clone(),
            backup_household_id: selection.backup_household_id.clone(),
            status: ScheduleStatus::Draft,
            reason: reason.to_string(),
            created_at: now,
        })
    }

    /// Advance the year's schedule one step: draft → conditional → confirmed.
    pub fn advance_schedule_status(&self, year: i32) -> Result<Option<LeaderScheduleEntry>> {
        let Some(entry) = self.get_schedule_for_year(year)? else {
            return Ok(None);
        };

        let next = entry
            .status
            .next()
            .ok_or_else(|| anyhow::anyhow!("Schedule for {} is already confirmed", year))?;

        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "UPDATE leader_schedules SET status = ? WHERE id = ?",
            (next.as_str(), entry.id.to_string()),
        )?;

        Ok(Some(LeaderScheduleEntry {
            status: next,
            ..entry
        }))
    }

    // ============================================================
    // Rotation entry points
    // ============================================================

    /// Select next year's leader pair, excluding only exempted households.
    ///
    /// Appends a new draft entry without clearing prior rows for the year.
    /// Fails with `InsufficientCandidates` when every household is exempted.
    pub fn calculate_next_year(&self, year: i32) -> Result<LeaderScheduleEntry, RotationError> {
        let households = self.get_all_households()?;
        let exempted = self.approved_exemption_ids(year)?;
        let previous = self.get_schedule_for_year(year - 1)?;

        let candidates: Vec<Household> = households
            .into_iter()
            .filter(|h| !exempted.contains(&h.household_id))
            .collect();
        let ranked = rotation::rank_candidates(
            candidates,
            previous.as_ref().map(|p| p.primary_household_id.as_str()),
        );
        let selection =
            rotation::select(&ranked).ok_or(RotationError::InsufficientCandidates { year })?;

        let reason = format!(
            "Automatic rotation for {}: {} candidate(s) ranked, exempted households excluded",
            year,
            ranked.len()
        );
        let entry = self.insert_schedule(year, &selection, &reason)?;
        Ok(entry)
    }

    /// Rebuild the year's schedule under the full exclusion rule set
    /// (exemption, recent move-in, prior service).
    ///
    /// Deletes any existing rows for the year first. Never fails on an empty
    /// candidate list: the year is left unscheduled and the outcome reports
    /// `candidate_count = 0`.
    pub fn recalculate_schedules(&self, year: i32) -> Result<RecalculateOutcome, RotationError> {
        let households = self.get_all_households()?;
        let exempted = self.approved_exemption_ids(year)?;
        let previous = self.get_schedule_for_year(year - 1)?;
        let now = Utc::now();

        let candidates: Vec<Household> = households
            .into_iter()
            .filter(|h| rotation::exclusion_reasons(h, now, &exempted).is_empty())
            .collect();
        let ranked = rotation::rank_candidates(
            candidates,
            previous.as_ref().map(|p| p.primary_household_id.as_str()),
        );
        let candidate_count = ranked.len();

        self.delete_schedules_for_year(year)?;

        let entry = match rotation::select(&ranked) {
            Some(selection) => {
                let reason = format!(
                    "Recalculated rotation for {}: {} eligible candidate(s)",
                    year, candidate_count
                );
                Some(self.insert_schedule(year, &selection, &reason)?)
            }
            None => None,
        };

        Ok(RecalculateOutcome {
            candidate_count,
            entry,
        })
    }

    /// Reason-annotated rotation overview for a year. Pure read.
    pub fn get_rotation_with_reasons(&self, year: i32) -> Result<RotationOverview, RotationError> {
        let households = self.get_all_households()?;
        let exempted = self.approved_exemption_ids(year)?;
        let now = Utc::now();

        let statuses = households
            .iter()
            .map(|h| {
                let reasons = rotation::exclusion_reasons(h, now, &exempted);
                HouseholdRotationStatus {
                    household_id: h.household_id.clone(),
                    move_in_date: h.move_in_date,
                    leader_history_count: h.leader_history_count,
                    is_candidate: reasons.is_empty(),
                    reasons,
                }
            })
            .collect();

        let schedule = self.get_schedule_for_year(year)?;

        Ok(RotationOverview {
            households: statuses,
            schedule,
        })
    }

    // ============================================================
    // Inquiry operations
    // ============================================================

    pub fn get_all_inquiries(&self) -> Result<Vec<Inquiry>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, household_id, title, body, status, answer, created_at, updated_at
             FROM inquiries ORDER BY created_at DESC",
        )?;

        let inquiries = stmt
            .query_map([], map_inquiry_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(inquiries)
    }

    pub fn get_inquiry(&self, id: Uuid) -> Result<Option<Inquiry>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, household_id, title, body, status, answer, created_at, updated_at
             FROM inquiries WHERE id = ?",
        )?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(map_inquiry_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn create_inquiry(&self, input: CreateInquiryInput) -> Result<Inquiry> {
        self.get_household(&input.household_id)?
            .ok_or_else(|| anyhow::anyhow!("Household not found"))?;

        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO inquiries (id, household_id, title, body, status, answer, created_at, updated_at)
             VALUES (?, ?, ?, ?, 'open', NULL, ?, ?)",
            (
                id.to_string(),
                &input.household_id,
                &input.title,
                &input.body,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(Inquiry {
            id,
            household_id: input.household_id,
            title: input.title,
            body: input.body,
            status: InquiryStatus::Open,
            answer: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn answer_inquiry(&self, id: Uuid, input: AnswerInquiryInput) -> Result<Option<Inquiry>> {
        let Some(existing) = self.get_inquiry(id)? else {
            return Ok(None);
        };

        let conn = self.conn.lock().expect("database lock poisoned");
        let now = Utc::now();
        conn.execute(
            "UPDATE inquiries SET status = 'answered', answer = ?, updated_at = ? WHERE id = ?",
            (&input.answer, now.to_rfc3339(), id.to_string()),
        )?;

        Ok(Some(Inquiry {
            status: InquiryStatus::Answered,
            answer: Some(input.answer),
            updated_at: now,
            ..existing
        }))
    }

    // ============================================================
    // FAQ operations
    // ============================================================

    pub fn get_all_faq(&self) -> Result<Vec<FaqArticle>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, category, question, answer, created_at, updated_at
             FROM faq_articles ORDER BY category, created_at",
        )?;

        let articles = stmt
            .query_map([], map_faq_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(articles)
    }

    pub fn get_faq(&self, id: Uuid) -> Result<Option<FaqArticle>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, category, question, answer, created_at, updated_at
             FROM faq_articles WHERE id = ?",
        )?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(map_faq_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn create_faq(&self, input: CreateFaqInput) -> Result<FaqArticle> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO faq_articles (id, category, question, answer, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &input.category,
                &input.question,
                &input.answer,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(FaqArticle {
            id,
            category: input.category,
            question: input.question,
            answer: input.answer,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_faq(&self, id: Uuid, input: UpdateFaqInput) -> Result<Option<FaqArticle>> {
        let Some(existing) = self.get_faq(id)? else {
            return Ok(None);
        };

        let conn = self.conn.lock().expect("database lock poisoned");
        let now = Utc::now();
        let category = input.category.unwrap_or(existing.category);
        let question = input.question.unwrap_or(existing.question);
        let answer = input.answer.unwrap_or(existing.answer);

        conn.execute(
            "UPDATE faq_articles SET category = ?, question = ?, answer = ?, updated_at = ? WHERE id = ?",
            (&category, &question, &answer, now.to_rfc3339(), id.to_string()),
        )?;

        Ok(Some(FaqArticle {
            id,
            category,
            question,
            answer,
            created_at: existing.created_at,
            updated_at: now,
        }))
    }

    pub fn delete_faq(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM faq_articles WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    // ============================================================
    // User operations
    // ============================================================

    pub fn create_user(&self, input: CreateUserInput) -> Result<User> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();
        let role = input.role.unwrap_or(UserRole::Resident);

        conn.execute(
            "INSERT INTO users (id, name, household_id, role, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &input.name,
                &input.household_id,
                role.as_str(),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(User {
            id,
            name: input.name,
            household_id: input.household_id,
            role,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, name, household_id, role, created_at, updated_at
             FROM users WHERE id = ?",
        )?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(User {
                id: parse_uuid(row.get::<_, String>(0)?),
                name: row.get(1)?,
                household_id: row.get(2)?,
                role: UserRole::from_str(&row.get::<_, String>(3)?).unwrap_or(UserRole::Resident),
                created_at: parse_datetime(row.get::<_, String>(4)?),
                updated_at: parse_datetime(row.get::<_, String>(5)?),
            }))
        } else {
            Ok(None)
        }
    }

    /// Synchronize a user's role with the given year's schedule membership.
    ///
    /// Idempotent: a resident whose household holds the primary or backup
    /// slot becomes a leader; a leader whose household holds neither reverts
    /// to resident; admins are never touched. Repeat calls with unchanged
    /// data are no-ops.
    pub fn sync_user_role(&self, user_id: Uuid, year: i32) -> Result<Option<User>> {
        let Some(user) = self.get_user(user_id)? else {
            return Ok(None);
        };
        if user.role == UserRole::Admin {
            return Ok(Some(user));
        }

        let on_schedule = match (&user.household_id, self.get_schedule_for_year(year)?) {
            (Some(household_id), Some(entry)) => {
                entry.primary_household_id == *household_id
                    || entry.backup_household_id == *household_id
            }
            _ => false,
        };

        let desired = if on_schedule {
            UserRole::Leader
        } else {
            UserRole::Resident
        };
        if user.role == desired {
            return Ok(Some(user));
        }

        let conn = self.conn.lock().expect("database lock poisoned");
        let now = Utc::now();
        conn.execute(
            "UPDATE users SET role = ?, updated_at = ? WHERE id = ?",
            (desired.as_str(), now.to_rfc3339(), user_id.to_string()),
        )?;

        Ok(Some(User {
            role: desired,
            updated_at: now,
            ..user
        }))
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

fn map_schedule_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LeaderScheduleEntry> {
    Ok(LeaderScheduleEntry {
        id: parse_uuid(row.get::<_, String>(0)?),
        year: row.get(1)?,
        primary_household_id: row.get(2)?,
        backup_household_id: row.get(3)?,
        status: ScheduleStatus::from_str(&row.get::<_, String>(4)?)
            .unwrap_or(ScheduleStatus::Draft),
        reason: row.get(5)?,
        created_at: parse_datetime(row.get::<_, String>(6)?),
    })
}

fn map_inquiry_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Inquiry> {
    Ok(Inquiry {
        id: parse_uuid(row.get::<_, String>(0)?),
        household_id: row.get(1)?,
        title: row.get(2)?,
        body: row.get(3)?,
        status: InquiryStatus::from_str(&row.get::<_, String>(4)?).unwrap_or(InquiryStatus::Open),
        answer: row.get(5)?,
        created_at: parse_datetime(row.get::<_, String>(6)?),
        updated_at: parse_datetime(row.get::<_, String>(7)?),
    })
}

fn map_faq_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FaqArticle> {
    Ok(FaqArticle {
        id: parse_uuid(row.get::<_, String>(0)?),
        category: row.get(1)?,
        question: row.get(2)?,
        answer: row.get(3)?,
        created_at: parse_datetime(row.get::<_, String>(4)?),
        updated_at: parse_datetime(row.get::<_, String>(5)?),
    })
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_date(s: String) -> NaiveDate {
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").unwrap_or_default()
}
