use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};
use ulid::Ulid;

pub mod catalog;
pub mod quiz;

/// XP contained in a single level bucket.
pub const XP_PER_LEVEL: u64 = 100;

#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum LedgerError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// The persisted progress record. Serialized field names are frozen:
/// previously saved snapshots must keep rehydrating, so the JSON shape
/// stays camelCase regardless of the Rust-side names.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub xp: u64,
    pub level: u64,
    pub completed_lessons: Vec<String>,
    pub completed_quizzes: Vec<String>,
    pub completed_stages: Vec<String>,
    pub badges: Vec<String>,
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self {
            xp: 0,
            level: 1,
            completed_lessons: Vec::new(),
            completed_quizzes: Vec::new(),
            completed_stages: Vec::new(),
            badges: Vec::new(),
        }
    }
}

#[must_use]
pub fn level_for_xp(xp: u64) -> u64 {
    xp / XP_PER_LEVEL + 1
}

/// Result of an append-if-absent mutation. Repeating a completion is a
/// no-op keyed only on ID presence; the reward argument is ignored for
/// an ID that is already recorded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum CompletionOutcome {
    Applied,
    AlreadyComplete,
}

impl CompletionOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::AlreadyComplete => "already_complete",
        }
    }

    #[must_use]
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

impl ProgressRecord {
    /// Checks the leveling invariant and collection uniqueness.
    ///
    /// # Errors
    /// Returns [`LedgerError::Validation`] when the level is out of step
    /// with the XP total or a collection holds a duplicate entry.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.level != level_for_xp(self.xp) {
            return Err(LedgerError::Validation(format!(
                "level {} does not match xp {}",
                self.level, self.xp
            )));
        }

        for (name, entries) in [
            ("completedLessons", &self.completed_lessons),
            ("completedQuizzes", &self.completed_quizzes),
            ("completedStages", &self.completed_stages),
            ("badges", &self.badges),
        ] {
            let mut seen = std::collections::BTreeSet::new();
            for entry in entries {
                if !seen.insert(entry.as_str()) {
                    return Err(LedgerError::Validation(format!(
                        "{name} contains duplicate entry {entry}"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Adds XP and recomputes the level. XP is monotonically
    /// non-decreasing; a zero grant still counts as a mutation for
    /// persistence purposes.
    pub fn grant_xp(&mut self, amount: u64) {
        self.xp += amount;
        self.level = level_for_xp(self.xp);
    }

    pub fn complete_lesson(&mut self, id: &str, xp_reward: u64) -> CompletionOutcome {
        if !Self::append_if_absent(&mut self.completed_lessons, id) {
            return CompletionOutcome::AlreadyComplete;
        }
        self.grant_xp(xp_reward);
        CompletionOutcome::Applied
    }

    pub fn complete_quiz(&mut self, id: &str, xp_reward: u64) -> CompletionOutcome {
        if !Self::append_if_absent(&mut self.completed_quizzes, id) {
            return CompletionOutcome::AlreadyComplete;
        }
        self.grant_xp(xp_reward);
        CompletionOutcome::Applied
    }

    pub fn complete_stage(&mut self, id: &str, xp_reward: u64) -> CompletionOutcome {
        if !Self::append_if_absent(&mut self.completed_stages, id) {
            return CompletionOutcome::AlreadyComplete;
        }
        self.grant_xp(xp_reward);
        CompletionOutcome::Applied
    }

    /// Awards a badge label. Grants no XP.
    pub fn award_badge(&mut self, label: &str) -> CompletionOutcome {
        if Self::append_if_absent(&mut self.badges, label) {
            CompletionOutcome::Applied
        } else {
            CompletionOutcome::AlreadyComplete
        }
    }

    fn append_if_absent(entries: &mut Vec<String>, id: &str) -> bool {
        if entries.iter().any(|entry| entry == id) {
            return false;
        }
        entries.push(id.to_string());
        true
    }

    #[must_use]
    pub fn xp_to_next_level(&self) -> u64 {
        (self.level * XP_PER_LEVEL).saturating_sub(self.xp)
    }

    /// Progress through the current level bucket, as a percentage.
    /// Saturating arithmetic keeps a rehydrated snapshot with stale level
    /// bookkeeping from panicking.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn xp_progress_percent(&self) -> f64 {
        let level_floor = self.level.saturating_sub(1) * XP_PER_LEVEL;
        let progress_in_level = self.xp.saturating_sub(level_floor);
        progress_in_level as f64 / XP_PER_LEVEL as f64 * 100.0
    }

    #[must_use]
    pub fn total_completed(&self) -> usize {
        self.completed_lessons.len() + self.completed_quizzes.len() + self.completed_stages.len()
    }

    #[must_use]
    pub fn is_certificate_eligible(&self) -> bool {
        self.completed_lessons.len() >= 2
            || !self.completed_quizzes.is_empty()
            || !self.completed_stages.is_empty()
    }

    /// Pretty-printed snapshot of the record, byte-identical to what the
    /// persistence layer writes.
    ///
    /// # Errors
    /// Returns [`LedgerError::Serialization`] when JSON encoding fails.
    pub fn to_pretty_json(&self) -> Result<String, LedgerError> {
        serde_json::to_string_pretty(self)
            .map_err(|err| LedgerError::Serialization(err.to_string()))
    }
}

/// Certificate title bucket. Checks run in fixed descending order; the
/// first match wins.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd)]
#[serde(rename_all = "snake_case")]
pub enum CertificateTier {
    FullStackDeveloper,
    FrontEndExplorer,
    WebFundamentals,
    JavascriptSpecialist,
}

impl CertificateTier {
    #[must_use]
    pub fn for_record(record: &ProgressRecord) -> Self {
        if record.completed_stages.len() >= 5 {
            Self::FullStackDeveloper
        } else if record.completed_stages.len() >= 3 {
            Self::FrontEndExplorer
        } else if record.completed_lessons.len() >= 4 {
            Self::WebFundamentals
        } else {
            Self::JavascriptSpecialist
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::FullStackDeveloper => "Full-Stack Developer",
            Self::FrontEndExplorer => "Front-End Explorer",
            Self::WebFundamentals => "Web Development Fundamentals",
            Self::JavascriptSpecialist => "JavaScript Specialist",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FullStackDeveloper => "full_stack_developer",
            Self::FrontEndExplorer => "front_end_explorer",
            Self::WebFundamentals => "web_fundamentals",
            Self::JavascriptSpecialist => "javascript_specialist",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd)]
#[serde(rename_all = "snake_case")]
pub enum CompletionLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl CompletionLevel {
    #[must_use]
    pub fn for_record(record: &ProgressRecord) -> Self {
        let total = record.total_completed();
        if total >= 15 {
            Self::Advanced
        } else if total >= 10 {
            Self::Intermediate
        } else {
            Self::Beginner
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
        }
    }
}

/// A point-in-time certificate, derived from the record and a display
/// name. Visual rendering and image export live outside this crate.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct CertificateReport {
    pub certificate_id: Ulid,
    pub holder_name: String,
    pub tier: CertificateTier,
    pub tier_title: String,
    pub completion_level: CompletionLevel,
    pub xp: u64,
    pub level: u64,
    pub lessons_completed: usize,
    pub quizzes_completed: usize,
    pub stages_completed: usize,
    pub issued_at: String,
}

impl CertificateReport {
    /// Builds a certificate for an eligible record.
    ///
    /// # Errors
    /// Returns [`LedgerError::Validation`] when the record is not yet
    /// eligible, and [`LedgerError::Serialization`] when timestamp
    /// formatting fails.
    pub fn generate(
        record: &ProgressRecord,
        holder_name: &str,
        issued_at: OffsetDateTime,
    ) -> Result<Self, LedgerError> {
        if !record.is_certificate_eligible() {
            return Err(LedgerError::Validation(
                "record is not eligible for a certificate yet".to_string(),
            ));
        }

        let tier = CertificateTier::for_record(record);
        Ok(Self {
            certificate_id: Ulid::new(),
            holder_name: holder_name.to_string(),
            tier,
            tier_title: tier.title().to_string(),
            completion_level: CompletionLevel::for_record(record),
            xp: record.xp,
            level: record.level,
            lessons_completed: record.completed_lessons.len(),
            quizzes_completed: record.completed_quizzes.len(),
            stages_completed: record.completed_stages.len(),
            issued_at: format_rfc3339(issued_at)?,
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SharePlatform {
    Linkedin,
    Twitter,
    Github,
}

impl SharePlatform {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linkedin => "linkedin",
            Self::Twitter => "twitter",
            Self::Github => "github",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "linkedin" => Some(Self::Linkedin),
            "twitter" => Some(Self::Twitter),
            "github" => Some(Self::Github),
            _ => None,
        }
    }
}

const SHARE_PAGE_URL: &str = "https://devquest.dev/certificate";

/// The plain-text summary offered to share targets.
#[must_use]
pub fn share_summary(record: &ProgressRecord) -> String {
    let tier = CertificateTier::for_record(record);
    format!(
        "Just earned my {} certificate from DevQuest!\n\n\
         Level {} - {} XP earned\n\
         Completed {} lessons, {} quizzes, and {} adventure stages!\n\n\
         #WebDevelopment #JavaScript #Learning #DevQuest",
        tier.title(),
        record.level,
        record.xp,
        record.completed_lessons.len(),
        record.completed_quizzes.len(),
        record.completed_stages.len(),
    )
}

/// Platform share URL with the summary percent-encoded into the query
/// string. The caller decides whether to open it; nothing here touches
/// the network.
#[must_use]
pub fn share_url(platform: SharePlatform, summary: &str) -> String {
    match platform {
        SharePlatform::Linkedin => format!(
            "https://www.linkedin.com/sharing/share-offsite/?url={}&summary={}",
            urlencoding::encode(SHARE_PAGE_URL),
            urlencoding::encode(summary)
        ),
        SharePlatform::Twitter => format!(
            "https://twitter.com/intent/tweet?text={}",
            urlencoding::encode(summary)
        ),
        SharePlatform::Github => "https://github.com".to_string(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct AchievementStatus {
    pub id: String,
    pub title: String,
    pub description: String,
    pub earned: bool,
}

/// Fixed achievement catalog with per-record earned state.
#[must_use]
pub fn achievement_statuses(record: &ProgressRecord) -> Vec<AchievementStatus> {
    let entries: [(&str, &str, &str, bool); 4] = [
        (
            "first-lesson",
            "First Steps",
            "Complete your first lesson",
            !record.completed_lessons.is_empty(),
        ),
        (
            "quiz-master",
            "Quiz Master",
            "Complete a quiz with 80% or higher",
            !record.completed_quizzes.is_empty(),
        ),
        (
            "stage-warrior",
            "Stage Warrior",
            "Complete your first adventure stage",
            !record.completed_stages.is_empty(),
        ),
        (
            "xp-collector",
            "XP Collector",
            "Earn 500 XP",
            record.xp >= 500,
        ),
    ];

    entries
        .into_iter()
        .map(|(id, title, description, earned)| AchievementStatus {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            earned,
        })
        .collect()
}

/// Parses an RFC3339 timestamp and requires UTC (`Z`) offset.
///
/// # Errors
/// Returns [`LedgerError::Validation`] when parsing fails or an input
/// timestamp is not UTC.
pub fn parse_rfc3339_utc(value: &str) -> Result<OffsetDateTime, LedgerError> {
    let parsed = OffsetDateTime::parse(value, &time::format_description::well_known::Rfc3339)
        .map_err(|err| LedgerError::Validation(format!("invalid RFC3339 timestamp: {err}")))?;

    if parsed.offset() != UtcOffset::UTC {
        return Err(LedgerError::Validation(
            "timestamp MUST use UTC offset Z".to_string(),
        ));
    }

    Ok(parsed)
}

/// Formats a timestamp as RFC3339 after normalizing to UTC.
///
/// # Errors
/// Returns [`LedgerError::Serialization`] when formatting fails.
pub fn format_rfc3339(value: OffsetDateTime) -> Result<String, LedgerError> {
    value
        .to_offset(UtcOffset::UTC)
        .format(&time::format_description::well_known::Rfc3339)
        .map_err(|err| {
            LedgerError::Serialization(format!("failed to format RFC3339 timestamp: {err}"))
        })
}

#[must_use]
pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(UtcOffset::UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn must_ok<T, E: std::fmt::Display>(result: Result<T, E>) -> T {
        match result {
            Ok(value) => value,
            Err(err) => panic!("expected Ok(..), got error: {err}"),
        }
    }

    fn record_with(lessons: usize, quizzes: usize, stages: usize) -> ProgressRecord {
        let mut record = ProgressRecord::default();
        for index in 0..lessons {
            record.complete_lesson(&format!("lesson-{index}"), 0);
        }
        for index in 0..quizzes {
            record.complete_quiz(&format!("quiz-{index}"), 0);
        }
        for index in 0..stages {
            record.complete_stage(&format!("stage-{index}"), 0);
        }
        record
    }

    #[test]
    fn level_tracks_xp_in_hundreds() {
        let mut record = ProgressRecord::default();
        for amount in [0, 30, 69, 1, 250, 99] {
            record.grant_xp(amount);
            assert_eq!(record.level, record.xp / 100 + 1);
            must_ok(record.validate());
        }
    }

    #[test]
    fn lesson_completion_grants_reward_once() {
        let mut record = ProgressRecord::default();
        assert_eq!(
            record.complete_lesson("html-basics", 50),
            CompletionOutcome::Applied
        );
        assert_eq!(record.xp, 50);
        assert_eq!(record.level, 1);
        assert_eq!(record.completed_lessons, vec!["html-basics".to_string()]);

        // Repeat is a pure no-op even with a different reward.
        assert_eq!(
            record.complete_lesson("html-basics", 75),
            CompletionOutcome::AlreadyComplete
        );
        assert_eq!(record.xp, 50);
        assert_eq!(record.completed_lessons.len(), 1);

        record.grant_xp(60);
        assert_eq!(record.xp, 110);
        assert_eq!(record.level, 2);
    }

    #[test]
    fn badges_never_grant_xp() {
        let mut record = ProgressRecord::default();
        assert_eq!(record.award_badge("early-bird"), CompletionOutcome::Applied);
        assert_eq!(
            record.award_badge("early-bird"),
            CompletionOutcome::AlreadyComplete
        );
        assert_eq!(record.xp, 0);
        assert_eq!(record.badges, vec!["early-bird".to_string()]);
    }

    #[test]
    fn xp_to_next_level_counts_down_within_bucket() {
        let mut record = ProgressRecord::default();
        record.grant_xp(130);
        assert_eq!(record.level, 2);
        assert_eq!(record.xp_to_next_level(), 70);
        assert!((record.xp_progress_percent() - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn eligibility_needs_two_lessons_or_any_quiz_or_stage() {
        assert!(!ProgressRecord::default().is_certificate_eligible());
        assert!(!record_with(1, 0, 0).is_certificate_eligible());
        assert!(record_with(2, 0, 0).is_certificate_eligible());
        assert!(record_with(0, 1, 0).is_certificate_eligible());
        assert!(record_with(0, 0, 1).is_certificate_eligible());
    }

    #[test]
    fn tier_checks_run_in_descending_order() {
        assert_eq!(
            CertificateTier::for_record(&record_with(0, 0, 5)),
            CertificateTier::FullStackDeveloper
        );
        assert_eq!(
            CertificateTier::for_record(&record_with(6, 0, 3)),
            CertificateTier::FrontEndExplorer
        );
        assert_eq!(
            CertificateTier::for_record(&record_with(4, 0, 2)),
            CertificateTier::WebFundamentals
        );
        assert_eq!(
            CertificateTier::for_record(&record_with(3, 5, 0)),
            CertificateTier::JavascriptSpecialist
        );
    }

    #[test]
    fn completion_level_buckets_on_total_activities() {
        assert_eq!(
            CompletionLevel::for_record(&record_with(3, 3, 3)),
            CompletionLevel::Beginner
        );
        assert_eq!(
            CompletionLevel::for_record(&record_with(4, 3, 3)),
            CompletionLevel::Intermediate
        );
        assert_eq!(
            CompletionLevel::for_record(&record_with(5, 5, 5)),
            CompletionLevel::Advanced
        );
    }

    #[test]
    fn certificate_requires_eligibility() {
        let issued_at = must_ok(parse_rfc3339_utc("2026-08-07T12:00:00Z"));
        let ineligible = CertificateReport::generate(&ProgressRecord::default(), "Sam", issued_at);
        assert!(ineligible.is_err());

        let report = must_ok(CertificateReport::generate(
            &record_with(2, 1, 0),
            "Sam",
            issued_at,
        ));
        assert_eq!(report.tier, CertificateTier::JavascriptSpecialist);
        assert_eq!(report.tier_title, "JavaScript Specialist");
        assert_eq!(report.issued_at, "2026-08-07T12:00:00Z");
        assert_eq!(report.lessons_completed, 2);
    }

    #[test]
    fn share_urls_encode_the_summary() {
        let record = record_with(2, 0, 0);
        let summary = share_summary(&record);
        assert!(summary.contains("JavaScript Specialist"));

        let twitter = share_url(SharePlatform::Twitter, &summary);
        assert!(twitter.starts_with("https://twitter.com/intent/tweet?text="));
        assert!(!twitter.contains(' '));

        let linkedin = share_url(SharePlatform::Linkedin, &summary);
        assert!(linkedin.contains("summary="));
    }

    #[test]
    fn achievements_flip_earned_per_record() {
        let statuses = achievement_statuses(&ProgressRecord::default());
        assert_eq!(statuses.len(), 4);
        assert!(statuses.iter().all(|status| !status.earned));

        let mut record = record_with(1, 0, 0);
        record.grant_xp(500);
        let statuses = achievement_statuses(&record);
        let earned: Vec<&str> = statuses
            .iter()
            .filter(|status| status.earned)
            .map(|status| status.id.as_str())
            .collect();
        assert_eq!(earned, vec!["first-lesson", "xp-collector"]);
    }

    #[test]
    fn snapshot_shape_stays_camel_case() {
        let mut record = ProgressRecord::default();
        record.complete_lesson("html-basics", 50);
        let json = must_ok(record.to_pretty_json());
        assert!(json.contains("\"completedLessons\""));
        assert!(json.contains("\"completedQuizzes\""));
        assert!(json.contains("\"completedStages\""));

        let parsed: ProgressRecord = must_ok(serde_json::from_str(&json));
        assert_eq!(parsed, record);
    }

    #[test]
    fn validate_rejects_stale_level_and_duplicates() {
        let mut record = ProgressRecord::default();
        record.xp = 250;
        assert!(record.validate().is_err());
        record.level = 3;
        must_ok(record.validate());

        record.completed_lessons = vec!["a".to_string(), "a".to_string()];
        assert!(record.validate().is_err());
    }

    #[test]
    fn parse_rfc3339_rejects_non_utc() {
        assert!(parse_rfc3339_utc("2026-08-07T12:00:00+02:00").is_err());
        assert!(parse_rfc3339_utc("not a timestamp").is_err());
    }
}
