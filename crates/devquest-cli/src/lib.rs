//! Embeddable DevQuest command surface.
//!
//! Host runtimes (and the `dq` binary) drive the ledger through:
//! - [`run_cli`] for full parsed CLI execution.
//! - [`run_command`] for direct [`Command`] execution against an open
//!   [`ProgressLedger`].
//!
//! Every screen of the learning platform maps to a command group here;
//! rendering beyond plain tables and `--json` contracts is out of scope.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use devquest_core::{
    achievement_statuses, catalog, now_utc, quiz::QuizSession, share_summary, share_url,
    AchievementStatus, CertificateReport, CompletionLevel, CompletionOutcome, ProgressRecord,
    SharePlatform,
};
use devquest_store_sqlite::{ProgressLedger, SnapshotSource};
use serde::{Deserialize, Serialize};

const EXPORT_DEFAULT_FILENAME: &str = "devquest-progress.json";

#[derive(Debug, Parser)]
#[command(name = "dq")]
#[command(about = "DevQuest interactive learning CLI")]
pub struct Cli {
    #[arg(long, default_value = "./devquest.sqlite3")]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Progress {
        #[command(subcommand)]
        command: ProgressCommand,
    },
    Lesson {
        #[command(subcommand)]
        command: LessonCommand,
    },
    Quiz {
        #[command(subcommand)]
        command: QuizCommand,
    },
    Stage {
        #[command(subcommand)]
        command: StageCommand,
    },
    Badge {
        #[command(subcommand)]
        command: BadgeCommand,
    },
    Certificate {
        #[command(subcommand)]
        command: CertificateCommand,
    },
    Achievements {
        #[command(subcommand)]
        command: AchievementsCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProgressCommand {
    Show(ProgressShowArgs),
    Export(ProgressExportArgs),
    GrantXp(GrantXpArgs),
}

#[derive(Debug, Args)]
pub struct ProgressShowArgs {
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
pub struct ProgressExportArgs {
    #[arg(long, default_value = EXPORT_DEFAULT_FILENAME)]
    output: PathBuf,
}

#[derive(Debug, Args)]
pub struct GrantXpArgs {
    #[arg(long)]
    amount: u64,
}

#[derive(Debug, Subcommand)]
pub enum LessonCommand {
    List(ListArgs),
    Complete(CompleteArgs),
}

#[derive(Debug, Subcommand)]
pub enum QuizCommand {
    Questions(ListArgs),
    Take(QuizTakeArgs),
}

#[derive(Debug, Args)]
pub struct QuizTakeArgs {
    /// Selected option index per question, in question order.
    #[arg(long = "answer", value_name = "INDEX")]
    answers: Vec<usize>,

    #[arg(long)]
    json: bool,
}

#[derive(Debug, Subcommand)]
pub enum StageCommand {
    List(ListArgs),
    Complete(CompleteArgs),
}

#[derive(Debug, Subcommand)]
pub enum BadgeCommand {
    Award(BadgeAwardArgs),
}

#[derive(Debug, Args)]
pub struct BadgeAwardArgs {
    #[arg(long)]
    label: String,
}

#[derive(Debug, Subcommand)]
pub enum CertificateCommand {
    Show(CertificateShowArgs),
    Share(CertificateShareArgs),
}

#[derive(Debug, Args)]
pub struct CertificateShowArgs {
    #[arg(long, default_value = "DevQuest Learner")]
    name: String,

    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
pub struct CertificateShareArgs {
    #[arg(long)]
    platform: SharePlatformArg,

    #[arg(long)]
    json: bool,
}

#[derive(Debug, Subcommand)]
pub enum AchievementsCommand {
    List(ListArgs),
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
pub struct CompleteArgs {
    #[arg(long)]
    id: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SharePlatformArg {
    Linkedin,
    Twitter,
    Github,
}

/// Executes the parsed top-level CLI command graph.
///
/// # Errors
/// Returns an error when the store cannot be opened or migrated, or the
/// requested command fails.
pub fn run_cli(cli: Cli) -> Result<()> {
    let mut ledger = ProgressLedger::open(&cli.db)?;
    if ledger.snapshot_source() == SnapshotSource::DiscardedMalformed {
        eprintln!("warning: discarded malformed progress snapshot, starting from defaults");
    }
    run_command(cli.command, &mut ledger)
}

/// Executes a parsed command against an existing ledger.
///
/// # Errors
/// Returns an error when input validation, catalog lookup, or the
/// persistence write fails.
pub fn run_command(command: Command, ledger: &mut ProgressLedger) -> Result<()> {
    match command {
        Command::Progress { command } => run_progress(command, ledger),
        Command::Lesson { command } => run_lesson(command, ledger),
        Command::Quiz { command } => run_quiz(command, ledger),
        Command::Stage { command } => run_stage(command, ledger),
        Command::Badge { command } => run_badge(command, ledger),
        Command::Certificate { command } => run_certificate(command, ledger),
        Command::Achievements { command } => run_achievements(command, ledger),
    }
}

fn run_progress(command: ProgressCommand, ledger: &mut ProgressLedger) -> Result<()> {
    match command {
        ProgressCommand::Show(args) => {
            let payload = build_progress_report(ledger)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print_progress_report(&payload);
            }
            Ok(())
        }
        ProgressCommand::Export(args) => {
            let serialized = ledger.export_snapshot()?;
            std::fs::write(&args.output, &serialized).with_context(|| {
                format!(
                    "failed writing progress snapshot to {}",
                    args.output.display()
                )
            })?;
            println!("exported progress snapshot to {}", args.output.display());
            Ok(())
        }
        ProgressCommand::GrantXp(args) => {
            ledger.grant_xp(args.amount)?;
            println!("{}", ledger.export_snapshot()?);
            Ok(())
        }
    }
}

fn run_lesson(command: LessonCommand, ledger: &mut ProgressLedger) -> Result<()> {
    match command {
        LessonCommand::List(args) => {
            let lessons: Vec<LessonEntry> = catalog::lessons()
                .iter()
                .map(|lesson| LessonEntry {
                    id: lesson.id.to_string(),
                    title: lesson.title.to_string(),
                    summary: lesson.summary.to_string(),
                    category: lesson.category.as_str().to_string(),
                    difficulty: lesson.difficulty.as_str().to_string(),
                    xp_reward: lesson.xp_reward,
                    completed: ledger
                        .record()
                        .completed_lessons
                        .iter()
                        .any(|id| id == lesson.id),
                })
                .collect();

            if args.json {
                let payload = LessonListPayload {
                    contract_version: "lesson_list.v1".to_string(),
                    lessons,
                };
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print_lesson_table(&lessons);
            }
            Ok(())
        }
        LessonCommand::Complete(args) => {
            let lesson = catalog::lesson_by_id(&args.id)
                .ok_or_else(|| anyhow!("unknown lesson id: {}", args.id))?;
            let outcome = ledger.complete_lesson(lesson.id, lesson.xp_reward)?;
            print_completion(CompletionKind::Lesson, lesson.id, lesson.xp_reward, outcome, ledger)
        }
    }
}

fn run_quiz(command: QuizCommand, ledger: &mut ProgressLedger) -> Result<()> {
    match command {
        QuizCommand::Questions(args) => {
            let questions: Vec<QuizQuestionEntry> = catalog::quiz_questions()
                .iter()
                .map(|question| QuizQuestionEntry {
                    id: question.id.to_string(),
                    prompt: question.prompt.to_string(),
                    options: question
                        .options
                        .iter()
                        .map(|option| (*option).to_string())
                        .collect(),
                })
                .collect();

            if args.json {
                let payload = QuizQuestionsPayload {
                    contract_version: "quiz_questions.v1".to_string(),
                    quiz_id: catalog::QUIZ_ID.to_string(),
                    questions,
                };
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print_quiz_questions(&questions);
            }
            Ok(())
        }
        QuizCommand::Take(args) => {
            let questions = catalog::quiz_questions();
            if args.answers.len() != questions.len() {
                return Err(anyhow!(
                    "expected {} answers (one --answer per question), got {}",
                    questions.len(),
                    args.answers.len()
                ));
            }

            let mut session = QuizSession::new(questions.to_vec())?;
            for (position, answer) in args.answers.iter().enumerate() {
                session
                    .select_answer(*answer)
                    .map_err(|err| anyhow!("question {}: {err}", position + 1))?;
                session.advance();
            }

            if !session.is_finished() {
                return Err(anyhow!("quiz session did not finish"));
            }

            let xp_earned = session.xp_earned();
            let completion = ledger.complete_quiz(catalog::QUIZ_ID, xp_earned)?;

            let review: Vec<QuizReviewEntry> = questions
                .iter()
                .zip(session.answers())
                .map(|(question, selected)| QuizReviewEntry {
                    id: question.id.to_string(),
                    selected: *selected,
                    correct_index: question.correct_index,
                    correct: *selected == question.correct_index,
                    explanation: question.explanation.to_string(),
                })
                .collect();

            let payload = QuizResultPayload {
                contract_version: "quiz_result.v1".to_string(),
                quiz_id: catalog::QUIZ_ID.to_string(),
                total_questions: session.total_questions(),
                correct: session.correct_count(),
                score_percent: session.score_percent(),
                xp_earned,
                completion,
                xp: ledger.record().xp,
                level: ledger.record().level,
                review,
            };

            if args.json {
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print_quiz_result(&payload);
            }
            Ok(())
        }
    }
}

fn run_stage(command: StageCommand, ledger: &mut ProgressLedger) -> Result<()> {
    match command {
        StageCommand::List(args) => {
            let record = ledger.record();
            let stages: Vec<StageEntry> = catalog::stages()
                .iter()
                .enumerate()
                .map(|(index, stage)| StageEntry {
                    id: stage.id.to_string(),
                    title: stage.title.to_string(),
                    description: stage.description.to_string(),
                    xp_reward: stage.xp_reward,
                    tasks: stage.tasks.iter().map(|task| (*task).to_string()).collect(),
                    unlocked: catalog::is_stage_unlocked(catalog::stages(), index, record),
                    completed: record.completed_stages.iter().any(|id| id == stage.id),
                })
                .collect();

            if args.json {
                let payload = StageListPayload {
                    contract_version: "stage_list.v1".to_string(),
                    stages,
                };
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print_stage_table(&stages);
            }
            Ok(())
        }
        StageCommand::Complete(args) => {
            let stage = catalog::stage_by_id(&args.id)
                .ok_or_else(|| anyhow!("unknown stage id: {}", args.id))?;
            let index = catalog::stage_index(&args.id)
                .ok_or_else(|| anyhow!("unknown stage id: {}", args.id))?;

            if !catalog::is_stage_unlocked(catalog::stages(), index, ledger.record()) {
                let previous = catalog::stages()[index - 1].id;
                return Err(anyhow!(
                    "stage {} is locked; complete {previous} first",
                    args.id
                ));
            }

            let outcome = ledger.complete_stage(stage.id, stage.xp_reward)?;
            print_completion(CompletionKind::Stage, stage.id, stage.xp_reward, outcome, ledger)
        }
    }
}

fn run_badge(command: BadgeCommand, ledger: &mut ProgressLedger) -> Result<()> {
    match command {
        BadgeCommand::Award(args) => {
            let outcome = ledger.award_badge(&args.label)?;
            print_completion(CompletionKind::Badge, &args.label, 0, outcome, ledger)
        }
    }
}

fn run_certificate(command: CertificateCommand, ledger: &mut ProgressLedger) -> Result<()> {
    match command {
        CertificateCommand::Show(args) => {
            let report = CertificateReport::generate(ledger.record(), &args.name, now_utc())?;
            if args.json {
                let payload = CertificatePayload {
                    contract_version: "certificate_report.v1".to_string(),
                    certificate: report,
                };
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print_certificate(&report);
            }
            Ok(())
        }
        CertificateCommand::Share(args) => {
            if !ledger.record().is_certificate_eligible() {
                return Err(anyhow!(
                    "record is not eligible for a certificate yet: complete at least \
                     two lessons, one quiz, or one adventure stage"
                ));
            }

            let platform = map_platform(args.platform);
            let summary = share_summary(ledger.record());
            let url = share_url(platform, &summary);

            if args.json {
                let payload = ShareLinkPayload {
                    contract_version: "share_link.v1".to_string(),
                    platform,
                    summary,
                    url,
                };
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("{summary}");
                println!();
                println!("{url}");
            }
            Ok(())
        }
    }
}

fn run_achievements(command: AchievementsCommand, ledger: &ProgressLedger) -> Result<()> {
    match command {
        AchievementsCommand::List(args) => {
            let achievements = achievement_statuses(ledger.record());
            if args.json {
                let payload = AchievementListPayload {
                    contract_version: "achievement_list.v1".to_string(),
                    achievements,
                };
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print_achievement_table(&achievements);
            }
            Ok(())
        }
    }
}

fn map_platform(value: SharePlatformArg) -> SharePlatform {
    match value {
        SharePlatformArg::Linkedin => SharePlatform::Linkedin,
        SharePlatformArg::Twitter => SharePlatform::Twitter,
        SharePlatformArg::Github => SharePlatform::Github,
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum CompletionKind {
    Lesson,
    Quiz,
    Stage,
    Badge,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ProgressReportPayload {
    contract_version: String,
    record: ProgressRecord,
    revision: i64,
    snapshot_source: SnapshotSource,
    xp_to_next_level: u64,
    xp_progress_percent: f64,
    certificate_eligible: bool,
    completion_level: CompletionLevel,
}

#[derive(Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct CompletionPayload {
    contract_version: String,
    kind: CompletionKind,
    id: String,
    outcome: CompletionOutcome,
    xp_reward: u64,
    xp: u64,
    level: u64,
}

#[derive(Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct LessonEntry {
    id: String,
    title: String,
    summary: String,
    category: String,
    difficulty: String,
    xp_reward: u64,
    completed: bool,
}

#[derive(Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct LessonListPayload {
    contract_version: String,
    lessons: Vec<LessonEntry>,
}

#[derive(Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct QuizQuestionEntry {
    id: String,
    prompt: String,
    options: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct QuizQuestionsPayload {
    contract_version: String,
    quiz_id: String,
    questions: Vec<QuizQuestionEntry>,
}

#[derive(Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct QuizReviewEntry {
    id: String,
    selected: usize,
    correct_index: usize,
    correct: bool,
    explanation: String,
}

#[derive(Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct QuizResultPayload {
    contract_version: String,
    quiz_id: String,
    total_questions: usize,
    correct: usize,
    score_percent: u64,
    xp_earned: u64,
    completion: CompletionOutcome,
    xp: u64,
    level: u64,
    review: Vec<QuizReviewEntry>,
}

#[derive(Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct StageEntry {
    id: String,
    title: String,
    description: String,
    xp_reward: u64,
    tasks: Vec<String>,
    unlocked: bool,
    completed: bool,
}

#[derive(Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct StageListPayload {
    contract_version: String,
    stages: Vec<StageEntry>,
}

#[derive(Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct CertificatePayload {
    contract_version: String,
    certificate: CertificateReport,
}

#[derive(Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct ShareLinkPayload {
    contract_version: String,
    platform: SharePlatform,
    summary: String,
    url: String,
}

#[derive(Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct AchievementListPayload {
    contract_version: String,
    achievements: Vec<AchievementStatus>,
}

fn build_progress_report(ledger: &ProgressLedger) -> Result<ProgressReportPayload> {
    let record = ledger.record();
    Ok(ProgressReportPayload {
        contract_version: "progress_report.v1".to_string(),
        record: record.clone(),
        revision: ledger.revision()?,
        snapshot_source: ledger.snapshot_source(),
        xp_to_next_level: record.xp_to_next_level(),
        xp_progress_percent: record.xp_progress_percent(),
        certificate_eligible: record.is_certificate_eligible(),
        completion_level: CompletionLevel::for_record(record),
    })
}

fn print_completion(
    kind: CompletionKind,
    id: &str,
    xp_reward: u64,
    outcome: CompletionOutcome,
    ledger: &ProgressLedger,
) -> Result<()> {
    let payload = CompletionPayload {
        contract_version: "completion.v1".to_string(),
        kind,
        id: id.to_string(),
        outcome,
        xp_reward,
        xp: ledger.record().xp,
        level: ledger.record().level,
    };
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn print_progress_report(payload: &ProgressReportPayload) {
    println!(
        "xp={} level={} xp_to_next_level={} progress={:.1}%",
        payload.record.xp,
        payload.record.level,
        payload.xp_to_next_level,
        payload.xp_progress_percent
    );
    println!(
        "lessons={} quizzes={} stages={} badges={} certificate_eligible={} completion_level={}",
        payload.record.completed_lessons.len(),
        payload.record.completed_quizzes.len(),
        payload.record.completed_stages.len(),
        payload.record.badges.len(),
        if payload.certificate_eligible {
            "yes"
        } else {
            "no"
        },
        payload.completion_level.as_str()
    );
    println!(
        "revision={} snapshot_source={}",
        payload.revision,
        payload.snapshot_source.as_str()
    );
}

fn print_lesson_table(lessons: &[LessonEntry]) {
    println!(
        "{:<14} {:<26} {:<12} {:<13} {:<5} completed",
        "id", "title", "category", "difficulty", "xp"
    );
    println!("{}", "-".repeat(86));
    for lesson in lessons {
        println!(
            "{:<14} {:<26} {:<12} {:<13} {:<5} {}",
            lesson.id,
            lesson.title,
            lesson.category,
            lesson.difficulty,
            lesson.xp_reward,
            if lesson.completed { "yes" } else { "no" }
        );
    }
}

fn print_quiz_questions(questions: &[QuizQuestionEntry]) {
    for (index, question) in questions.iter().enumerate() {
        println!("{}. [{}] {}", index + 1, question.id, question.prompt);
        for (option_index, option) in question.options.iter().enumerate() {
            println!("   {option_index}) {option}");
        }
    }
}

fn print_quiz_result(payload: &QuizResultPayload) {
    for (index, entry) in payload.review.iter().enumerate() {
        println!(
            "{}. [{}] answered {} ({}), correct answer {}",
            index + 1,
            entry.id,
            entry.selected,
            if entry.correct { "correct" } else { "wrong" },
            entry.correct_index
        );
        if !entry.correct {
            println!("   {}", entry.explanation);
        }
    }
    println!("{}", "-".repeat(60));
    println!(
        "score={}/{} ({}%) xp_earned={} completion={}",
        payload.correct,
        payload.total_questions,
        payload.score_percent,
        payload.xp_earned,
        payload.completion.as_str()
    );
    println!("xp={} level={}", payload.xp, payload.level);
}

fn print_stage_table(stages: &[StageEntry]) {
    println!(
        "{:<8} {:<28} {:<5} {:<9} completed",
        "id", "title", "xp", "unlocked"
    );
    println!("{}", "-".repeat(64));
    for stage in stages {
        println!(
            "{:<8} {:<28} {:<5} {:<9} {}",
            stage.id,
            stage.title,
            stage.xp_reward,
            if stage.unlocked { "yes" } else { "no" },
            if stage.completed { "yes" } else { "no" }
        );
    }
}

fn print_certificate(report: &CertificateReport) {
    println!("certificate_id={}", report.certificate_id);
    println!("holder={}", report.holder_name);
    println!(
        "title={} completion_level={}",
        report.tier_title,
        report.completion_level.as_str()
    );
    println!(
        "xp={} level={} lessons={} quizzes={} stages={}",
        report.xp,
        report.level,
        report.lessons_completed,
        report.quizzes_completed,
        report.stages_completed
    );
    println!("issued_at={}", report.issued_at);
}

fn print_achievement_table(achievements: &[AchievementStatus]) {
    println!("{:<14} {:<16} {:<7} description", "id", "title", "earned");
    println!("{}", "-".repeat(78));
    for achievement in achievements {
        println!(
            "{:<14} {:<16} {:<7} {}",
            achievement.id,
            achievement.title,
            if achievement.earned { "yes" } else { "no" },
            achievement.description
        );
    }
}
