use std::path::PathBuf;

use ck_protocol::{Complexity, ContentType, QuickAction, QuizType};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "curriculum",
    version,
    about = "Generate lesson material step by step, one lesson or a whole course at a time"
)]
pub struct Cli {
    /// Project directory containing `.curriculum-kit/`.
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Without a subcommand the interactive TUI starts.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a starter `.curriculum-kit/` directory.
    Init(InitArgs),
    /// Generate one lesson.
    Run(RunArgs),
    /// Generate a subset of content for one lesson.
    Quick(QuickArgs),
    /// Generate a lesson per title for a course.
    Batch(BatchArgs),
    /// Start the interactive TUI.
    Tui,
}

#[derive(Args, Debug, Clone)]
pub struct InitArgs {
    /// Overwrite existing files.
    #[arg(long, default_value_t = false)]
    pub force: bool,

    /// Only write the config, the offline generator and the standard lesson
    /// pipeline.
    #[arg(long, default_value_t = false)]
    pub minimal: bool,
}

/// Lesson parameters shared by `run`, `quick` and `batch`.
#[derive(Args, Debug, Clone)]
pub struct LessonArgs {
    #[arg(long)]
    pub audience: String,

    #[arg(long, default_value = "")]
    pub subject: String,

    /// e.g. "45 minutes" or "1.5h".
    #[arg(long, default_value = "")]
    pub duration: String,

    #[arg(long, default_value = "intermediate")]
    pub complexity: Complexity,

    #[arg(long = "objective")]
    pub objectives: Vec<String>,

    /// Built-in type (slides, instructor-notes, worksheet, quiz,
    /// activity-guide) or a custom name.
    #[arg(long = "content-type")]
    pub content_types: Vec<ContentType>,

    #[arg(long = "quiz-type")]
    pub quiz_types: Vec<QuizType>,

    /// Print the result as JSON instead of a summary.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(long)]
    pub topic: String,

    /// Pipeline template from `.curriculum-kit/pipelines/`.
    #[arg(long)]
    pub template: Option<String>,

    #[command(flatten)]
    pub lesson: LessonArgs,
}

#[derive(Args, Debug, Clone)]
pub struct QuickArgs {
    /// slides-only, assessment-suite, learning-objectives or complete-package.
    pub action: QuickAction,

    #[arg(long)]
    pub topic: String,

    #[command(flatten)]
    pub lesson: LessonArgs,
}

#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    #[arg(long)]
    pub course: String,

    /// Lesson title, also used as its topic. Repeat for each lesson.
    #[arg(long = "lesson", required = true)]
    pub lessons: Vec<String>,

    /// Generate lessons concurrently.
    #[arg(long)]
    pub parallel: bool,

    #[arg(long)]
    pub max_jobs: Option<usize>,

    /// Stop at the first failed lesson.
    #[arg(long)]
    pub stop_on_error: bool,

    #[arg(long)]
    pub max_retries: Option<u32>,

    #[command(flatten)]
    pub lesson: LessonArgs,
}
