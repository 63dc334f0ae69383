//! Lesson generation request models.
//!
//! These mirror the parameters collected by the authoring wizard and passed
//! to the orchestrator when a workflow is created.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

/// Kind of artifact a generation step produces.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Slides,
    InstructorNotes,
    Worksheet,
    Quiz,
    ActivityGuide,
    /// User-defined content type, identified by name.
    Custom(String),
}

impl ContentType {
    /// The five built-in content types, in the order a full package
    /// generates them.
    pub fn standard() -> Vec<ContentType> {
        vec![
            ContentType::Slides,
            ContentType::InstructorNotes,
            ContentType::Worksheet,
            ContentType::Quiz,
            ContentType::ActivityGuide,
        ]
    }

    /// Key used for step ids and file names.
    pub fn key(&self) -> String {
        match self {
            ContentType::Slides => "slides".to_string(),
            ContentType::InstructorNotes => "instructor_notes".to_string(),
            ContentType::Worksheet => "worksheet".to_string(),
            ContentType::Quiz => "quiz".to_string(),
            ContentType::ActivityGuide => "activity_guide".to_string(),
            ContentType::Custom(name) => format!("custom_{}", name.to_lowercase().replace(' ', "_")),
        }
    }

    pub fn label(&self) -> String {
        match self {
            ContentType::Slides => "Slides".to_string(),
            ContentType::InstructorNotes => "Instructor Notes".to_string(),
            ContentType::Worksheet => "Worksheet".to_string(),
            ContentType::Quiz => "Quiz".to_string(),
            ContentType::ActivityGuide => "Activity Guide".to_string(),
            ContentType::Custom(name) => name.clone(),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for ContentType {
    type Err = String;

    /// Built-in names are matched case-insensitively with `-`, `_` or spaces
    /// as separators; anything else becomes a custom type.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("content type must not be empty".to_string());
        }
        let normalized = trimmed.to_lowercase().replace(['-', ' '], "_");
        Ok(match normalized.as_str() {
            "slides" => ContentType::Slides,
            "instructor_notes" | "notes" => ContentType::InstructorNotes,
            "worksheet" => ContentType::Worksheet,
            "quiz" => ContentType::Quiz,
            "activity_guide" | "activities" => ContentType::ActivityGuide,
            _ => ContentType::Custom(trimmed.to_string()),
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Basic,
    #[default]
    Intermediate,
    Advanced,
}

impl FromStr for Complexity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" | "beginner" => Ok(Complexity::Basic),
            "intermediate" => Ok(Complexity::Intermediate),
            "advanced" => Ok(Complexity::Advanced),
            other => Err(format!("unknown complexity '{other}'")),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "snake_case")]
pub enum QuizType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
    Essay,
    FillInTheBlank,
    Matching,
}

impl FromStr for QuizType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "multiple_choice" => Ok(QuizType::MultipleChoice),
            "true_false" => Ok(QuizType::TrueFalse),
            "short_answer" => Ok(QuizType::ShortAnswer),
            "essay" => Ok(QuizType::Essay),
            "fill_in_the_blank" => Ok(QuizType::FillInTheBlank),
            "matching" => Ok(QuizType::Matching),
            other => Err(format!("unknown quiz type '{other}'")),
        }
    }
}

/// Optional extras requested alongside the main content.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, TS)]
#[serde(default)]
pub struct AdditionalOptions {
    pub include_answer_keys: bool,
    pub include_instructor_guides: bool,
    pub accessibility: bool,
    pub rubrics: bool,
    pub extensions: bool,
}

/// Parameters for generating one lesson.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct GenerationConfig {
    pub topic: String,

    pub audience: String,

    #[serde(default)]
    pub subject: String,

    /// Lesson length as entered by the author, e.g. "50 minutes".
    #[serde(default)]
    pub duration: String,

    #[serde(default)]
    pub complexity: Complexity,

    #[serde(default)]
    pub learning_objectives: Vec<String>,

    #[serde(default)]
    pub content_types: Vec<ContentType>,

    #[serde(default)]
    pub quiz_types: Vec<QuizType>,

    #[serde(default)]
    pub additional_options: AdditionalOptions,
}

impl GenerationConfig {
    /// Minimal config for a topic and audience; everything else defaulted.
    pub fn new(topic: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            audience: audience.into(),
            subject: String::new(),
            duration: String::new(),
            complexity: Complexity::default(),
            learning_objectives: Vec::new(),
            content_types: Vec::new(),
            quiz_types: Vec::new(),
            additional_options: AdditionalOptions::default(),
        }
    }

    pub fn with_content_types(mut self, content_types: Vec<ContentType>) -> Self {
        self.content_types = content_types;
        self
    }
}

/// A shortcut that generates a subset of content without the full pipeline.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "snake_case")]
pub enum QuickAction {
    SlidesOnly,
    AssessmentSuite,
    LearningObjectives,
    CompletePackage,
}

impl QuickAction {
    pub fn all() -> [QuickAction; 4] {
        [
            QuickAction::SlidesOnly,
            QuickAction::AssessmentSuite,
            QuickAction::LearningObjectives,
            QuickAction::CompletePackage,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QuickAction::SlidesOnly => "slides_only",
            QuickAction::AssessmentSuite => "assessment_suite",
            QuickAction::LearningObjectives => "learning_objectives",
            QuickAction::CompletePackage => "complete_package",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QuickAction::SlidesOnly => "Slides only",
            QuickAction::AssessmentSuite => "Assessment suite",
            QuickAction::LearningObjectives => "Learning objectives",
            QuickAction::CompletePackage => "Complete package",
        }
    }

    /// Content types this action generates for the given config.
    ///
    /// `LearningObjectives` produces no content artifacts; its only step is
    /// the objectives step itself.
    pub fn content_types(self, config: &GenerationConfig) -> Vec<ContentType> {
        match self {
            QuickAction::SlidesOnly => vec![ContentType::Slides],
            QuickAction::AssessmentSuite => vec![ContentType::Quiz, ContentType::Worksheet],
            QuickAction::LearningObjectives => Vec::new(),
            QuickAction::CompletePackage => {
                if config.content_types.is_empty() {
                    ContentType::standard()
                } else {
                    config.content_types.clone()
                }
            }
        }
    }
}

impl fmt::Display for QuickAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuickAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        QuickAction::all()
            .into_iter()
            .find(|action| action.as_str() == normalized)
            .ok_or_else(|| format!("unknown quick action '{s}'"))
    }
}

/// A piece of generated content.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct GeneratedArtifact {
    /// `None` for artifacts not tied to a content type (objectives, review notes).
    #[serde(default)]
    pub content_type: Option<ContentType>,
    pub title: String,
    pub body: String,
}

/// Outcome of a quick action.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct QuickActionResult {
    pub action: QuickAction,
    pub success: bool,
    pub artifacts: Vec<GeneratedArtifact>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Suggestions for improving imported content.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, TS)]
#[serde(default)]
pub struct EnhancementSuggestions {
    pub content: Vec<String>,
    pub structural: Vec<String>,
    pub pedagogical: Vec<String>,
    pub priorities: Vec<String>,
}
