//! Step planning for lesson workflows.
//!
//! Without a template, a lesson is planned as: refine objectives, one step
//! per requested content type, optional answer-key and rubric steps, then a
//! final review.

use std::collections::HashSet;

use ck_protocol::{ContentType, GenerationConfig, PipelineTemplate, QuickAction, StepDefinition};

pub const OBJECTIVES_STEP: &str = "objectives";
pub const ANSWER_KEYS_STEP: &str = "answer_keys";
pub const RUBRICS_STEP: &str = "rubrics";
pub const REVIEW_STEP: &str = "review";

/// Estimated generation time for one content type, in seconds.
pub fn estimate_for(content_type: &ContentType) -> u32 {
    match content_type {
        ContentType::Slides => 90,
        ContentType::InstructorNotes => 60,
        ContentType::Worksheet => 60,
        ContentType::Quiz => 75,
        ContentType::ActivityGuide => 60,
        ContentType::Custom(_) => 60,
    }
}

pub fn content_step(content_type: &ContentType) -> StepDefinition {
    StepDefinition::new(content_type.key(), format!("Generate {}", content_type.label()))
        .with_content_type(content_type.clone())
        .with_estimate(estimate_for(content_type))
}

fn objectives_step() -> StepDefinition {
    StepDefinition::new(OBJECTIVES_STEP, "Refine learning objectives")
        .with_description("Turn the requested objectives into measurable outcomes")
        .with_estimate(20)
}

/// Content types in request order. Types that map to the same step id are
/// kept once, so `Custom("Lab Report")` and `Custom("lab report")` plan a
/// single step.
fn distinct(content_types: &[ContentType]) -> Vec<ContentType> {
    let mut keys = HashSet::with_capacity(content_types.len());
    content_types
        .iter()
        .filter(|content_type| keys.insert(content_type.key()))
        .cloned()
        .collect()
}

/// Default plan for a lesson.
pub fn plan_steps(config: &GenerationConfig) -> Vec<StepDefinition> {
    let mut content_types = distinct(&config.content_types);
    let options = &config.additional_options;
    if options.include_instructor_guides && !content_types.contains(&ContentType::InstructorNotes) {
        content_types.push(ContentType::InstructorNotes);
    }

    let mut steps = vec![objectives_step()];
    steps.extend(content_types.iter().map(content_step));

    let assessed = content_types
        .iter()
        .any(|c| matches!(c, ContentType::Quiz | ContentType::Worksheet));
    if options.include_answer_keys && assessed {
        steps.push(
            StepDefinition::new(ANSWER_KEYS_STEP, "Write answer keys")
                .with_description("Answer keys for quizzes and worksheets")
                .with_estimate(30),
        );
    }
    if options.rubrics {
        steps.push(
            StepDefinition::new(RUBRICS_STEP, "Build grading rubrics")
                .with_estimate(30),
        );
    }

    steps.push(
        StepDefinition::new(REVIEW_STEP, "Review and package")
            .with_description("Check consistency across all generated material")
            .with_estimate(15),
    );
    steps
}

pub fn plan_from_template(template: &PipelineTemplate) -> Vec<StepDefinition> {
    template.steps.clone()
}

/// Ad-hoc plan for a quick action.
pub fn plan_quick_action(action: QuickAction, config: &GenerationConfig) -> Vec<StepDefinition> {
    match action {
        QuickAction::LearningObjectives => vec![objectives_step()],
        _ => distinct(&action.content_types(config))
            .iter()
            .map(content_step)
            .collect(),
    }
}
