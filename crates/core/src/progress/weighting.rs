//! Aggregation of per-step completion into `overall_progress`.

use ck_protocol::{GenerationStep, ProgressWeighting, StepStatus};

/// Fraction of a single step that counts as done, in `[0, 1]`.
pub fn step_fraction(step: &GenerationStep) -> f64 {
    match step.status {
        StepStatus::Completed => 1.0,
        StepStatus::InProgress | StepStatus::Error => f64::from(step.progress.min(100)) / 100.0,
        StepStatus::Pending => 0.0,
    }
}

/// True when the steps should be weighted by their estimated durations.
///
/// Duration weights apply under `Auto` only if every step declares a
/// positive estimate.
pub fn uses_duration_weights(steps: &[GenerationStep], weighting: ProgressWeighting) -> bool {
    match weighting {
        ProgressWeighting::Equal => false,
        ProgressWeighting::Auto => {
            !steps.is_empty()
                && steps
                    .iter()
                    .all(|s| s.estimated_duration_secs.is_some_and(|d| d > 0))
        }
    }
}

/// Computes aggregate progress as a percentage in `[0, 100]`.
pub fn compute_overall(steps: &[GenerationStep], weighting: ProgressWeighting) -> f64 {
    if steps.is_empty() {
        return 0.0;
    }

    let (done, total) = if uses_duration_weights(steps, weighting) {
        steps.iter().fold((0.0, 0.0), |(done, total), step| {
            let weight = f64::from(step.estimated_duration_secs.unwrap_or(0));
            (done + weight * step_fraction(step), total + weight)
        })
    } else {
        let done: f64 = steps.iter().map(step_fraction).sum();
        (done, steps.len() as f64)
    };

    if total <= 0.0 {
        return 0.0;
    }
    (100.0 * done / total).clamp(0.0, 100.0)
}

/// Sum of declared estimates, if every step declares one.
pub fn declared_total_secs(steps: &[GenerationStep]) -> Option<f64> {
    if steps.is_empty() {
        return None;
    }
    steps
        .iter()
        .map(|s| s.estimated_duration_secs.filter(|d| *d > 0).map(f64::from))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(status: StepStatus, progress: u8, estimate: Option<u32>) -> GenerationStep {
        let mut step = GenerationStep::pending("s", "Step").with_estimate(estimate);
        step.status = status;
        step.progress = progress;
        step
    }

    #[test]
    fn test_equal_weights_two_of_three() {
        let steps = vec![
            step(StepStatus::Completed, 100, None),
            step(StepStatus::Completed, 100, None),
            step(StepStatus::Pending, 0, None),
        ];
        let overall = compute_overall(&steps, ProgressWeighting::Auto);
        assert!((overall - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_in_progress_counts_partially() {
        let steps = vec![
            step(StepStatus::Completed, 100, None),
            step(StepStatus::InProgress, 50, None),
        ];
        assert!((compute_overall(&steps, ProgressWeighting::Auto) - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_duration_weights_need_every_estimate() {
        let partial = vec![
            step(StepStatus::Completed, 100, Some(90)),
            step(StepStatus::Pending, 0, None),
        ];
        assert!(!uses_duration_weights(&partial, ProgressWeighting::Auto));
        assert!((compute_overall(&partial, ProgressWeighting::Auto) - 50.0).abs() < 1e-9);

        let full = vec![
            step(StepStatus::Completed, 100, Some(90)),
            step(StepStatus::Pending, 0, Some(10)),
        ];
        assert!(uses_duration_weights(&full, ProgressWeighting::Auto));
        assert!((compute_overall(&full, ProgressWeighting::Auto) - 90.0).abs() < 1e-9);
        assert!((compute_overall(&full, ProgressWeighting::Equal) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_declared_total() {
        let steps = vec![
            step(StepStatus::Pending, 0, Some(30)),
            step(StepStatus::Pending, 0, Some(60)),
        ];
        assert_eq!(declared_total_secs(&steps), Some(90.0));
        let missing = vec![step(StepStatus::Pending, 0, Some(30)), step(StepStatus::Pending, 0, None)];
        assert_eq!(declared_total_secs(&missing), None);
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(compute_overall(&[], ProgressWeighting::Auto), 0.0);
    }
}
