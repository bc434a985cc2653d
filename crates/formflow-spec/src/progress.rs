use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::answers::{AnswerSnapshot, ValidationResult};
use crate::spec::FormSchema;
use crate::validate::{ValidationOptions, needs_answer, validate_document, validate_section};
use crate::visibility::resolve;

/// Step-sequencing state of one editing session.
///
/// Transitions are pure: each returns a new state and leaves `self` alone,
/// so a failed transition never changes anything. `completed` only grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardState {
    current_step: usize,
    completed: BTreeSet<usize>,
    step_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("finish the current step first (step {0} has not been completed)")]
    StepNotCompleted(usize),
    #[error("step {requested} is not the current step {current}")]
    NotCurrentStep { requested: usize, current: usize },
    #[error("step {0} is the final step; submit instead")]
    TerminalStep(usize),
    #[error("submission is only possible from the final step (currently at {0})")]
    NotTerminalStep(usize),
    #[error("step {step} is out of range (form has {step_count} steps)")]
    OutOfRange { step: usize, step_count: usize },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WizardError {
    #[error("the step has missing or invalid answers")]
    Validation(ValidationResult),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
}

/// Answered versus required-and-visible counts for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionProgress {
    pub answered: usize,
    pub total: usize,
}

impl WizardState {
    /// Fresh session: first step current and completed.
    pub fn new(step_count: usize) -> Self {
        Self::resume(0, step_count)
    }

    /// Reopens at `index` with every step up to it completed.
    /// `index` is clamped to the last step.
    pub fn resume(index: usize, step_count: usize) -> Self {
        let current_step = index.min(step_count.saturating_sub(1));
        Self {
            current_step,
            completed: (0..=current_step).collect(),
            step_count,
        }
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn completed(&self) -> &BTreeSet<usize> {
        &self.completed
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn is_completed(&self, step: usize) -> bool {
        self.completed.contains(&step)
    }

    pub fn is_terminal(&self) -> bool {
        self.current_step + 1 >= self.step_count
    }

    /// Validates `step` and moves past it.
    pub fn advance(
        &self,
        schema: &FormSchema,
        snapshot: &AnswerSnapshot,
        step: usize,
        opts: &ValidationOptions,
    ) -> Result<Self, WizardError> {
        self.check_range(step)?;
        if step != self.current_step {
            return Err(NavigationError::NotCurrentStep {
                requested: step,
                current: self.current_step,
            }
            .into());
        }
        if self.is_terminal() {
            return Err(NavigationError::TerminalStep(step).into());
        }
        let result = validate_section(schema, snapshot, step, opts);
        if !result.valid {
            return Err(WizardError::Validation(result));
        }
        let mut next = self.clone();
        next.completed.insert(step);
        next.completed.insert(step + 1);
        next.current_step = step + 1;
        Ok(next)
    }

    /// Moves one step back from `step` without validating. Saturates at 0.
    pub fn retreat(&self, step: usize) -> Result<Self, NavigationError> {
        self.check_range(step)?;
        let mut next = self.clone();
        next.current_step = step.saturating_sub(1);
        Ok(next)
    }

    /// Jumps to an already completed step.
    pub fn jump(&self, target: usize) -> Result<Self, NavigationError> {
        self.check_range(target)?;
        if !self.completed.contains(&target) {
            return Err(NavigationError::StepNotCompleted(target));
        }
        let mut next = self.clone();
        next.current_step = target;
        Ok(next)
    }

    /// Full-document validation; only allowed from the terminal step.
    pub fn check_submit(
        &self,
        schema: &FormSchema,
        snapshot: &AnswerSnapshot,
        opts: &ValidationOptions,
    ) -> Result<(), WizardError> {
        if !self.is_terminal() {
            return Err(NavigationError::NotTerminalStep(self.current_step).into());
        }
        let result = validate_document(schema, snapshot, opts);
        if result.valid {
            Ok(())
        } else {
            Err(WizardError::Validation(result))
        }
    }

    fn check_range(&self, step: usize) -> Result<(), NavigationError> {
        if step >= self.step_count {
            return Err(NavigationError::OutOfRange {
                step,
                step_count: self.step_count,
            });
        }
        Ok(())
    }
}

pub fn section_progress(
    schema: &FormSchema,
    snapshot: &AnswerSnapshot,
    step: usize,
) -> SectionProgress {
    let Some(section) = resolve(schema, snapshot, step) else {
        return SectionProgress {
            answered: 0,
            total: 0,
        };
    };
    let required: Vec<_> = section
        .flatten()
        .into_iter()
        .filter(|field| field.required && !field.spec.is_group())
        .collect();
    let pending = required
        .iter()
        .filter(|field| needs_answer(field, snapshot))
        .count();
    SectionProgress {
        answered: required.len() - pending,
        total: required.len(),
    }
}
