mod common;

use std::collections::BTreeSet;

use formflow_spec::{
    AnswerSnapshot, NavigationError, SectionOrdinals, WizardError, WizardState, infer_resume_point,
    section_progress,
};
use proptest::prelude::*;
use serde_json::json;

#[test]
fn new_session_starts_on_first_step() {
    let state = WizardState::new(6);
    assert_eq!(state.current_step(), 0);
    assert_eq!(state.completed(), &BTreeSet::from([0]));
}

#[test]
fn advance_validates_and_marks_next_step() {
    let schema = common::visa_schema();
    let state = WizardState::new(schema.step_count());

    let err = state
        .advance(&schema, &AnswerSnapshot::new(), 0, &common::opts())
        .unwrap_err();
    let WizardError::Validation(result) = err else {
        panic!("expected validation failure");
    };
    assert!(result.mentions("personal.surname"));

    let next = state
        .advance(&schema, &common::complete_snapshot(), 0, &common::opts())
        .expect("personal step is complete");
    assert_eq!(next.current_step(), 1);
    assert_eq!(next.completed(), &BTreeSet::from([0, 1]));
    assert_eq!(state.current_step(), 0, "original state untouched");
}

#[test]
fn advance_only_from_current_non_terminal_step() {
    let schema = common::visa_schema();
    let snapshot = common::complete_snapshot();
    let opts = common::opts();

    let state = WizardState::new(schema.step_count());
    let err = state.advance(&schema, &snapshot, 2, &opts).unwrap_err();
    assert_eq!(
        err,
        WizardError::Navigation(NavigationError::NotCurrentStep { requested: 2, current: 0 })
    );

    let last = WizardState::resume(schema.terminal_step(), schema.step_count());
    let err = last.advance(&schema, &snapshot, 5, &opts).unwrap_err();
    assert_eq!(
        err,
        WizardError::Navigation(NavigationError::TerminalStep(5))
    );
}

#[test]
fn retreat_keeps_completed_steps() {
    let state = WizardState::resume(3, 6);
    let back = state.retreat(3).expect("retreat");
    assert_eq!(back.current_step(), 2);
    assert_eq!(back.completed(), state.completed());
    let first = WizardState::new(6).retreat(0).expect("retreat");
    assert_eq!(first.current_step(), 0);
    assert!(matches!(
        state.retreat(9),
        Err(NavigationError::OutOfRange { step: 9, step_count: 6 })
    ));
}

#[test]
fn jump_requires_completed_target() {
    let state = WizardState::resume(2, 6);
    assert_eq!(state.jump(1).expect("completed").current_step(), 1);
    assert_eq!(state.jump(4), Err(NavigationError::StepNotCompleted(4)));
}

#[test]
fn submit_check_runs_from_terminal_step_only() {
    let schema = common::visa_schema();
    let opts = common::opts();
    let snapshot = common::complete_snapshot();

    let err = WizardState::resume(4, 6)
        .check_submit(&schema, &snapshot, &opts)
        .unwrap_err();
    assert_eq!(
        err,
        WizardError::Navigation(NavigationError::NotTerminalStep(4))
    );

    let terminal = WizardState::resume(5, 6);
    terminal
        .check_submit(&schema, &snapshot, &opts)
        .expect("complete document");

    let mut answers = common::complete_answers();
    answers["nationality"]["us_ssn_na"] = json!(false);
    let err = terminal
        .check_submit(&schema, &AnswerSnapshot::from(answers), &opts)
        .unwrap_err();
    assert!(
        matches!(err, WizardError::Validation(result) if result.mentions("nationality.us_ssn"))
    );
}

#[test]
fn resume_opens_at_last_touched_section() {
    let schema = common::visa_schema();
    let snapshot = AnswerSnapshot::from(json!({
        "personal": {"surname": "Doe"},
        "nationality": {"nationality": "Freedonia"},
        "travel": {"purpose_category": "B"},
        "companions": {"has_companions": "N"},
        "passport": {}
    }));
    let index = infer_resume_point(&snapshot, &SectionOrdinals::from_schema(&schema));
    assert_eq!(index, 3);

    let state = WizardState::resume(index, schema.step_count());
    assert_eq!(state.current_step(), 3);
    assert_eq!(state.completed(), &BTreeSet::from([0, 1, 2, 3]));
}

#[test]
fn progress_counts_required_visible_fields() {
    let schema = common::visa_schema();
    let snapshot = AnswerSnapshot::from(json!({
        "personal": {"surname": "Doe", "full_name_native_na": true}
    }));
    let progress = section_progress(&schema, &snapshot, 0);
    assert_eq!(progress.total, 6);
    assert_eq!(progress.answered, 1);
}

proptest! {
    #[test]
    fn jump_changes_state_iff_target_completed(resume_at in 0usize..6, target in 0usize..6) {
        let state = WizardState::resume(resume_at, 6);
        match state.jump(target) {
            Ok(next) => {
                prop_assert!(state.is_completed(target));
                prop_assert_eq!(next.current_step(), target);
                prop_assert_eq!(next.completed(), state.completed());
            }
            Err(err) => {
                prop_assert!(!state.is_completed(target));
                prop_assert_eq!(err, NavigationError::StepNotCompleted(target));
            }
        }
    }

    #[test]
    fn completed_never_shrinks(moves in proptest::collection::vec(0usize..3, 0..30)) {
        let schema = common::visa_schema();
        let snapshot = common::complete_snapshot();
        let opts = common::opts();
        let mut state = WizardState::new(schema.step_count());
        for kind in moves {
            let before = state.completed().clone();
            let current = state.current_step();
            let next = match kind {
                0 => state.advance(&schema, &snapshot, current, &opts).ok(),
                1 => state.retreat(current).ok(),
                _ => state.jump(current.saturating_sub(2)).ok(),
            };
            if let Some(next) = next {
                state = next;
            }
            prop_assert!(state.completed().is_superset(&before));
        }
    }
}
