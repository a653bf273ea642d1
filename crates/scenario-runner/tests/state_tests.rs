use proptest::prelude::*;
use scenario_runner::{allowed_transitions, is_allowed, Stage};

const STAGES: [Stage; 8] = [
    Stage::Built,
    Stage::Filtering,
    Stage::Solving,
    Stage::Applying,
    Stage::Verifying,
    Stage::Executing,
    Stage::TornDown,
    Stage::Skipped,
];

#[test]
fn test_skip_transitions() {
    assert!(is_allowed(Stage::Built, Stage::Skipped));
    assert!(is_allowed(Stage::Filtering, Stage::Skipped));

    // Solving has already touched the world
    assert!(!is_allowed(Stage::Solving, Stage::Skipped));
}

#[test]
fn test_verification_is_optional() {
    assert!(is_allowed(Stage::Applying, Stage::Verifying));
    assert!(is_allowed(Stage::Applying, Stage::Executing));
    assert!(!is_allowed(Stage::Verifying, Stage::Applying));
}

#[test]
fn test_stage_serializes_snake_case() {
    assert_eq!(serde_json::to_value(Stage::TornDown).unwrap(), "torn_down");
}

proptest! {
    #[test]
    fn prop_every_walk_terminates(choices in prop::collection::vec(any::<prop::sample::Index>(), 0..16)) {
        let mut stage = Stage::Built;
        let mut steps = 0;
        for choice in choices {
            let next = allowed_transitions(stage);
            if next.is_empty() {
                break;
            }
            stage = next[choice.index(next.len())];
            steps += 1;
        }
        // Longest path is Built through TornDown
        prop_assert!(steps <= 6);
    }

    #[test]
    fn prop_executing_requires_setup(choices in prop::collection::vec(any::<prop::sample::Index>(), 0..16)) {
        let mut walk = vec![Stage::Built];
        for choice in choices {
            let next = allowed_transitions(*walk.last().unwrap());
            if next.is_empty() {
                break;
            }
            walk.push(next[choice.index(next.len())]);
        }
        if let Some(position) = walk.iter().position(|s| *s == Stage::Executing) {
            prop_assert!(walk[..position].contains(&Stage::Applying));
        }
    }

    #[test]
    fn prop_terminal_stages_have_no_exits(index in 0..STAGES.len()) {
        let stage = STAGES[index];
        prop_assert_eq!(stage.is_terminal(), allowed_transitions(stage).is_empty());
        prop_assert_eq!(
            stage.is_terminal(),
            matches!(stage, Stage::TornDown | Stage::Skipped)
        );
    }
}
