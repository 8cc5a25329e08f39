use ndarray::{array, Array2};

use crate::agent::update_rule::{argmax_rows, evaluate_batch, gather, td_targets};
use crate::agent::{DoubleQ, UpdateRule, VanillaQ};
use crate::batch::TransitionBatch;
use crate::error::DdqnError;
use super::bias_network;

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-6
}

fn one_transition(action: usize, reward: f32, done: f32) -> TransitionBatch {
    TransitionBatch {
        states: array![[0.0]],
        actions: array![action],
        rewards: array![reward],
        next_states: array![[0.0]],
        dones: array![done],
    }
}

#[test]
fn test_td_targets_example() {
    let targets = td_targets(
        array![1.0, 2.0].view(),
        array![0.0, 1.0].view(),
        array![5.0, 3.0].view(),
        0.9,
    )
    .unwrap();
    assert!(close(targets[0], 5.5));
    assert_eq!(targets[1], 2.0);
}

#[test]
fn test_terminal_target_is_reward_even_for_non_finite_values() {
    let targets = td_targets(
        array![0.5, -1.0, 3.0].view(),
        array![1.0, 1.0, 1.0].view(),
        array![f32::NAN, f32::INFINITY, f32::NEG_INFINITY].view(),
        0.99,
    )
    .unwrap();
    assert_eq!(targets, array![0.5, -1.0, 3.0]);
}

#[test]
fn test_td_targets_length_mismatch() {
    let err = td_targets(array![1.0].view(), array![0.0, 0.0].view(), array![1.0].view(), 0.9).unwrap_err();
    assert!(matches!(err, DdqnError::ShapeMismatch { .. }));
}

#[test]
fn test_argmax_rows() {
    let values = array![[1.0, 3.0, 2.0], [5.0, 5.0, 1.0], [f32::NAN, 0.0, -1.0]];
    assert_eq!(argmax_rows(values.view()), array![1, 0, 1]);
}

#[test]
fn test_gather() {
    let values = array![[1.0, 2.0], [3.0, 4.0]];
    assert_eq!(gather(values.view(), array![1, 0].view()).unwrap(), array![2.0, 3.0]);
    assert_eq!(
        gather(values.view(), array![2, 0].view()),
        Err(DdqnError::InvalidAction { action: 2, max_actions: 2 })
    );
    assert!(gather(values.view(), array![0].view()).is_err());
}

#[test]
fn test_double_q_decouples_selection_from_evaluation() {
    // Online prefers action 0, target prefers action 1
    let online = bias_network(array![1.0, 0.0]);
    let target = bias_network(array![2.0, 10.0]);
    let next_states = Array2::<f32>::zeros((1, 1));

    let double = DoubleQ.bootstrap_values(&online, &target, next_states.view()).unwrap();
    assert_eq!(double, array![2.0]);

    let vanilla = VanillaQ.bootstrap_values(&online, &target, next_states.view()).unwrap();
    assert_eq!(vanilla, array![10.0]);
}

#[test]
fn test_double_q_target_uses_target_value_at_online_action() {
    let mut online = bias_network(array![1.0, 0.0]);
    let target = bias_network(array![2.0, 10.0]);
    let batch = one_transition(0, 1.0, 0.0);

    let evaluation = evaluate_batch(&DoubleQ, &mut online, &target, &batch, 0.5).unwrap();
    assert!(close(evaluation.targets[0], 2.0));
    assert!(close(evaluation.predictions[0], 1.0));
    assert!(close(evaluation.loss, 1.0));
    // 2 * (prediction - target) / B, only at the stored action
    assert_eq!(evaluation.output_gradient, array![[-2.0, 0.0]]);
}

#[test]
fn test_evaluate_batch_terminal_ignores_bootstrap() {
    let mut online = bias_network(array![1.0, 0.0]);
    let target = bias_network(array![f32::NAN, f32::NAN]);
    let batch = one_transition(1, 0.0, 1.0);

    let evaluation = evaluate_batch(&DoubleQ, &mut online, &target, &batch, 0.99).unwrap();
    assert_eq!(evaluation.targets, array![0.0]);
    assert_eq!(evaluation.loss, 0.0);
    assert_eq!(evaluation.output_gradient, array![[0.0, 0.0]]);
}

#[test]
fn test_evaluate_batch_rejects_bad_batches() {
    let mut online = bias_network(array![1.0, 0.0]);
    let target = bias_network(array![1.0, 0.0]);

    let mut ragged = one_transition(0, 1.0, 0.0);
    ragged.states = array![[0.0], [1.0]];
    assert!(matches!(
        evaluate_batch(&DoubleQ, &mut online, &target, &ragged, 0.9),
        Err(DdqnError::ShapeMismatch { .. })
    ));

    let out_of_range = one_transition(2, 1.0, 0.0);
    assert_eq!(
        evaluate_batch(&DoubleQ, &mut online, &target, &out_of_range, 0.9).unwrap_err(),
        DdqnError::InvalidAction { action: 2, max_actions: 2 }
    );
}

#[test]
fn test_rule_names() {
    assert_eq!(DoubleQ.name(), "double_dqn");
    assert_eq!(VanillaQ.name(), "dqn");
}
