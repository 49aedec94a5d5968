//! Ergonomic testing utilities for reducers
//!
//! This module provides a fluent API for testing reducers with readable Given-When-Then syntax.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use fetch_middleware_core::{Action, Reducer};

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// Actions are applied in order, which makes it easy to replay a request
/// lifecycle:
///
/// ```ignore
/// use fetch_middleware_testing::ReducerTest;
///
/// ReducerTest::new(TodoReducer)
///     .given_state(TodoState::default())
///     .when_action(Action::new(action_type_started("TODOS_GET")))
///     .when_action(Action::new(action_type_success("TODOS_GET")).with_payload(json!([])))
///     .then_state(|state| {
///         assert!(!state.loading);
///     })
///     .run();
/// ```
pub struct ReducerTest<R, S>
where
    R: Reducer<State = S>,
{
    reducer: R,
    initial_state: Option<S>,
    actions: Vec<Action>,
    state_assertions: Vec<StateAssertion<S>>,
}

impl<R, S> ReducerTest<R, S>
where
    R: Reducer<State = S>,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            initial_state: None,
            actions: Vec::new(),
            state_assertions: Vec::new(),
        }
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Add an action to apply (When)
    #[must_use]
    pub fn when_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Add several actions to apply in order (When)
    #[must_use]
    pub fn when_actions(mut self, actions: impl IntoIterator<Item = Action>) -> Self {
        self.actions.extend(actions);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state or actions are not set,
    /// or if any assertions fail.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        assert!(
            !self.actions.is_empty(),
            "At least one action must be set with when_action()"
        );

        for action in &self.actions {
            self.reducer.reduce(&mut state, action);
        }

        for assertion in self.state_assertions {
            assertion(&state);
        }
    }
}

/// Helper assertions for recorded action sequences
pub mod assertions {
    use fetch_middleware_core::{
        Action, action_type_failure, action_type_started, action_type_success,
    };

    /// Assert the recorded action types, in order
    ///
    /// # Panics
    ///
    /// Panics if the types differ.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_action_types(actions: &[Action], expected: &[&str]) {
        let types: Vec<&str> = actions.iter().map(|a| a.action_type.as_str()).collect();
        assert_eq!(types, expected, "Unexpected action sequence");
    }

    /// Assert a complete request lifecycle for `action_type`
    ///
    /// The original action, then exactly one STARTED, then exactly one
    /// terminal action, in that order. Returns the terminal action.
    ///
    /// # Panics
    ///
    /// Panics if the lifecycle is incomplete, duplicated or out of order.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_lifecycle<'a>(actions: &'a [Action], action_type: &str) -> &'a Action {
        let started = action_type_started(action_type);
        let success = action_type_success(action_type);
        let failure = action_type_failure(action_type);

        let positions = |t: &str| -> Vec<usize> {
            actions
                .iter()
                .enumerate()
                .filter(|(_, a)| a.action_type == t)
                .map(|(i, _)| i)
                .collect()
        };

        let original = positions(action_type);
        let starts = positions(&started);
        let mut terminals = positions(&success);
        terminals.extend(positions(&failure));

        assert_eq!(original.len(), 1, "Expected the original {action_type} once");
        assert_eq!(starts.len(), 1, "Expected exactly one {started}");
        assert_eq!(
            terminals.len(),
            1,
            "Expected exactly one of {success} / {failure}"
        );
        assert!(
            original[0] < starts[0] && starts[0] < terminals[0],
            "Expected {action_type} < {started} < terminal, got positions {} / {} / {}",
            original[0],
            starts[0],
            terminals[0]
        );

        &actions[terminals[0]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetch_middleware_core::{action_type_started, action_type_success};
    use serde_json::json;

    #[derive(Clone, Debug, Default)]
    struct TestState {
        loading: bool,
        body: Option<serde_json::Value>,
    }

    struct TestReducer;

    impl Reducer for TestReducer {
        type State = TestState;

        fn reduce(&self, state: &mut Self::State, action: &Action) {
            if action.action_type == action_type_started("FOO") {
                state.loading = true;
            } else if action.action_type == action_type_success("FOO") {
                state.loading = false;
                state.body.clone_from(&action.payload);
            }
        }
    }

    #[test]
    fn test_reducer_test_started() {
        ReducerTest::new(TestReducer)
            .given_state(TestState::default())
            .when_action(Action::new(action_type_started("FOO")))
            .then_state(|state| {
                assert!(state.loading);
            })
            .run();
    }

    #[test]
    fn test_reducer_test_lifecycle() {
        ReducerTest::new(TestReducer)
            .given_state(TestState::default())
            .when_actions([
                Action::new(action_type_started("FOO")),
                Action::new(action_type_success("FOO")).with_payload(json!("OK!")),
            ])
            .then_state(|state| {
                assert!(!state.loading);
                assert_eq!(state.body, Some(json!("OK!")));
            })
            .run();
    }

    #[test]
    fn test_assert_lifecycle_returns_terminal() {
        let actions = vec![
            Action::new("FOO"),
            Action::new("@api/FOO/STARTED"),
            Action::new("@api/FOO/SUCCESS").with_payload(json!(1)),
        ];
        let terminal = assertions::assert_lifecycle(&actions, "FOO");
        assert_eq!(terminal.payload, Some(json!(1)));
    }

    #[test]
    #[should_panic(expected = "Expected exactly one")]
    fn test_assert_lifecycle_rejects_double_terminal() {
        let actions = vec![
            Action::new("FOO"),
            Action::new("@api/FOO/STARTED"),
            Action::new("@api/FOO/SUCCESS"),
            Action::new("@api/FOO/FAILURE"),
        ];
        let _ = assertions::assert_lifecycle(&actions, "FOO");
    }
}
