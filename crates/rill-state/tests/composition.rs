//! Cross-container composition scenarios: projections of projections,
//! merges of projections, and write round-trips through the whole stack.

use rill_state::{
    MergedState, NewValue, State, StateContainer, StateContainerExt, SubState, ValueContainer,
};
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug, PartialEq)]
struct Session {
    user: User,
    theme: String,
}

#[derive(Clone, Debug, PartialEq)]
struct User {
    name: String,
    age: u32,
}

fn session() -> State<Session> {
    State::new(Session {
        user: User {
            name: "ada".to_string(),
            age: 36,
        },
        theme: "dark".to_string(),
    })
}

fn user_of(parent: State<Session>) -> SubState<State<Session>, Session, User> {
    SubState::new(
        parent,
        |session: &Session| session.user.clone(),
        |session, user| {
            Session {
                user,
                ..session.clone()
            }
            .into()
        },
    )
    .deduped()
}

fn recorded<T, C>(container: &C) -> Arc<Mutex<Vec<T>>>
where
    T: Clone + Send + 'static,
    C: ValueContainer<T>,
{
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    container.subscribe(move |v: &T| sink.lock().unwrap().push(v.clone())).detach();
    seen
}

#[test]
fn test_nested_sub_state_round_trips_to_root() {
    let root = session();
    let user = user_of(root.clone());
    let age = SubState::new(
        user.clone(),
        |user: &User| user.age,
        |user, age| {
            User {
                age,
                ..user.clone()
            }
            .into()
        },
    )
    .deduped();

    age.set(37);
    assert_eq!(root.value().user.age, 37);
    assert_eq!(user.value().age, 37);
    assert_eq!(age.value(), 37);

    root.update(|s| Session {
        user: User { age: 40, ..s.user },
        ..s
    });
    assert_eq!(age.value(), 40);
}

#[test]
fn test_deduped_sub_state_ignores_sibling_writes() {
    let root = session();
    let user = user_of(root.clone());
    let seen = recorded(&user);

    root.update(|s| Session {
        theme: "light".to_string(),
        ..s
    });
    root.update(|s| Session {
        user: User {
            age: 50,
            ..s.user
        },
        ..s
    });

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2); // replay + the user change only
    assert_eq!(seen[1].age, 50);
}

#[test]
fn test_merged_state_over_projections() {
    let root = session();
    let user = user_of(root.clone());
    let theme = SubState::new(
        root.clone(),
        |session: &Session| session.theme.clone(),
        |session, theme| {
            Session {
                theme,
                ..session.clone()
            }
            .into()
        },
    )
    .deduped();

    let header = MergedState::new(
        user,
        theme,
        |user: &User, theme: &String| format!("{} [{}]", user.name, theme),
        |merged: String| {
            let (name, theme) = merged
                .split_once(" [")
                .map(|(n, t)| (n.to_string(), t.trim_end_matches(']').to_string()))
                .unwrap_or((merged.clone(), String::new()));
            (
                User { name, age: 0 },
                theme,
            )
        },
    )
    .with_needs_feeding_first(|current: &User, next: &User| current.name != next.name)
    .deduped();

    assert_eq!(header.value(), "ada [dark]");

    let seen = recorded(&header);
    root.update(|s| Session {
        theme: "light".to_string(),
        ..s
    });
    assert_eq!(header.value(), "ada [light]");

    // The name did not change, so the age-destroying split value was never
    // fed back to the user side.
    header.set("ada [solar]".to_string());
    assert_eq!(root.value().user.age, 36);
    assert_eq!(root.value().theme, "solar");

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![
            "ada [dark]".to_string(),
            "ada [light]".to_string(),
            "ada [solar]".to_string(),
        ]
    );
}

#[test]
fn test_subscriber_writing_back_converges() {
    // A subscriber that clamps the value through a re-entrant write; the
    // queued delivery must settle without recursing.
    let root = State::new(5_i32);
    let writer = root.clone();
    root.subscribe(move |v| {
        if *v > 10 {
            writer.set_value(NewValue::value(10));
        }
    })
    .detach();

    root.set(42);
    assert_eq!(root.value(), 10);
}

#[test]
fn test_updater_sees_latest_value_through_projection() {
    let root = session();
    let user = user_of(root.clone());

    root.update(|s| Session {
        user: User { age: 99, ..s.user },
        ..s
    });
    user.update(|u| User { age: u.age + 1, ..u });
    assert_eq!(root.value().user.age, 100);
}
