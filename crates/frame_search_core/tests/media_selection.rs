use std::path::PathBuf;
use std::sync::Once;

use frame_search_core::{
    update, validate, AppState, Effect, Msg, Rejected, Selection, SelectionView,
    MAX_DURATION_SECS,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(client_logging::initialize_for_tests);
}

fn pick(state: AppState, path: &str) -> (AppState, u64) {
    let (state, effects) = update(state, Msg::MediaPicked(PathBuf::from(path)));
    let generation = match effects.as_slice() {
        [Effect::ProbeDuration { generation, path: probed }] => {
            assert_eq!(probed, &PathBuf::from(path));
            *generation
        }
        other => panic!("expected a single probe effect, got {other:?}"),
    };
    (state, generation)
}

fn probed(state: AppState, generation: u64, result: Result<f64, String>) -> AppState {
    let (state, effects) = update(state, Msg::MediaProbed { generation, result });
    assert!(effects.is_empty());
    state
}

#[test]
fn durations_over_the_limit_never_validate() {
    for duration in [180.001, 181.0, 600.0, f64::INFINITY] {
        let result = validate(PathBuf::from("long.mp4"), duration);
        assert!(result.is_err(), "duration {duration} must be rejected");
    }
}

#[test]
fn durations_within_the_limit_wrap_the_same_file() {
    for duration in [0.0, 1.5, 179.99, MAX_DURATION_SECS] {
        let media = validate(PathBuf::from("/videos/short.mp4"), duration).unwrap();
        assert_eq!(media.path(), PathBuf::from("/videos/short.mp4").as_path());
        assert_eq!(media.duration_secs(), duration);
    }
}

#[test]
fn picking_a_file_starts_probing() {
    init_logging();
    let (mut state, generation) = pick(AppState::new(), "clip.mp4");

    assert_eq!(generation, 1);
    assert_eq!(
        state.view().selection,
        SelectionView::Probing {
            file_name: "clip.mp4".to_string()
        }
    );
    assert!(state.view().busy);
    assert!(state.consume_dirty());
}

#[test]
fn short_video_becomes_validated_selection() {
    init_logging();
    let (state, generation) = pick(AppState::new(), "clip.mp4");
    let state = probed(state, generation, Ok(42.0));

    match state.selection() {
        Selection::Ready(media) => {
            assert_eq!(media.path(), PathBuf::from("clip.mp4").as_path());
            assert_eq!(media.duration_secs(), 42.0);
        }
        other => panic!("expected ready selection, got {other:?}"),
    }
    assert!(state.view().alert.is_none());
    assert!(!state.view().busy);
}

#[test]
fn long_video_is_rejected_with_warning_and_cleared() {
    init_logging();
    let (state, generation) = pick(AppState::new(), "long.mp4");
    let state = probed(state, generation, Ok(181.0));

    assert_eq!(state.selection(), &Selection::Empty);
    assert_eq!(
        state.view().alert.as_deref(),
        Some("The video is longer than 3 minutes and cannot be uploaded.")
    );
}

#[test]
fn rejection_drops_a_previously_validated_selection() {
    init_logging();
    let (state, generation) = pick(AppState::new(), "short.mp4");
    let state = probed(state, generation, Ok(30.0));
    let (state, generation) = pick(state, "long.mp4");
    let state = probed(state, generation, Ok(400.0));

    assert_eq!(state.selection(), &Selection::Empty);
}

#[test]
fn metadata_failure_is_reported_instead_of_hanging() {
    init_logging();
    let (state, generation) = pick(AppState::new(), "corrupt.mp4");
    let state = probed(state, generation, Err("moov atom not found".to_string()));

    assert_eq!(state.selection(), &Selection::Empty);
    let alert = state.view().alert.expect("alert");
    assert!(alert.contains("moov atom not found"), "{alert}");
    assert!(!state.view().busy);
}

#[test]
fn last_selection_wins_over_late_probe() {
    init_logging();
    let (state, first) = pick(AppState::new(), "first.mp4");
    let (state, second) = pick(state, "second.mp4");
    assert_ne!(first, second);

    // The earlier probe resolves after the second pick and must be ignored.
    let mut state = probed(state, first, Ok(10.0));
    assert!(matches!(state.selection(), Selection::Probing { .. }));
    state.consume_dirty();

    let state = probed(state, second, Ok(20.0));
    match state.selection() {
        Selection::Ready(media) => {
            assert_eq!(media.path(), PathBuf::from("second.mp4").as_path())
        }
        other => panic!("expected ready selection, got {other:?}"),
    }
}

#[test]
fn stale_probe_does_not_mark_dirty() {
    init_logging();
    let (state, first) = pick(AppState::new(), "first.mp4");
    let (mut state, _second) = pick(state, "second.mp4");
    state.consume_dirty();

    let mut state = probed(state, first, Ok(500.0));
    assert!(!state.consume_dirty());
    assert!(state.view().alert.is_none());
}

#[test]
fn repick_while_ready_discards_old_validated_media() {
    init_logging();
    let (state, generation) = pick(AppState::new(), "first.mp4");
    let state = probed(state, generation, Ok(10.0));
    let (state, _) = pick(state, "second.mp4");

    assert!(matches!(state.selection(), Selection::Probing { .. }));
}

#[test]
fn rejected_reasons_are_distinguishable() {
    let too_long = validate(PathBuf::from("a.mp4"), 200.0).unwrap_err();
    assert_eq!(
        too_long,
        Rejected::TooLong {
            duration_secs: 200.0,
            limit_secs: MAX_DURATION_SECS
        }
    );
    let negative = validate(PathBuf::from("a.mp4"), -1.0).unwrap_err();
    assert!(matches!(negative, Rejected::Unreadable { .. }));
}
