use super::LevelTracker;
use crate::domain::models::CefrLevel;
use crate::domain::models::LevelUp;

fn observe_all(levels: &[&str]) -> Vec<LevelUp> {
    let mut tracker = LevelTracker::default();
    return levels
        .iter()
        .filter_map(|level| return tracker.observe(level, None))
        .collect();
}

#[test]
fn it_fires_once_per_increase() {
    let events = observe_all(&["A1", "A2", "A2", "B1"]);
    assert_eq!(
        events,
        vec![
            LevelUp {
                from: CefrLevel::A1,
                to: CefrLevel::A2,
            },
            LevelUp {
                from: CefrLevel::A2,
                to: CefrLevel::B1,
            },
        ]
    );
}

#[test]
fn it_seeds_from_unknown_without_firing() {
    assert!(observe_all(&["unknown", "A1"]).is_empty());
    assert!(observe_all(&["C1"]).is_empty());
}

#[test]
fn it_stores_decreases_silently() {
    let mut tracker = LevelTracker::default();
    assert_eq!(tracker.observe("B1", Some(2)), None);
    assert_eq!(tracker.observe("A1", Some(4)), None);
    assert_eq!(tracker.current_level(), Some(CefrLevel::A1));
    assert_eq!(tracker.steps_to_next_level(), Some(4));

    assert_eq!(
        tracker.observe("A2", None),
        Some(LevelUp {
            from: CefrLevel::A1,
            to: CefrLevel::A2,
        })
    );
    assert_eq!(tracker.steps_to_next_level(), Some(4));
}

#[test]
fn it_fires_for_jumps_across_levels() {
    let events = observe_all(&["a1", " c1 "]);
    assert_eq!(
        events,
        vec![LevelUp {
            from: CefrLevel::A1,
            to: CefrLevel::C1,
        }]
    );
}

#[test]
fn it_never_treats_unknown_levels_as_increases() {
    assert!(observe_all(&["B2", "expert"]).is_empty());
    assert!(observe_all(&["B2", "expert", "C1"]).is_empty());
}

#[test]
fn it_restores_persisted_levels() {
    let mut tracker = LevelTracker::restore(Some("A2"), Some(1));
    assert_eq!(tracker.current_level(), Some(CefrLevel::A2));
    assert_eq!(tracker.steps_to_next_level(), Some(1));

    assert_eq!(
        tracker.observe("B1", Some(5)),
        Some(LevelUp {
            from: CefrLevel::A2,
            to: CefrLevel::B1,
        })
    );
}
