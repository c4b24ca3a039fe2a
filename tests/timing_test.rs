use beatcore::chart::compiler::{beat_duration, compile, judgement_time, measure_duration};
use beatcore::chart::{BeatEvent, BeatPosition, ChartDocument};

fn chart(bpm: u32, beats_per_measure: u32, events: Vec<BeatEvent>) -> ChartDocument {
    ChartDocument::with_events(bpm, 8, beats_per_measure, 2.0, events)
}

#[test]
fn test_reference_durations() {
    // bpm=120, 8 beats/measure: beat 0.5s, measure 4.0s.
    assert!((beat_duration(120) - 0.5).abs() < 1e-9);
    assert!((measure_duration(120, 8) - 4.0).abs() < 1e-9);
}

#[test]
fn test_tap_time_round_trip() {
    let position = BeatPosition::new(1, 0);
    assert!((judgement_time(position, 120, 8) - 4.0).abs() < 1e-9);

    let doc = chart(120, 8, vec![BeatEvent::tap(1, 0)]);
    let notes = compile(&doc);
    assert!((notes[0].judgement_time - 4.0).abs() < 1e-9);
    assert!((notes[0].spawn_time - 2.0).abs() < 1e-9);
}

#[test]
fn test_hold_duration() {
    let doc = chart(120, 8, vec![BeatEvent::hold(0, 2, 6)]);
    let notes = compile(&doc);
    let note = &notes[0];
    assert!((note.hold_duration.unwrap() - 2.0).abs() < 1e-9);
    assert!((note.hold_end_time.unwrap() - (note.judgement_time + 2.0)).abs() < 1e-9);
}

#[test]
fn test_compile_orders_by_judgement_time() {
    let doc = chart(
        150,
        4,
        vec![
            BeatEvent::tap(3, 1),
            BeatEvent::tap(0, 2),
            BeatEvent::hold(1, 0, 2),
            BeatEvent::tap(0, 0),
        ],
    );
    let notes = compile(&doc);
    let times: Vec<f64> = notes.iter().map(|n| n.judgement_time).collect();
    assert!(times.windows(2).all(|w| w[0] <= w[1]));
    let ids: Vec<u32> = notes.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![3, 1, 2, 0]);
}

#[test]
fn test_spawn_time_tracks_drop_time() {
    for drop_time in [0.5, 2.0, 5.0] {
        let doc = ChartDocument::with_events(120, 8, 8, drop_time, vec![BeatEvent::tap(2, 4)]);
        let notes = compile(&doc);
        assert!((notes[0].judgement_time - notes[0].spawn_time - drop_time).abs() < 1e-9);
    }
}
