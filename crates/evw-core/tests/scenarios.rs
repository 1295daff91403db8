//! Concrete windowing scenarios: last-write-wins batches, window triggers, boundary inclusion

use evw_core::{
    run_windower, CollectSink, CountWindowConfig, Event, EventColumns, FixedCountWindower,
    FixedTimeWindower, Resolution, SlidingTimeWindower, SlidingWindowConfig, TimeWindowConfig,
    WindowError, WindowPolicy, WindowSpan, Windower,
};

fn grid(w: u32, h: u32) -> Resolution {
    Resolution::new(w, h).expect("resolution")
}

#[test]
fn fixed_count_last_write_wins() {
    // (x, y, ts, pol) with the timestamp unused by this policy
    let columns = EventColumns::new(vec![0, 1, 0], vec![0, 1, 0], vec![0.0, 0.0, 0.0], vec![1, 0, 0])
        .expect("columns");
    let mut windower =
        FixedCountWindower::new(grid(2, 2), CountWindowConfig::new(3).unwrap()).unwrap();
    let mut sink = CollectSink::new();
    run_windower(&mut windower, columns.events().unwrap(), &mut sink).expect("run");

    assert_eq!(sink.len(), 1);
    let frame = &sink.frames()[0].frame;
    assert_eq!(frame.on.active_cells().collect::<Vec<_>>(), vec![(0, 0)]);
    assert_eq!(frame.off.active_cells().collect::<Vec<_>>(), vec![(0, 0), (1, 1)]);
}

#[test]
fn fixed_time_trigger_contains_only_earlier_events() {
    let events = vec![Event::on(0, 0, 5.0), Event::off(1, 0, 9.0), Event::on(2, 0, 15.0)];
    for config in [
        TimeWindowConfig::new(10.0).unwrap(),
        TimeWindowConfig::reference(10.0).unwrap(),
    ] {
        let mut windower = FixedTimeWindower::new(grid(4, 1), config).unwrap();
        let mut sink = CollectSink::new();
        for ev in &events {
            windower.push(*ev, &mut sink).unwrap();
        }

        assert_eq!(sink.len(), 1, "only the event at 15 closes a window");
        let first = &sink.frames()[0];
        assert_eq!(first.info.events, 2);
        assert!(first.frame.on.is_active(0, 0));
        assert!(first.frame.off.is_active(1, 0));
        assert!(!first.frame.on.is_active(2, 0));
    }
}

#[test]
fn boundary_timestamp_is_inclusive() {
    let events = vec![Event::on(0, 0, 10.0), Event::on(1, 0, 20.0), Event::on(2, 0, 20.5)];
    let mut windower =
        FixedTimeWindower::new(grid(3, 1), TimeWindowConfig::new(10.0).unwrap()).unwrap();
    let mut sink = CollectSink::new();
    run_windower(&mut windower, events, &mut sink).unwrap();

    let cells: Vec<Vec<(u32, u32)>> = sink
        .frames()
        .iter()
        .map(|f| f.frame.on.active_cells().collect())
        .collect();
    assert_eq!(cells, vec![vec![(0, 0)], vec![(1, 0)], vec![(2, 0)]]);
}

#[test]
fn final_time_window_flush_is_configurable() {
    let events = vec![Event::on(0, 0, 1.0), Event::on(1, 0, 2.0)];
    let policy = WindowPolicy::FixedTime(TimeWindowConfig::new(10.0).unwrap());
    let mut sink = CollectSink::new();
    policy.run(grid(2, 1), events.clone(), &mut sink).unwrap();
    assert_eq!(sink.len(), 1);

    let policy = WindowPolicy::FixedTime(TimeWindowConfig::new(10.0).unwrap().with_flush_final(false));
    let mut sink = CollectSink::new();
    policy.run(grid(2, 1), events, &mut sink).unwrap();
    assert!(sink.is_empty());
}

#[test]
fn empty_stream_emits_nothing_for_every_policy() {
    for policy in [
        WindowPolicy::FixedCount(CountWindowConfig::default()),
        WindowPolicy::FixedTime(TimeWindowConfig::default()),
        WindowPolicy::SlidingTime(SlidingWindowConfig::default()),
    ] {
        let mut sink = CollectSink::new();
        let summary = policy.run(grid(304, 240), Vec::new(), &mut sink).unwrap();
        assert_eq!(summary.windows_emitted, 0);
        assert!(sink.is_empty());
    }
}

#[test]
fn out_of_bounds_fails_fast_for_every_policy() {
    let events = vec![Event::on(0, 0, 1.0), Event::on(4, 0, 2.0), Event::on(1, 0, 3.0)];
    for policy in [
        WindowPolicy::FixedCount(CountWindowConfig::new(1).unwrap()),
        WindowPolicy::FixedTime(TimeWindowConfig::new(1.0).unwrap()),
        WindowPolicy::SlidingTime(SlidingWindowConfig::new(1.0, 1.0, 1.0).unwrap()),
    ] {
        let mut sink = CollectSink::new();
        let err = policy.run(grid(4, 4), events.clone(), &mut sink).unwrap_err();
        assert!(
            matches!(err, WindowError::OutOfBounds { index: 1, x: 4, y: 0, width: 4, height: 4 }),
            "{}: unexpected {err}",
            policy.name()
        );
    }
}

#[test]
fn mismatched_columns_rejected_before_windowing() {
    let columns = EventColumns {
        x: vec![0, 1],
        y: vec![0, 1],
        ts: vec![0.0, 1.0],
        pol: vec![1],
    };
    assert!(matches!(
        columns.events(),
        Err(WindowError::LengthMismatch { column: "pol", expected: 2, found: 1 })
    ));
}

#[test]
fn sliding_reference_walkthrough() {
    // 300ms window, horizon at 400ms, advancing by 100ms
    let config = SlidingWindowConfig::reference(300.0, 100.0, 100.0).unwrap();
    let mut windower = SlidingTimeWindower::new(grid(8, 8), config).unwrap();
    let mut sink = CollectSink::new();

    let events = [
        Event::on(0, 0, 50.0),
        Event::off(1, 1, 250.0),
        Event::on(2, 2, 360.0),  // slide: evicts the event at 50
        Event::on(3, 3, 420.0),  // past 400: emit, dropped
        Event::on(4, 4, 480.0),  // slide within the new 500 horizon
    ];
    for ev in events {
        windower.push(ev, &mut sink).unwrap();
    }

    assert_eq!(sink.len(), 1);
    let emitted = &sink.frames()[0];
    assert!(!emitted.frame.on.is_active(0, 0));
    assert!(emitted.frame.off.is_active(1, 1));
    assert!(emitted.frame.on.is_active(2, 2));
    assert_eq!(emitted.info.events, 2);
    assert_eq!(emitted.info.span, WindowSpan::Time { start: 60.0, end: 360.0 });

    assert_eq!(windower.horizon(), 500.0);
    assert!(!windower.frame().on.is_active(3, 3));
    assert!(windower.frame().on.is_active(4, 4));
    let queued: Vec<f64> = windower.queue().iter().map(|e| e.timestamp).collect();
    assert_eq!(queued, vec![250.0, 360.0, 480.0]);
}
