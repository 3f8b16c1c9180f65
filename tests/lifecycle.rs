use std::{cell::Cell, rc::Rc, sync::Arc};

use trafficmap::{
    ArcEvent, ArcLayer, ArcLayerProps, Dataset, DriverState, FrameLoop, FrameScheduler,
    LayerConfig, LngLat, ManualScheduler, StatsStore, TickOutcome, TrafficError,
    UnavailableScheduler,
};

fn batch(n: usize) -> Dataset {
    (0..n)
        .map(|i| {
            let x = i as f64;
            ArcEvent::new(
                format!("ev{i}"),
                LngLat::new(x, 0.0),
                LngLat::new(x + 5.0, 5.0),
            )
        })
        .collect::<Vec<_>>()
        .into()
}

fn config(speed: f64, looping: bool) -> LayerConfig {
    LayerConfig {
        animation_speed: speed,
        looping,
        ..LayerConfig::default()
    }
}

#[test]
fn several_updates_in_one_frame_leave_a_single_pending_tick() {
    let sched = ManualScheduler::new();
    let mut layer = ArcLayer::with_data(
        "arcs",
        ArcLayerProps::new(config(0.1, false)),
        sched.clone(),
        batch(1),
    )
    .unwrap();
    layer.create().unwrap();
    let mut host = FrameLoop::new();
    for _ in 0..4 {
        host.step(&mut layer).unwrap();
    }
    assert!(layer.progress() > 0.3);

    for n in 2..5 {
        assert!(layer.on_data_changed(Some(batch(n))).unwrap());
        assert_eq!(layer.progress(), 0.0);
    }
    assert_eq!(sched.pending_len(), 1);

    let report = host.step(&mut layer).unwrap();
    assert!(matches!(report.outcome, TickOutcome::Advanced { progress } if (progress - 0.1).abs() < 1e-12));
    assert_eq!(report.frame.unwrap().points().count(), 4);
}

#[test]
fn cancelled_tick_delivered_late_is_ignored() {
    let mut sched = ManualScheduler::new();
    let mut layer = ArcLayer::with_data(
        "arcs",
        ArcLayerProps::new(config(0.5, false)),
        sched.clone(),
        batch(1),
    )
    .unwrap();
    layer.create().unwrap();
    let old = sched.pending()[0];
    layer.on_data_changed(Some(batch(2))).unwrap();

    assert_eq!(layer.on_tick(old), TickOutcome::Stale);
    assert_eq!(layer.progress(), 0.0);

    // A handle the layer never asked for.
    let foreign = sched.request_tick().unwrap();
    assert_eq!(layer.on_tick(foreign), TickOutcome::Stale);
}

#[test]
fn completion_callback_fires_once_per_cycle() {
    let fired = Rc::new(Cell::new(0u32));
    let counter = Rc::clone(&fired);
    let props = ArcLayerProps::new(config(0.5, true)).with_on_complete(move || {
        counter.set(counter.get() + 1);
    });
    let mut layer = ArcLayer::with_data("arcs", props, ManualScheduler::new(), batch(1)).unwrap();
    layer.create().unwrap();

    let reports = FrameLoop::new().run(&mut layer, 7);
    assert_eq!(reports.len(), 7);
    assert_eq!(fired.get(), 2);
    assert_eq!(layer.completions(), 2);
    assert_eq!(layer.state(), DriverState::Running);
    // Looping wraps back to 0 and keeps going.
    assert!((layer.progress() - 0.5).abs() < 1e-12);
}

#[test]
fn non_looping_layer_stops_after_one_cycle() {
    let sched = ManualScheduler::new();
    let mut layer = ArcLayer::with_data(
        "arcs",
        ArcLayerProps::new(config(0.5, false)),
        sched.clone(),
        batch(1),
    )
    .unwrap();
    layer.create().unwrap();
    let reports = FrameLoop::new().run(&mut layer, 50);
    assert_eq!(reports.len(), 3);
    assert_eq!(layer.state(), DriverState::Stopped);
    assert_eq!(sched.pending_len(), 0);

    // New data revives a finished layer.
    layer.on_data_changed(Some(batch(1))).unwrap();
    assert_eq!(layer.state(), DriverState::Running);
    assert_eq!(sched.pending_len(), 1);
}

#[test]
fn dispose_releases_the_pending_tick() {
    let sched = ManualScheduler::new();
    let mut layer = ArcLayer::with_data(
        "arcs",
        ArcLayerProps::new(config(0.1, true)),
        sched.clone(),
        batch(3),
    )
    .unwrap();
    layer.create().unwrap();
    FrameLoop::new().run(&mut layer, 5);
    assert_eq!(sched.pending_len(), 1);

    layer.dispose();
    assert_eq!(sched.pending_len(), 0);
    assert!(FrameLoop::new().step(&mut layer).is_none());
    drop(layer);
    assert_eq!(sched.cancelled_count(), 1);
}

#[test]
fn missing_dataset_renders_nothing_but_reports_it() {
    let mut layer = ArcLayer::new(
        "arcs",
        ArcLayerProps::new(config(0.5, false)),
        ManualScheduler::new(),
    )
    .unwrap();
    layer.create().unwrap();
    let frame = layer.render();
    assert!(frame.is_empty());
    assert_eq!(frame.diagnostics.len(), 1);

    let empty: Dataset = Arc::from(Vec::new());
    layer.on_data_changed(Some(empty)).unwrap();
    let frame = layer.render();
    assert!(frame.is_empty());
    assert!(frame.diagnostics.is_empty());
}

#[test]
fn host_without_frame_callbacks_gets_a_static_frame() {
    let mut layer = ArcLayer::with_data(
        "arcs",
        ArcLayerProps::new(config(0.5, false)),
        UnavailableScheduler,
        batch(2),
    )
    .unwrap();
    let err = layer.create().unwrap_err();
    assert!(matches!(err, TrafficError::SchedulingUnavailable));
    assert_eq!(layer.state(), DriverState::Idle);
    assert_eq!(layer.render().points().count(), 2);
}

#[test]
fn stats_follow_each_batch() {
    let mut store = StatsStore::new();
    let seen = Rc::new(Cell::new(0u64));
    let sink = Rc::clone(&seen);
    store.subscribe(move |s| sink.set(s.requests));

    store.record_batch(&batch(3));
    store.record_batch(&batch(2));
    assert_eq!(seen.get(), 5);
    assert_eq!(store.get().connections, 2);
}
