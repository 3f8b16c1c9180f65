use std::sync::Arc;

use trafficmap::{
    ArcEvent, ArcLayer, ArcLayerProps, DiagnosticKind, FrameLoop, LayerConfig, LngLat,
    ManualScheduler, PROGRESS_END, interpolate,
};

fn single_arc_layer(speed: f64) -> ArcLayer<ManualScheduler> {
    let props = ArcLayerProps::new(LayerConfig {
        animation_speed: speed,
        ..LayerConfig::default()
    });
    let data = Arc::from(vec![ArcEvent::new(
        "a",
        LngLat::new(0.0, 0.0),
        LngLat::new(10.0, 10.0),
    )]);
    ArcLayer::with_data("arcs", props, ManualScheduler::new(), data).unwrap()
}

#[test]
fn arrival_and_fade_out_of_a_single_arc() {
    let mut layer = single_arc_layer(0.5);
    layer.create().unwrap();
    let mut host = FrameLoop::new();

    host.step(&mut layer).unwrap();
    host.step(&mut layer).unwrap();
    assert_eq!(layer.progress(), 1.0);

    let frame = layer.render();
    let point = frame.point_for("a").unwrap();
    assert_eq!(
        (point.position.lng, point.position.lat, point.position.height),
        (10.0, 10.0, 0.0)
    );
    assert_eq!(point.opacity, 1.0);
    let trail = frame.trail_for("a").unwrap();
    assert!((trail.opacity - 0.8).abs() < 1e-12);
    assert_eq!(trail.color.a, 204);

    let last = host.step(&mut layer).unwrap();
    assert!(last.outcome.is_completed());
    assert_eq!(layer.progress(), PROGRESS_END);

    let frame = last.frame.unwrap();
    assert!(frame.point_for("a").is_none());
    let trail = frame.trail_for("a").unwrap();
    assert_eq!(trail.opacity, 0.0);
    assert_eq!(trail.color.a, 0);

    assert!(host.step(&mut layer).is_none());
}

#[test]
fn malformed_event_is_skipped_with_a_diagnostic() {
    let data: Vec<ArcEvent> = serde_json::from_str(
        r#"[
            {"id": "a", "source": [0, 0], "target": [10, 10]},
            {"id": "b", "source": null, "target": [1, 1]}
        ]"#,
    )
    .unwrap();
    let props = ArcLayerProps::new(LayerConfig {
        animation_speed: 0.25,
        ..LayerConfig::default()
    });
    let mut layer =
        ArcLayer::with_data("arcs", props, ManualScheduler::new(), Arc::from(data)).unwrap();
    layer.create().unwrap();
    FrameLoop::new().step(&mut layer).unwrap();

    let frame = layer.render();
    assert!(frame.primitives.iter().all(|p| p.event_id() == "a"));
    assert!(frame.point_for("a").is_some());
    assert!(frame.trail_for("a").is_some());

    let diags: Vec<_> = frame.diagnostics_for("b").collect();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].kind, DiagnosticKind::InvalidEvent);
}

#[test]
fn every_event_has_at_most_one_point_and_one_trail() {
    let data: Vec<ArcEvent> =
        serde_json::from_str(include_str!("data/batch.json")).unwrap();
    let props = ArcLayerProps::new(LayerConfig {
        animation_speed: 0.1,
        ..LayerConfig::default()
    });
    let mut layer =
        ArcLayer::with_data("arcs", props, ManualScheduler::new(), Arc::from(data)).unwrap();
    layer.create().unwrap();

    for report in FrameLoop::new().run(&mut layer, 100) {
        let frame = report.frame.unwrap();
        let mut keys: Vec<&str> = frame
            .points()
            .map(|p| p.key.as_str())
            .chain(frame.trails().map(|t| t.key.as_str()))
            .collect();
        let total = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), total, "duplicate primitive at {}", frame.progress);
    }
}

#[test]
fn interpolated_point_follows_the_bump() {
    let s = LngLat::new(-20.0, 5.0);
    let t = LngLat::new(40.0, -15.0);
    for i in 0..=10 {
        let p = f64::from(i) / 10.0;
        let out = interpolate(s, t, p, 1);
        assert_eq!(out.len(), 1);
        let pos = out[0];
        assert!((pos.lng - (s.lng + (t.lng - s.lng) * p)).abs() < 1e-9);
        assert!((pos.lat - (s.lat + (t.lat - s.lat) * p)).abs() < 1e-9);
        let expected = if i == 0 || i == 10 {
            0.0
        } else {
            (std::f64::consts::PI * p).sin() * 20.0
        };
        assert!((pos.height - expected).abs() < 1e-9);
    }
}
