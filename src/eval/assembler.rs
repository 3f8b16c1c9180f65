use std::borrow::Cow;

use crate::{
    animation::{driver::PROGRESS_END, interp::interpolate_with_height},
    data::event::{ArcEvent, IdAllocator, fallback_id},
    eval::style::ArcStyle,
    foundation::core::{ArcPosition, LngLat, Rgba8},
    foundation::error::TrafficError,
    layer::config::LayerConfig,
};

/// Trail samples per unit of trail span.
pub const TRAIL_SAMPLES_PER_UNIT: f64 = 60.0;

/// Trail alpha while the point is still travelling.
pub const TRAIL_ALPHA: f64 = 0.8;

/// Optional preprocessing applied to every batch before assembly.
pub type DataTransform = Box<dyn Fn(&[ArcEvent]) -> Vec<ArcEvent>>;

/// Moving marker at the head of an arc.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct PointPrimitive {
    /// Layer-scoped key, `"{layer}-point-{event}"`.
    pub key: String,
    /// Resolved id of the event this primitive belongs to.
    pub event_id: String,
    /// Current head of the arc.
    pub position: ArcPosition,
    /// Event color; fading is carried by `opacity`.
    pub color: Rgba8,
    /// Radius in map units.
    pub radius: f64,
    /// Lower bound on the on-screen radius.
    pub radius_min_pixels: f64,
    /// In `[0, 1]`.
    pub opacity: f64,
}

/// Sampled path behind the moving point.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TrailPrimitive {
    /// Layer-scoped key, `"{layer}-trail-{event}"`.
    pub key: String,
    /// Resolved id of the event this primitive belongs to.
    pub event_id: String,
    /// At least two positions, ordered from the source.
    pub path: Vec<ArcPosition>,
    /// Event color with alpha replaced by the fade law when fading is enabled.
    pub color: Rgba8,
    /// Stroke width in pixels.
    pub width: f64,
    /// In `[0, 1]`.
    pub opacity: f64,
}

/// Drawable output for one event.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Primitive {
    /// Moving marker at the head of the arc.
    Point(PointPrimitive),
    /// Polyline from the source to the head.
    Trail(TrailPrimitive),
}

impl Primitive {
    /// Resolved id of the owning event.
    pub fn event_id(&self) -> &str {
        match self {
            Self::Point(p) => &p.event_id,
            Self::Trail(t) => &t.event_id,
        }
    }
}

/// Category of a non-fatal assembly problem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The layer has no dataset.
    MissingData,
    /// An event lacks usable coordinates (or an id, when ids are required).
    InvalidEvent,
    /// An event's id was already taken and got a suffix.
    DuplicateId,
}

/// Non-fatal problem recorded while assembling a frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Diagnostic {
    /// What went wrong.
    pub kind: DiagnosticKind,
    /// Offending event, when the problem is per-event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Human-readable description.
    pub message: String,
}

/// Everything the host needs to draw one frame of a layer.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ArcFrame {
    /// Id of the layer that produced the frame.
    pub layer_id: String,
    /// Progress the frame was assembled at.
    pub progress: f64,
    /// Trails first, then points.
    pub primitives: Vec<Primitive>,
    /// Problems found while assembling; never fatal.
    pub diagnostics: Vec<Diagnostic>,
}

impl ArcFrame {
    fn empty(layer_id: &str, progress: f64) -> Self {
        Self {
            layer_id: layer_id.to_string(),
            progress,
            primitives: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// No primitives (diagnostics may still be present).
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Point primitives, in event order.
    pub fn points(&self) -> impl Iterator<Item = &PointPrimitive> {
        self.primitives.iter().filter_map(|p| match p {
            Primitive::Point(point) => Some(point),
            Primitive::Trail(_) => None,
        })
    }

    /// Trail primitives, in event order.
    pub fn trails(&self) -> impl Iterator<Item = &TrailPrimitive> {
        self.primitives.iter().filter_map(|p| match p {
            Primitive::Trail(trail) => Some(trail),
            Primitive::Point(_) => None,
        })
    }

    /// Point of the event with resolved id `event_id`.
    pub fn point_for(&self, event_id: &str) -> Option<&PointPrimitive> {
        self.points().find(|p| p.event_id == event_id)
    }

    /// Trail of the event with resolved id `event_id`.
    pub fn trail_for(&self, event_id: &str) -> Option<&TrailPrimitive> {
        self.trails().find(|t| t.event_id == event_id)
    }

    /// Diagnostics naming `event_id`.
    pub fn diagnostics_for(&self, event_id: &str) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |d| d.event_id.as_deref() == Some(event_id))
    }
}

/// Trail alpha at `progress`: 0.8 up to and including arrival, then linear to 0 over the fade
/// phase.
pub fn trail_alpha(progress: f64) -> f64 {
    if progress <= 1.0 {
        TRAIL_ALPHA
    } else {
        fade(progress)
    }
}

/// Point opacity at `progress`: opaque while travelling, then linear to 0 over the fade phase.
pub fn point_opacity(progress: f64) -> f64 {
    if progress < 1.0 { 1.0 } else { fade(progress) }
}

fn fade(progress: f64) -> f64 {
    (1.0 - (progress - 1.0) * 2.0).clamp(0.0, 1.0)
}

/// Number of trail samples for the current frame, or `None` when the trail is suppressed.
pub fn trail_steps(progress: f64, trail_length: f64) -> Option<usize> {
    let trail_start = (progress - trail_length).max(0.0);
    let trail_span = progress - trail_start;
    if trail_span.is_nan() || trail_span <= 0.0 {
        return None;
    }
    Some(((trail_span * TRAIL_SAMPLES_PER_UNIT).floor() as usize).max(2))
}

struct ResolvedEvent<'a> {
    id: String,
    source: LngLat,
    target: LngLat,
    event: &'a ArcEvent,
}

/// Stateless mapping from dataset + progress to drawable primitives.
pub struct FrameAssembler;

impl FrameAssembler {
    /// Build the primitives for one frame.
    ///
    /// Never fails: a missing dataset or malformed events produce diagnostics on the returned
    /// frame and are otherwise skipped.
    #[tracing::instrument(skip(data, config, style, transform), fields(events = tracing::field::Empty))]
    pub fn assemble(
        layer_id: &str,
        data: Option<&[ArcEvent]>,
        progress: f64,
        config: &LayerConfig,
        style: &dyn ArcStyle,
        transform: Option<&DataTransform>,
    ) -> ArcFrame {
        let mut frame = ArcFrame::empty(layer_id, progress);

        let Some(data) = data else {
            tracing::warn!(layer = layer_id, "no data provided");
            frame.diagnostics.push(Diagnostic {
                kind: DiagnosticKind::MissingData,
                event_id: None,
                message: TrafficError::MissingData.to_string(),
            });
            return frame;
        };

        let events: Cow<'_, [ArcEvent]> = match transform {
            Some(f) => Cow::Owned(f(data)),
            None => Cow::Borrowed(data),
        };
        tracing::Span::current().record("events", events.len());
        if events.is_empty() {
            return frame;
        }

        let resolved = resolve_events(&events, config, style, &mut frame.diagnostics);

        if config.show_trail
            && let Some(steps) = trail_steps(progress, config.trail_length)
        {
            for ev in &resolved {
                let path = interpolate_with_height(
                    ev.source,
                    ev.target,
                    progress,
                    steps,
                    config.arc_height,
                );
                if path.len() < 2 {
                    continue;
                }
                let base = style.color(ev.event);
                let (color, opacity) = if config.fade_out {
                    let alpha = trail_alpha(progress);
                    (base.with_alpha(alpha), alpha)
                } else {
                    (base, 1.0)
                };
                frame.primitives.push(Primitive::Trail(TrailPrimitive {
                    key: format!("{layer_id}-trail-{}", ev.id),
                    event_id: ev.id.clone(),
                    path,
                    color,
                    width: style.width(ev.event),
                    opacity,
                }));
            }
        }

        if config.show_point && progress < PROGRESS_END {
            let opacity = if config.fade_out {
                point_opacity(progress)
            } else {
                1.0
            };
            for ev in &resolved {
                let position =
                    interpolate_with_height(ev.source, ev.target, progress, 1, config.arc_height);
                let Some(&position) = position.first() else {
                    continue;
                };
                frame.primitives.push(Primitive::Point(PointPrimitive {
                    key: format!("{layer_id}-point-{}", ev.id),
                    event_id: ev.id.clone(),
                    position,
                    color: style.color(ev.event),
                    radius: config.point_radius,
                    radius_min_pixels: config.point_radius_min_pixels,
                    opacity,
                }));
            }
        }

        frame
    }
}

fn resolve_events<'a>(
    events: &'a [ArcEvent],
    config: &LayerConfig,
    style: &dyn ArcStyle,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<ResolvedEvent<'a>> {
    let mut ids = IdAllocator::new();
    let mut out = Vec::with_capacity(events.len());

    for event in events {
        let source = style.source(event);
        let target = style.target(event);
        let (source, target) = match (source, target) {
            (Some(s), Some(t)) if s.is_finite() && t.is_finite() => (s, t),
            (s, t) => {
                let reason = match (s, t) {
                    (None, None) => "missing source and target",
                    (None, _) => "missing source",
                    (_, None) => "missing target",
                    _ => "non-finite coordinates",
                };
                invalid(diagnostics, event.display_id(), reason);
                continue;
            }
        };

        let requested = match event.explicit_id() {
            Some(id) => id.to_string(),
            None if config.require_ids => {
                invalid(diagnostics, fallback_id(source, target), "missing id");
                continue;
            }
            None => fallback_id(source, target),
        };

        let allocated = ids.allocate(requested);
        if let Some(original) = allocated.collided_with {
            tracing::warn!(id = %original, assigned = %allocated.id, "duplicate event id");
            diagnostics.push(Diagnostic {
                kind: DiagnosticKind::DuplicateId,
                event_id: Some(allocated.id.clone()),
                message: format!("id '{original}' already used in this batch"),
            });
        }

        out.push(ResolvedEvent {
            id: allocated.id,
            source,
            target,
            event,
        });
    }
    out
}

fn invalid(diagnostics: &mut Vec<Diagnostic>, id: String, reason: &str) {
    tracing::warn!(id = %id, reason, "invalid source or target");
    diagnostics.push(Diagnostic {
        kind: DiagnosticKind::InvalidEvent,
        message: TrafficError::invalid_event(&id, reason).to_string(),
        event_id: Some(id),
    });
}
