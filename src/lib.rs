//! Trafficmap animates web-traffic events as arcs travelling over a map.
//!
//! Each event in a batch is a source/target coordinate pair. An [`ArcLayer`] owns one batch,
//! drives a shared progress value once per host frame, and turns that progress into drawable
//! primitives (a fading trail per event plus a moving point).
//!
//! # Pipeline overview
//!
//! 1. **Drive**: the host's frame callback ([`FrameScheduler`]) advances an [`AnimationDriver`]
//!    from 0 to [`PROGRESS_END`].
//! 2. **Assemble**: `dataset + progress -> ArcFrame` ([`FrameAssembler`]), pure and stateless.
//! 3. **Preview** (optional): `ArcFrame -> FrameRGBA` on the CPU via [`render_frame`].
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic**: assembly depends only on the dataset, the progress and the config.
//! - **Single pending tick**: a layer never has more than one outstanding frame request, and a
//!   disposed layer has none.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod animation;
mod data;
mod eval;
mod foundation;
mod host;
mod layer;
mod render;

pub use animation::driver::{
    AnimationDriver, AnimationState, CompletionCallback, DEFAULT_ANIMATION_SPEED, DriverState,
    PROGRESS_END, TickOutcome,
};
pub use animation::interp::{
    ARC_HEIGHT_SCALE, interpolate, interpolate_with_height, position_at, positional_t,
};
pub use animation::schedule::{FrameHandle, FrameScheduler, ManualScheduler, UnavailableScheduler};
pub use data::event::{AllocatedId, ArcEvent, Dataset, IdAllocator, fallback_id};
pub use data::stats::{StatsStore, SubscriptionId, TrafficStats};
pub use eval::assembler::{
    ArcFrame, DataTransform, Diagnostic, DiagnosticKind, FrameAssembler, PointPrimitive,
    Primitive, TRAIL_ALPHA, TRAIL_SAMPLES_PER_UNIT, TrailPrimitive, point_opacity, trail_alpha,
    trail_steps,
};
pub use eval::style::{ArcStyle, DEFAULT_ARC_COLOR, DEFAULT_ARC_WIDTH, DefaultStyle, FnStyle};
pub use foundation::core::{ArcPosition, BezPath, Canvas, FrameIndex, LngLat, Point, Rgba8};
pub use foundation::error::{TrafficError, TrafficResult};
pub use host::{FrameLoop, FrameReport};
pub use layer::arc_layer::{ArcLayer, ArcLayerProps};
pub use layer::config::LayerConfig;
pub use render::cpu::{FrameRGBA, RenderSettings, render_frame};
pub use render::viewport::Viewport;
