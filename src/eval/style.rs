use crate::{
    data::event::ArcEvent,
    foundation::core::{LngLat, Rgba8},
};

/// Orange, used when an event carries no color.
pub const DEFAULT_ARC_COLOR: Rgba8 = Rgba8::opaque(255, 140, 0);
/// Trail width used when an event carries none.
pub const DEFAULT_ARC_WIDTH: f64 = 3.0;

/// Derives geometry and visual attributes from an event.
///
/// Every method has a default reading the event's own fields, so implementors override only
/// what they restyle.
pub trait ArcStyle {
    /// Start of the arc.
    fn source(&self, event: &ArcEvent) -> Option<LngLat> {
        event.source
    }

    /// End of the arc.
    fn target(&self, event: &ArcEvent) -> Option<LngLat> {
        event.target
    }

    /// Base color before the fade is applied.
    fn color(&self, event: &ArcEvent) -> Rgba8 {
        event.color.unwrap_or(DEFAULT_ARC_COLOR)
    }

    /// Trail width in pixels.
    fn width(&self, event: &ArcEvent) -> f64 {
        event.width.unwrap_or(DEFAULT_ARC_WIDTH)
    }
}

/// Reads everything from the event itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultStyle;

impl ArcStyle for DefaultStyle {}

type Accessor<T> = Box<dyn Fn(&ArcEvent) -> T>;

/// Closure-backed style; unset accessors fall back to [`DefaultStyle`].
#[derive(Default)]
pub struct FnStyle {
    source: Option<Accessor<Option<LngLat>>>,
    target: Option<Accessor<Option<LngLat>>>,
    color: Option<Accessor<Rgba8>>,
    width: Option<Accessor<f64>>,
}

impl FnStyle {
    /// Style with every accessor unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the source accessor.
    pub fn with_source(mut self, f: impl Fn(&ArcEvent) -> Option<LngLat> + 'static) -> Self {
        self.source = Some(Box::new(f));
        self
    }

    /// Override the target accessor.
    pub fn with_target(mut self, f: impl Fn(&ArcEvent) -> Option<LngLat> + 'static) -> Self {
        self.target = Some(Box::new(f));
        self
    }

    /// Override the color accessor.
    pub fn with_color(mut self, f: impl Fn(&ArcEvent) -> Rgba8 + 'static) -> Self {
        self.color = Some(Box::new(f));
        self
    }

    /// Override the width accessor.
    pub fn with_width(mut self, f: impl Fn(&ArcEvent) -> f64 + 'static) -> Self {
        self.width = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for FnStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStyle")
            .field("source", &self.source.is_some())
            .field("target", &self.target.is_some())
            .field("color", &self.color.is_some())
            .field("width", &self.width.is_some())
            .finish()
    }
}

impl ArcStyle for FnStyle {
    /// Start of the arc.
    fn source(&self, event: &ArcEvent) -> Option<LngLat> {
        match &self.source {
            Some(f) => f(event),
            None => DefaultStyle.source(event),
        }
    }

    /// End of the arc.
    fn target(&self, event: &ArcEvent) -> Option<LngLat> {
        match &self.target {
            Some(f) => f(event),
            None => DefaultStyle.target(event),
        }
    }

    /// Base color before the fade is applied.
    fn color(&self, event: &ArcEvent) -> Rgba8 {
        match &self.color {
            Some(f) => f(event),
            None => DefaultStyle.color(event),
        }
    }

    /// Trail width in pixels.
    fn width(&self, event: &ArcEvent) -> f64 {
        match &self.width {
            Some(f) => f(event),
            None => DefaultStyle.width(event),
        }
    }
}
