use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::foundation::core::{LngLat, Rgba8};

/// A batch of events, replaced wholesale on every update.
///
/// Change detection compares batches by reference (`Arc::ptr_eq`), never by content.
pub type Dataset = Arc<[ArcEvent]>;

/// One source -> target movement to animate.
///
/// `source`/`target` are optional so that malformed feed records still deserialize; the frame
/// assembler skips such events and records a diagnostic instead of failing the batch. Unknown
/// feed fields are ignored.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ArcEvent {
    /// Stable identity; derived from the coordinates when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Origin of the movement.
    #[serde(default)]
    pub source: Option<LngLat>,
    /// Destination of the movement.
    #[serde(default)]
    pub target: Option<LngLat>,
    /// Per-event color; the style default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba8>,
    /// Trail width in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

impl ArcEvent {
    /// Event with an explicit id.
    pub fn new(id: impl Into<String>, source: LngLat, target: LngLat) -> Self {
        Self {
            id: Some(id.into()),
            source: Some(source),
            target: Some(target),
            color: None,
            width: None,
        }
    }

    /// Event without an explicit id; identity falls back to its coordinates.
    pub fn anonymous(source: LngLat, target: LngLat) -> Self {
        Self {
            id: None,
            source: Some(source),
            target: Some(target),
            color: None,
            width: None,
        }
    }

    /// Set the per-event color.
    pub fn with_color(mut self, color: Rgba8) -> Self {
        self.color = Some(color);
        self
    }

    /// Set the per-event trail width.
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    /// Explicit id if present and non-empty.
    pub fn explicit_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// Id used in diagnostics, where coordinates may be missing.
    pub fn display_id(&self) -> String {
        match self.explicit_id() {
            Some(id) => id.to_string(),
            None => "<anonymous>".to_string(),
        }
    }
}

/// `sourceLng-sourceLat-targetLng-targetLat`.
///
/// Collides for concurrent events sharing endpoints; see [`IdAllocator`].
pub fn fallback_id(source: LngLat, target: LngLat) -> String {
    format!(
        "{}-{}-{}-{}",
        source.lng, source.lat, target.lng, target.lat
    )
}

/// Hands out unique ids within one frame.
///
/// The first occurrence of an id is kept as-is; repeats get the lowest free `#n` suffix, skipping
/// any suffixed id already handed out (including explicit ids that happen to look suffixed).
#[derive(Debug, Default)]
pub struct IdAllocator {
    taken: HashSet<String>,
    next_suffix: HashMap<String, u32>,
}

/// Result of [`IdAllocator::allocate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllocatedId {
    /// Id to key primitives with, unique within the frame.
    pub id: String,
    /// Set when the requested id was already taken in this frame.
    pub collided_with: Option<String>,
}

impl IdAllocator {
    /// Allocator with no ids taken.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `requested`, or the next free suffixed variant of it.
    pub fn allocate(&mut self, requested: String) -> AllocatedId {
        if self.taken.insert(requested.clone()) {
            return AllocatedId {
                id: requested,
                collided_with: None,
            };
        }
        let next = self.next_suffix.entry(requested.clone()).or_insert(1);
        let id = loop {
            let candidate = format!("{requested}#{next}");
            *next += 1;
            if self.taken.insert(candidate.clone()) {
                break candidate;
            }
        };
        AllocatedId {
            id,
            collided_with: Some(requested),
        }
    }
}
