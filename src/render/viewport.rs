use crate::{
    data::event::ArcEvent,
    foundation::core::{ArcPosition, Canvas, LngLat, Point},
    foundation::error::{TrafficError, TrafficResult},
};

/// Equirectangular window onto the map, used to place primitives on a preview canvas.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    /// Target raster.
    pub canvas: Canvas,
    /// Western bound, in degrees.
    pub west: f64,
    /// Southern bound.
    pub south: f64,
    /// Eastern bound.
    pub east: f64,
    /// Northern bound.
    pub north: f64,
    /// Screen pixels per unit of arc height; the bump lifts positions upward.
    pub height_px: f64,
}

impl Viewport {
    /// Explicit bounds; rejects empty or non-finite boxes.
    pub fn new(canvas: Canvas, west: f64, south: f64, east: f64, north: f64) -> TrafficResult<Self> {
        if !(west < east && south < north) {
            return Err(TrafficError::validation(
                "viewport bounds must satisfy west < east and south < north",
            ));
        }
        if ![west, south, east, north].iter().all(|v| v.is_finite()) {
            return Err(TrafficError::validation("viewport bounds must be finite"));
        }
        Ok(Self {
            canvas,
            west,
            south,
            east,
            north,
            height_px: 1.0,
        })
    }

    /// The whole globe.
    pub fn world(canvas: Canvas) -> Self {
        Self {
            canvas,
            west: -180.0,
            south: -90.0,
            east: 180.0,
            north: 90.0,
            height_px: 1.0,
        }
    }

    /// Bounds covering every endpoint in `events`, padded by `padding` degrees.
    ///
    /// Falls back to [`Viewport::world`] when no event has usable coordinates.
    pub fn fit(canvas: Canvas, events: &[ArcEvent], padding: f64) -> Self {
        let mut bounds: Option<(f64, f64, f64, f64)> = None;
        let endpoints = events
            .iter()
            .flat_map(|e| [e.source, e.target])
            .flatten()
            .filter(|p| p.is_finite());
        for p in endpoints {
            bounds = Some(match bounds {
                None => (p.lng, p.lat, p.lng, p.lat),
                Some((w, s, e, n)) => (w.min(p.lng), s.min(p.lat), e.max(p.lng), n.max(p.lat)),
            });
        }
        let padding = padding.max(0.0);
        match bounds {
            Some((w, s, e, n)) => {
                // Keep a non-degenerate box for single-point or colinear batches.
                let pad_x = padding.max(if e - w > 0.0 { 0.0 } else { 1.0 });
                let pad_y = padding.max(if n - s > 0.0 { 0.0 } else { 1.0 });
                Self {
                    canvas,
                    west: w - pad_x,
                    south: s - pad_y,
                    east: e + pad_x,
                    north: n + pad_y,
                    height_px: 1.0,
                }
            }
            None => Self::world(canvas),
        }
    }

    /// Set the screen pixels per unit of arc height.
    pub fn with_height_px(mut self, height_px: f64) -> Self {
        self.height_px = height_px;
        self
    }

    /// Ground position in canvas pixels.
    pub fn project_lnglat(&self, p: LngLat) -> Point {
        let w = f64::from(self.canvas.width);
        let h = f64::from(self.canvas.height);
        Point::new(
            (p.lng - self.west) / (self.east - self.west) * w,
            (self.north - p.lat) / (self.north - self.south) * h,
        )
    }

    /// Canvas position with the bump lifting the point upward.
    pub fn project(&self, p: ArcPosition) -> Point {
        let base = self.project_lnglat(p.planar());
        Point::new(base.x, base.y - p.height * self.height_px)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> Canvas {
        Canvas::new(360, 180).unwrap()
    }

    #[test]
    fn world_maps_corners_to_canvas_corners() {
        let vp = Viewport::world(canvas());
        assert_eq!(vp.project_lnglat(LngLat::new(-180.0, 90.0)), Point::new(0.0, 0.0));
        assert_eq!(vp.project_lnglat(LngLat::new(180.0, -90.0)), Point::new(360.0, 180.0));
        assert_eq!(vp.project_lnglat(LngLat::new(0.0, 0.0)), Point::new(180.0, 90.0));
    }

    #[test]
    fn height_lifts_points_upward() {
        let vp = Viewport::world(canvas()).with_height_px(2.0);
        let p = vp.project(ArcPosition::new(0.0, 0.0, 10.0));
        assert_eq!(p, Point::new(180.0, 70.0));
    }

    #[test]
    fn fit_pads_bounds_and_handles_degenerate_input() {
        let events = vec![ArcEvent::new("a", LngLat::new(0.0, 0.0), LngLat::new(10.0, 5.0))];
        let vp = Viewport::fit(canvas(), &events, 2.0);
        assert_eq!((vp.west, vp.south, vp.east, vp.north), (-2.0, -2.0, 12.0, 7.0));

        let single = vec![ArcEvent::new("p", LngLat::new(3.0, 3.0), LngLat::new(3.0, 3.0))];
        let vp = Viewport::fit(canvas(), &single, 0.0);
        assert!(vp.west < vp.east && vp.south < vp.north);

        assert_eq!(Viewport::fit(canvas(), &[], 1.0), Viewport::world(canvas()));
    }

    #[test]
    fn new_rejects_inverted_bounds() {
        assert!(Viewport::new(canvas(), 10.0, 0.0, -10.0, 5.0).is_err());
        assert!(Viewport::new(canvas(), -10.0, 0.0, 10.0, 5.0).is_ok());
    }
}
