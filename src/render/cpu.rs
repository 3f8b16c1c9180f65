use kurbo::Shape as _;

use crate::{
    eval::assembler::{ArcFrame, PointPrimitive, Primitive, TrailPrimitive},
    foundation::core::{BezPath, Point},
    foundation::error::{TrafficError, TrafficResult},
    render::viewport::Viewport,
};

/// Options for [`render_frame`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderSettings {
    /// Straight RGBA background; `None` leaves the canvas transparent.
    pub clear_rgba: Option<[u8; 4]>,
}

/// Rasterized frame.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA8, `width * height * 4` bytes.
    pub data: Vec<u8>,
    /// Whether `data` holds premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// RGBA at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.data.get(i..i + 4).map(|px| [px[0], px[1], px[2], px[3]])
    }
}

/// Draw trails as stroked polylines and points as filled circles, in primitive order.
pub fn render_frame(
    frame: &ArcFrame,
    viewport: &Viewport,
    settings: &RenderSettings,
) -> TrafficResult<FrameRGBA> {
    let width: u16 = viewport
        .canvas
        .width
        .try_into()
        .map_err(|_| TrafficError::render("canvas width exceeds u16"))?;
    let height: u16 = viewport
        .canvas
        .height
        .try_into()
        .map_err(|_| TrafficError::render("canvas height exceeds u16"))?;

    let mut pixmap = vello_cpu::Pixmap::new(width, height);
    let mut ctx = vello_cpu::RenderContext::new(width, height);
    if let Some([r, g, b, a]) = settings.clear_rgba {
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(width),
            f64::from(height),
        ));
    }
    for primitive in &frame.primitives {
        match primitive {
            Primitive::Trail(trail) => draw_trail(&mut ctx, trail, viewport),
            Primitive::Point(point) => draw_point(&mut ctx, point, viewport),
        }
    }
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);

    Ok(FrameRGBA {
        width: viewport.canvas.width,
        height: viewport.canvas.height,
        data: pixmap.data_as_u8_slice().to_vec(),
        premultiplied: true,
    })
}

fn draw_trail(ctx: &mut vello_cpu::RenderContext, trail: &TrailPrimitive, viewport: &Viewport) {
    if trail.color.a == 0 || trail.path.len() < 2 {
        return;
    }
    let mut path = BezPath::new();
    let mut positions = trail.path.iter().map(|p| viewport.project(*p));
    if let Some(first) = positions.next() {
        path.move_to(first);
    }
    for p in positions {
        path.line_to(p);
    }

    let c = trail.color;
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a));
    ctx.set_stroke(vello_cpu::kurbo::Stroke::new(trail.width.max(0.5)));
    ctx.stroke_path(&bezpath_to_cpu(&path));
}

fn draw_point(ctx: &mut vello_cpu::RenderContext, point: &PointPrimitive, viewport: &Viewport) {
    if point.opacity <= 0.0 {
        return;
    }
    let center = viewport.project(point.position);
    let radius = point.radius.max(point.radius_min_pixels);
    let circle = kurbo::Circle::new(center, radius).to_path(0.1);

    let c = point.color;
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a));
    let fade = point.opacity < 1.0;
    if fade {
        ctx.push_opacity_layer(point.opacity as f32);
    }
    ctx.fill_path(&bezpath_to_cpu(&circle));
    if fade {
        ctx.pop_layer();
    }
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}
