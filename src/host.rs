use crate::{
    animation::{driver::TickOutcome, schedule::ManualScheduler},
    eval::assembler::ArcFrame,
    foundation::core::FrameIndex,
    layer::arc_layer::ArcLayer,
};

/// What happened on one host frame.
#[derive(Clone, Debug, serde::Serialize)]
pub struct FrameReport {
    /// Index of this host frame.
    pub index: FrameIndex,
    /// Redraw-worthy outcome of the frame, or `Stale` if none.
    pub outcome: TickOutcome,
    /// Present when the layer asked for a redraw.
    pub frame: Option<ArcFrame>,
}

/// Synthetic display loop: each call to [`FrameLoop::step`] is one refresh of the host.
#[derive(Debug, Default)]
pub struct FrameLoop {
    next: u64,
}

impl FrameLoop {
    /// Loop starting at frame 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames that delivered at least one tick.
    pub fn frames_elapsed(&self) -> u64 {
        self.next
    }

    /// Deliver every due tick to `layer`, then render once if any tick requested a redraw.
    ///
    /// Returns `None` when nothing was scheduled for this frame (the animation is idle or done).
    pub fn step(&mut self, layer: &mut ArcLayer<ManualScheduler>) -> Option<FrameReport> {
        let due = layer.scheduler().take_due();
        if due.is_empty() {
            return None;
        }
        let index = FrameIndex(self.next);
        self.next += 1;

        let mut outcome = TickOutcome::Stale;
        for handle in due {
            let o = layer.on_tick(handle);
            if o.needs_redraw() {
                outcome = o;
            }
        }
        let frame = outcome.needs_redraw().then(|| layer.render());
        Some(FrameReport {
            index,
            outcome,
            frame,
        })
    }

    /// Step until the layer stops scheduling or `max_frames` frames have run.
    pub fn run(&mut self, layer: &mut ArcLayer<ManualScheduler>, max_frames: usize) -> Vec<FrameReport> {
        let mut out = Vec::new();
        for _ in 0..max_frames {
            match self.step(layer) {
                Some(report) => out.push(report),
                None => break,
            }
        }
        out
    }
}
