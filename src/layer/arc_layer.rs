use std::sync::Arc;

use crate::{
    animation::{
        driver::{AnimationDriver, AnimationState, CompletionCallback, DriverState, TickOutcome},
        schedule::{FrameHandle, FrameScheduler},
    },
    data::event::{ArcEvent, Dataset},
    eval::{
        assembler::{ArcFrame, DataTransform, FrameAssembler},
        style::{ArcStyle, DefaultStyle},
    },
    foundation::error::{TrafficError, TrafficResult},
    layer::config::LayerConfig,
};

/// Construction-time options: the serializable config plus the pluggable behaviour.
pub struct ArcLayerProps {
    /// Serializable options.
    pub config: LayerConfig,
    /// Attribute accessors.
    pub style: Box<dyn ArcStyle>,
    /// Applied to the dataset on every frame before assembly.
    pub data_transform: Option<DataTransform>,
    /// Called once per completed cycle.
    pub on_complete: Option<CompletionCallback>,
}

impl Default for ArcLayerProps {
    fn default() -> Self {
        Self {
            config: LayerConfig::default(),
            style: Box::new(DefaultStyle),
            data_transform: None,
            on_complete: None,
        }
    }
}

impl ArcLayerProps {
    /// Props with the default style and no hooks.
    pub fn new(config: LayerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Replace the style.
    pub fn with_style(mut self, style: impl ArcStyle + 'static) -> Self {
        self.style = Box::new(style);
        self
    }

    /// Set the per-frame dataset transform.
    pub fn with_data_transform(
        mut self,
        f: impl Fn(&[ArcEvent]) -> Vec<ArcEvent> + 'static,
    ) -> Self {
        self.data_transform = Some(Box::new(f));
        self
    }

    /// Set the completion callback.
    pub fn with_on_complete(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }
}

/// Animated arc overlay owned by a host integration.
///
/// Lifecycle: [`ArcLayer::new`] -> [`ArcLayer::create`] -> any number of
/// [`ArcLayer::on_data_changed`] / [`ArcLayer::on_tick`] / [`ArcLayer::render`] ->
/// [`ArcLayer::dispose`]. Dropping the layer disposes it, so the pending tick never outlives it.
pub struct ArcLayer<S: FrameScheduler> {
    id: String,
    config: LayerConfig,
    style: Box<dyn ArcStyle>,
    data_transform: Option<DataTransform>,
    data: Option<Dataset>,
    driver: AnimationDriver,
    scheduler: S,
    disposed: bool,
}

impl<S: FrameScheduler> std::fmt::Debug for ArcLayer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArcLayer")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("events", &self.data.as_ref().map(|d| d.len()))
            .field("driver", &self.driver)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

impl<S: FrameScheduler> ArcLayer<S> {
    /// Validate `props.config` and build an idle layer with no data.
    pub fn new(id: impl Into<String>, props: ArcLayerProps, scheduler: S) -> TrafficResult<Self> {
        props.config.validate()?;
        let mut driver = AnimationDriver::new(props.config.animation_speed, props.config.looping);
        if let Some(callback) = props.on_complete {
            driver = driver.with_on_complete(callback);
        }
        Ok(Self {
            id: id.into(),
            config: props.config,
            style: props.style,
            data_transform: props.data_transform,
            data: None,
            driver,
            scheduler,
            disposed: false,
        })
    }

    /// Same as [`ArcLayer::new`] with an initial dataset already attached.
    pub fn with_data(
        id: impl Into<String>,
        props: ArcLayerProps,
        scheduler: S,
        data: Dataset,
    ) -> TrafficResult<Self> {
        let mut layer = Self::new(id, props, scheduler)?;
        layer.data = Some(data);
        Ok(layer)
    }

    /// Layer id, used as the primitive key prefix.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Validated configuration.
    pub fn config(&self) -> &LayerConfig {
        &self.config
    }

    /// Current dataset, if any.
    pub fn data(&self) -> Option<&Dataset> {
        self.data.as_ref()
    }

    /// Current animation progress.
    pub fn progress(&self) -> f64 {
        self.driver.progress()
    }

    /// Driver lifecycle state.
    pub fn state(&self) -> DriverState {
        self.driver.state()
    }

    /// Progress plus the pending handle.
    pub fn animation_state(&self) -> AnimationState {
        self.driver.animation_state()
    }

    /// Cycles completed so far.
    pub fn completions(&self) -> u64 {
        self.driver.completions()
    }

    /// The injected scheduler.
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Whether [`ArcLayer::dispose`] has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Start the first animation cycle.
    ///
    /// With no frame facility this returns [`TrafficError::SchedulingUnavailable`] and the layer
    /// keeps rendering its initial (progress 0) frame.
    pub fn create(&mut self) -> TrafficResult<()> {
        self.ensure_live()?;
        tracing::debug!(layer = %self.id, "layer created");
        self.driver.start(&mut self.scheduler)
    }

    /// React to a new dataset reference.
    ///
    /// Returns `Ok(false)` when `data` is the same reference as the current dataset (content is
    /// never compared). Otherwise the dataset is swapped and the animation restarts from 0;
    /// several updates before the next frame still leave a single pending tick.
    pub fn on_data_changed(&mut self, data: Option<Dataset>) -> TrafficResult<bool> {
        self.ensure_live()?;
        let same = match (&self.data, &data) {
            (Some(old), Some(new)) => Arc::ptr_eq(old, new),
            (None, None) => true,
            _ => false,
        };
        if same {
            return Ok(false);
        }
        tracing::debug!(
            layer = %self.id,
            events = data.as_ref().map(|d| d.len()),
            "dataset changed; restarting animation"
        );
        self.data = data;
        self.driver.start(&mut self.scheduler)?;
        Ok(true)
    }

    /// Deliver a frame tick previously handed out by the scheduler.
    pub fn on_tick(&mut self, handle: FrameHandle) -> TickOutcome {
        if self.disposed {
            return TickOutcome::Stale;
        }
        self.driver.tick(handle, &mut self.scheduler)
    }

    /// Assemble the primitives for the current progress.
    pub fn render(&self) -> ArcFrame {
        FrameAssembler::assemble(
            &self.id,
            self.data.as_deref(),
            self.driver.progress(),
            &self.config,
            self.style.as_ref(),
            self.data_transform.as_ref(),
        )
    }

    /// Release the pending tick. Idempotent; also run on drop.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.driver.stop(&mut self.scheduler);
        self.disposed = true;
        tracing::debug!(layer = %self.id, "layer disposed");
    }

    fn ensure_live(&self) -> TrafficResult<()> {
        if self.disposed {
            return Err(TrafficError::validation(format!(
                "layer '{}' has been disposed",
                self.id
            )));
        }
        Ok(())
    }
}

impl<S: FrameScheduler> Drop for ArcLayer<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::schedule::{ManualScheduler, UnavailableScheduler};
    use crate::foundation::core::LngLat;

    fn dataset() -> Dataset {
        Arc::from(vec![ArcEvent::new(
            "a",
            LngLat::new(0.0, 0.0),
            LngLat::new(10.0, 10.0),
        )])
    }

    fn fast() -> ArcLayerProps {
        ArcLayerProps::new(LayerConfig {
            animation_speed: 0.5,
            ..LayerConfig::default()
        })
    }

    #[test]
    fn new_rejects_invalid_config() {
        let props = ArcLayerProps::new(LayerConfig {
            animation_speed: 0.0,
            ..LayerConfig::default()
        });
        assert!(ArcLayer::new("arcs", props, ManualScheduler::new()).is_err());
    }

    #[test]
    fn create_starts_animation() {
        let sched = ManualScheduler::new();
        let mut layer = ArcLayer::with_data("arcs", fast(), sched.clone(), dataset()).unwrap();
        assert_eq!(layer.state(), DriverState::Idle);
        layer.create().unwrap();
        assert_eq!(layer.state(), DriverState::Running);
        assert_eq!(sched.pending_len(), 1);
    }

    #[test]
    fn same_reference_is_not_a_change() {
        let sched = ManualScheduler::new();
        let data = dataset();
        let mut layer = ArcLayer::new("arcs", fast(), sched.clone()).unwrap();
        assert!(layer.on_data_changed(Some(Arc::clone(&data))).unwrap());
        assert!(!layer.on_data_changed(Some(Arc::clone(&data))).unwrap());
        // Equal content, different reference.
        assert!(layer.on_data_changed(Some(dataset())).unwrap());
        assert!(layer.on_data_changed(None).unwrap());
        assert!(!layer.on_data_changed(None).unwrap());
    }

    #[test]
    fn scheduling_unavailable_leaves_static_initial_frame() {
        let mut layer =
            ArcLayer::with_data("arcs", fast(), UnavailableScheduler, dataset()).unwrap();
        assert!(matches!(
            layer.create(),
            Err(TrafficError::SchedulingUnavailable)
        ));
        let frame = layer.render();
        assert_eq!(frame.progress, 0.0);
        assert_eq!(frame.points().count(), 1);
        assert_eq!(frame.trails().count(), 0);
    }

    #[test]
    fn drop_releases_pending_tick() {
        let sched = ManualScheduler::new();
        {
            let mut layer =
                ArcLayer::with_data("arcs", fast(), sched.clone(), dataset()).unwrap();
            layer.create().unwrap();
            assert_eq!(sched.pending_len(), 1);
        }
        assert_eq!(sched.pending_len(), 0);
        assert_eq!(sched.cancelled_count(), 1);
    }

    #[test]
    fn disposed_layer_ignores_further_input() {
        let sched = ManualScheduler::new();
        let mut layer = ArcLayer::with_data("arcs", fast(), sched.clone(), dataset()).unwrap();
        layer.create().unwrap();
        let h = sched.pending()[0];
        layer.dispose();
        layer.dispose();
        assert!(layer.is_disposed());
        assert_eq!(layer.on_tick(h), TickOutcome::Stale);
        assert!(layer.on_data_changed(Some(dataset())).is_err());
        assert!(layer.create().is_err());
        assert_eq!(sched.cancelled_count(), 1);
    }
}
