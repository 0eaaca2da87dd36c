//! Application trait and the frame loop that drives it.
//!
//! [`FrameLoop`] owns scheduling: key events first, then zero or more fixed-step
//! updates, then exactly one render. It is independent of the window so the same
//! ordering can be exercised headlessly.

pub mod event;

pub use event::{Key, KeyAction, KeyEvent, Modifiers};

use crate::error::SetupError;
use crate::render::{RenderBackend, Viewport};

/// Whether the loop should keep running after the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopControl {
    #[default]
    Continue,
    Exit,
}

/// Frame loop configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopConfig {
    /// Fixed update interval in seconds, or `None` to pass the frame delta through.
    /// Default: 1/60.
    pub fixed_timestep: Option<f64>,
    /// Maximum updates per frame. Default: 4.
    pub max_substeps: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: Some(1.0 / 60.0),
            max_substeps: 4,
        }
    }
}

impl LoopConfig {
    pub fn fixed_timestep(mut self, step: Option<f64>) -> Self {
        self.fixed_timestep = step;
        self
    }

    pub fn max_substeps(mut self, max_substeps: u32) -> Self {
        self.max_substeps = max_substeps.max(1);
        self
    }
}

/// An application driven by a [`FrameLoop`].
pub trait App {
    /// Called once before the first frame. Errors abort startup.
    fn on_setup(&mut self, _renderer: &mut dyn RenderBackend) -> Result<(), SetupError> {
        Ok(())
    }

    /// Called for every key event, before the frame's updates.
    fn on_key(&mut self, event: KeyEvent) -> LoopControl;

    /// Advance the simulation by `dt` seconds.
    fn on_update(&mut self, dt: f64);

    /// Issue draw calls for the frame.
    fn on_render(&mut self, dt: f64, viewport: Viewport, renderer: &mut dyn RenderBackend);
}

/// Schedules an [`App`] frame by frame.
#[derive(Debug, Clone)]
pub struct FrameLoop {
    config: LoopConfig,
    accumulator: f64,
    frames: u64,
    last_updates: u32,
}

impl FrameLoop {
    pub fn new(config: LoopConfig) -> Self {
        Self {
            config,
            accumulator: 0.0,
            frames: 0,
            last_updates: 0,
        }
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Frames completed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Number of `on_update` calls made by the last [`tick`](Self::tick).
    pub fn last_updates(&self) -> u32 {
        self.last_updates
    }

    /// Run the app's one-time setup.
    pub fn setup<A: App + ?Sized>(
        &mut self,
        app: &mut A,
        renderer: &mut dyn RenderBackend,
    ) -> Result<(), SetupError> {
        app.on_setup(renderer)?;
        tracing::debug!("app setup complete");
        Ok(())
    }

    /// Run one frame.
    ///
    /// Every event is delivered even if an earlier one asked to exit; the exit takes
    /// effect after this frame has been updated and rendered.
    pub fn tick<A: App + ?Sized>(
        &mut self,
        app: &mut A,
        events: &[KeyEvent],
        frame_dt: f64,
        viewport: Viewport,
        renderer: &mut dyn RenderBackend,
    ) -> LoopControl {
        let mut control = LoopControl::Continue;
        for event in events {
            if app.on_key(*event) == LoopControl::Exit {
                control = LoopControl::Exit;
            }
        }

        self.last_updates = 0;
        match self.config.fixed_timestep {
            Some(step) if step > 0.0 => {
                let max_substeps = self.config.max_substeps.max(1);
                self.accumulator += frame_dt.max(0.0);
                while self.accumulator >= step && self.last_updates < max_substeps {
                    app.on_update(step);
                    self.accumulator -= step;
                    self.last_updates += 1;
                }
                // Drop whole steps we could not afford instead of carrying them over.
                if self.accumulator >= step {
                    self.accumulator %= step;
                }
            }
            _ => {
                app.on_update(frame_dt);
                self.last_updates = 1;
            }
        }

        app.on_render(frame_dt, viewport, renderer);
        self.frames += 1;
        control
    }
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new(LoopConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::HeadlessRenderer;

    #[derive(Default)]
    struct Recorder {
        log: Vec<String>,
    }

    impl App for Recorder {
        fn on_key(&mut self, event: KeyEvent) -> LoopControl {
            self.log.push(format!("key {:?}", event.key));
            if event.is_press(Key::Escape) {
                LoopControl::Exit
            } else {
                LoopControl::Continue
            }
        }

        fn on_update(&mut self, dt: f64) {
            self.log.push(format!("update {:.4}", dt));
        }

        fn on_render(&mut self, _dt: f64, _viewport: Viewport, _renderer: &mut dyn RenderBackend) {
            self.log.push("render".to_string());
        }
    }

    #[test]
    fn test_keys_then_updates_then_render() {
        let mut app = Recorder::default();
        let mut renderer = HeadlessRenderer::new();
        let mut frame_loop = FrameLoop::new(LoopConfig::default().fixed_timestep(Some(0.01)));

        let control = frame_loop.tick(
            &mut app,
            &[KeyEvent::press(Key::Space)],
            0.025,
            Viewport::new(800, 600),
            &mut renderer,
        );

        assert_eq!(control, LoopControl::Continue);
        assert_eq!(
            app.log,
            vec!["key Space", "update 0.0100", "update 0.0100", "render"],
            "unexpected order: {:?}",
            app.log
        );
    }

    #[test]
    fn test_exit_after_frame_completes() {
        let mut app = Recorder::default();
        let mut renderer = HeadlessRenderer::new();
        let mut frame_loop = FrameLoop::new(LoopConfig::default().fixed_timestep(None));

        let control = frame_loop.tick(
            &mut app,
            &[KeyEvent::press(Key::Escape), KeyEvent::press(Key::Space)],
            0.016,
            Viewport::new(800, 600),
            &mut renderer,
        );

        assert_eq!(control, LoopControl::Exit);
        assert_eq!(app.log.last().map(String::as_str), Some("render"));
        assert_eq!(app.log.len(), 4, "log: {:?}", app.log);
        assert_eq!(frame_loop.frames(), 1);
    }

    #[test]
    fn test_substeps_are_capped() {
        let mut app = Recorder::default();
        let mut renderer = HeadlessRenderer::new();
        let config = LoopConfig::default()
            .fixed_timestep(Some(0.01))
            .max_substeps(4);
        let mut frame_loop = FrameLoop::new(config);

        // A one-second hitch must not queue a hundred updates.
        frame_loop.tick(&mut app, &[], 1.0, Viewport::new(1, 1), &mut renderer);
        assert_eq!(frame_loop.last_updates(), 4);

        frame_loop.tick(&mut app, &[], 0.0, Viewport::new(1, 1), &mut renderer);
        assert_eq!(frame_loop.last_updates(), 0);
    }

    #[test]
    fn test_zero_substep_field_still_updates() {
        let mut app = Recorder::default();
        let mut renderer = HeadlessRenderer::new();
        let config = LoopConfig {
            fixed_timestep: Some(0.01),
            max_substeps: 0,
        };
        let mut frame_loop = FrameLoop::new(config);

        frame_loop.tick(&mut app, &[], 0.015, Viewport::new(1, 1), &mut renderer);

        assert_eq!(frame_loop.last_updates(), 1);
        assert_eq!(app.log, vec!["update 0.0100", "render"], "log: {:?}", app.log);
    }
}
