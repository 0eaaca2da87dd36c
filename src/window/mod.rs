//! Window management module
//!
//! Drives an [`App`] from a winit event loop, rendering through [`WgpuRenderer`].

pub mod settings;

pub use settings::WindowSettings;

use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::ModifiersState;
use winit::window::WindowId;

use crate::app::{App, FrameLoop, Key, KeyAction, KeyEvent, LoopConfig, LoopControl, Modifiers};
use crate::render::gpu::{DepthTexture, GpuContext, WgpuRenderer};
use crate::render::Viewport;

/// Open a window and run `app` until it asks to exit or the window is closed.
///
/// Setup failures (adapter, device, surface, shader compilation) stop the loop and are
/// returned.
pub fn run<A: App + 'static>(
    settings: WindowSettings,
    loop_config: LoopConfig,
    app: A,
) -> anyhow::Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut runner = Runner {
        settings,
        app,
        frame_loop: FrameLoop::new(loop_config),
        graphics: None,
        events: Vec::new(),
        modifiers: ModifiersState::empty(),
        last_frame_time: Instant::now(),
        error: None,
    };

    event_loop.run_app(&mut runner)?;

    match runner.error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct Graphics {
    window: Arc<winit::window::Window>,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: DepthTexture,
    renderer: WgpuRenderer,
}

impl Graphics {
    fn new(event_loop: &ActiveEventLoop, settings: &WindowSettings) -> anyhow::Result<Self> {
        let window_attrs = winit::window::WindowAttributes::default()
            .with_title(&settings.title)
            .with_inner_size(winit::dpi::LogicalSize::new(settings.size.0, settings.size.1))
            .with_resizable(settings.resizable);
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .map_err(crate::SetupError::from)?;
        let (ctx, adapter) = GpuContext::request_blocking(&instance, Some(&surface))?;

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow::anyhow!("surface reports no supported formats"))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if settings.vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&ctx.device, &config);

        let depth_texture = DepthTexture::new(&ctx, config.width, config.height);
        let renderer = WgpuRenderer::new(ctx, format);

        Ok(Self {
            window,
            surface,
            config,
            depth_texture,
            renderer,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface
            .configure(&self.renderer.context().device, &self.config);
        self.depth_texture
            .resize(self.renderer.context(), width, height);
    }

    fn viewport(&self) -> Viewport {
        Viewport::new(self.config.width, self.config.height)
    }
}

struct Runner<A> {
    settings: WindowSettings,
    app: A,
    frame_loop: FrameLoop,
    graphics: Option<Graphics>,
    events: Vec<KeyEvent>,
    modifiers: ModifiersState,
    last_frame_time: Instant,
    error: Option<anyhow::Error>,
}

impl<A: App> Runner<A> {
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        tracing::error!("setup failed: {:#}", err);
        self.error = Some(err);
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(graphics) = &mut self.graphics else {
            return;
        };

        let now = Instant::now();
        let frame_dt = (now - self.last_frame_time).as_secs_f64();
        self.last_frame_time = now;

        let surface_texture = match graphics.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::warn!("surface lost, reconfiguring");
                graphics
                    .surface
                    .configure(&graphics.renderer.context().device, &graphics.config);
                return;
            }
            Err(e) => {
                tracing::error!("Surface error: {:?}", e);
                return;
            }
        };
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let events = std::mem::take(&mut self.events);
        let viewport = graphics.viewport();
        let control = self.frame_loop.tick(
            &mut self.app,
            &events,
            frame_dt,
            viewport,
            &mut graphics.renderer,
        );

        graphics
            .renderer
            .flush(&view, &graphics.depth_texture, self.settings.clear_color);
        surface_texture.present();

        if control == LoopControl::Exit {
            event_loop.exit();
        }
    }
}

impl<A: App> ApplicationHandler for Runner<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.graphics.is_some() || self.error.is_some() {
            return;
        }

        let mut graphics = match Graphics::new(event_loop, &self.settings) {
            Ok(graphics) => graphics,
            Err(err) => return self.fail(event_loop, err),
        };
        if let Err(err) = self.frame_loop.setup(&mut self.app, &mut graphics.renderer) {
            return self.fail(event_loop, err.into());
        }

        self.graphics = Some(graphics);
        self.last_frame_time = Instant::now();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.graphics.is_none() {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(graphics) = &mut self.graphics {
                    graphics.resize(size.width, size.height);
                }
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
            }
            WindowEvent::KeyboardInput {
                event: key_event, ..
            } => {
                if key_event.repeat {
                    return;
                }
                if let Some(key) = Key::from_winit(&key_event.logical_key) {
                    let action = match key_event.state {
                        ElementState::Pressed => KeyAction::Press,
                        ElementState::Released => KeyAction::Release,
                    };
                    self.events.push(KeyEvent {
                        key,
                        action,
                        modifiers: Modifiers::from_winit(self.modifiers),
                    });
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(graphics) = &self.graphics {
            graphics.window.request_redraw();
        }
    }
}
