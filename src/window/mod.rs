use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use derive_more::*;
use glam::Vec2;
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{EventLoop, EventLoopWindowTarget};
use winit::window::{Window, WindowBuilder};
use crate::framework::{Demo, DemoApp, DemoError, Host, PointerButton, PointerEvent, Renderer};
use crate::graphics::{GpuRenderer, GraphicsError, TextureLoader};

/**
 * Opens a window and uses it to power a [`DemoApp`].
 * For rendering applications on Windows, Linux and OSX.
 */
#[derive(Clone, Debug)]
pub struct WindowRunner {
    title: Option<String>,
    window_width: u32,
    window_height: u32,
    assets: PathBuf,
    antialias: Option<bool>,
}

impl Default for WindowRunner {
    fn default() -> Self {
        Self {
            title: None,
            window_width: 800,
            window_height: 600,
            assets: PathBuf::from("assets"),
            antialias: None,
        }
    }
}

impl WindowRunner {

    /// Default window size to use when in windowed mode.
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    /// Window title. Defaults to the demo's title.
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    /// Directory texture paths are relative to.
    pub fn with_assets(mut self, assets: impl Into<PathBuf>) -> Self {
        self.assets = assets.into();
        self
    }

    /// Overrides the demo's antialias preference.
    pub fn with_antialias(mut self, antialias: Option<bool>) -> Self {
        self.antialias = antialias;
        self
    }

    /**
     * Runs the demo until the window closes or a frame fails.
     */
    pub fn run<D: Demo>(self, demo: D) -> Result<(), WindowError> {
        let event_loop = EventLoop::new()?;
        let title = self.title.clone().unwrap_or_else(|| demo.title().to_owned());
        let window = WindowBuilder::new()
            .with_title(title)
            .with_inner_size(LogicalSize::new(self.window_width, self.window_height))
            .build(&event_loop)?;
        let window = Arc::new(window);

        let mut options = demo.renderer_options();
        if let Some(antialias) = self.antialias {
            options.antialias = antialias;
        }
        let renderer = GpuRenderer::new(window.clone(), options)?;
        let host = WinitHost::new(window);
        let mut app = DemoApp::new(host, renderer, demo, TextureLoader::new(self.assets));
        app.initialize()?;

        // Starts frame loop
        let clock = FrameClock::start();
        let mut outcome = Ok(());
        event_loop.run(|event, target| {
            if let Event::WindowEvent { event, .. } = event {
                if let Err(err) = handle_window_event(event, &mut app, &clock, target) {
                    log::error!("{err}");
                    outcome = Err(err);
                    target.exit();
                }
            }
        })?;
        outcome.map_err(WindowError::from)
    }
}

fn handle_window_event<D: Demo>(
    event: WindowEvent,
    app: &mut DemoApp<WinitHost, GpuRenderer, D>,
    clock: &FrameClock,
    target: &EventLoopWindowTarget<()>,
) -> Result<(), DemoError> {
    match event {
        WindowEvent::Resized(_) => app.resize()?,
        WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
            app.renderer_mut().set_pixel_ratio(scale_factor);
            app.resize()?;
        },
        WindowEvent::RedrawRequested => app.on_frame(clock.elapsed_ms())?,
        WindowEvent::CursorMoved { position, .. } => {
            let position = position.to_logical::<f32>(app.host().pixel_ratio());
            app.handle_pointer(PointerEvent::Moved { position: Vec2::new(position.x, position.y) })?;
        },
        WindowEvent::MouseInput { state, button, .. } => {
            let button = match button {
                MouseButton::Left => PointerButton::Left,
                MouseButton::Right => PointerButton::Right,
                MouseButton::Middle => PointerButton::Middle,
                _ => return Ok(()),
            };
            let event = match state {
                ElementState::Pressed => PointerEvent::Pressed { button },
                ElementState::Released => PointerEvent::Released { button },
            };
            app.handle_pointer(event)?;
        },
        WindowEvent::MouseWheel { delta, .. } => {
            let delta = match delta {
                MouseScrollDelta::LineDelta(_, y) => -y,
                MouseScrollDelta::PixelDelta(position) => -position.y as f32,
            };
            app.handle_pointer(PointerEvent::Wheel { delta })?;
        },
        WindowEvent::CloseRequested => target.exit(),
        _ => {}
    }
    Ok(())
}

/// [`Host`] backed by a winit window.
pub struct WinitHost {
    window: Arc<Window>,
}

impl WinitHost {
    pub fn new(window: Arc<Window>) -> Self {
        Self { window }
    }
}

impl Host for WinitHost {
    fn client_size(&self) -> (u32, u32) {
        let size = self.window.inner_size().to_logical::<f64>(self.window.scale_factor());
        (size.width.round() as u32, size.height.round() as u32)
    }

    fn pixel_ratio(&self) -> f64 {
        self.window.scale_factor()
    }

    fn request_frame(&mut self) {
        self.window.request_redraw();
    }
}

/// Milliseconds since the loop started, like a browser's frame timestamp.
#[derive(Copy, Clone, Debug)]
pub struct FrameClock {
    start: Instant,
}

impl FrameClock {
    pub fn start() -> Self {
        Self { start: Instant::now() }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

#[derive(Error, Display, Debug)]
pub enum WindowError {
    #[display(fmt="{source}")]
    EventLoop { source: EventLoopError },
    #[display(fmt="failed to open window: {source}")]
    Os { source: OsError },
    #[display(fmt="{source}")]
    Graphics { source: GraphicsError },
    #[display(fmt="{source}")]
    Demo { source: DemoError },
}

impl From<EventLoopError> for WindowError {
    fn from(source: EventLoopError) -> Self {
        Self::EventLoop { source }
    }
}

impl From<OsError> for WindowError {
    fn from(source: OsError) -> Self {
        Self::Os { source }
    }
}

impl From<GraphicsError> for WindowError {
    fn from(source: GraphicsError) -> Self {
        Self::Graphics { source }
    }
}

impl From<DemoError> for WindowError {
    fn from(source: DemoError) -> Self {
        Self::Demo { source }
    }
}
