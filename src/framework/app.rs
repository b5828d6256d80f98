use derive_more::*;
use tracing::instrument;
use crate::framework::{Host, OrbitControls, PointerEvent, RenderError, Renderer, RendererOptions};
use crate::graphics::{GeometryError, TextureLoader};
use crate::graphics::scene::{NodeId, Scene, SceneGraphError};

/**
 * A single demo: builds a scene once, then mutates it every frame.
 * Setup steps run in declaration order, each seeing what the previous ones built.
 */
pub trait Demo {
    fn title(&self) -> &str;

    fn renderer_options(&self) -> RendererOptions {
        RendererOptions::default()
    }

    /// Creates the camera to render through.
    fn setup_camera(&mut self, ctx: &mut SetupContext) -> Result<NodeId, DemoError>;

    fn setup_lights(&mut self, ctx: &mut SetupContext) -> Result<(), DemoError>;

    fn setup_model(&mut self, ctx: &mut SetupContext) -> Result<(), DemoError>;

    /// Orbit controls around the origin unless overridden.
    fn setup_controls(&mut self, ctx: &mut SetupContext) -> Result<Option<OrbitControls>, DemoError> {
        let camera = ctx.camera()?;
        Ok(Some(OrbitControls::attach(ctx.scene, camera)?))
    }

    /// Advances the scene to `seconds` since the start of the frame clock.
    fn update(&mut self, scene: &mut Scene, seconds: f32) -> Result<(), DemoError>;
}

impl<D: Demo + ?Sized> Demo for Box<D> {
    fn title(&self) -> &str { (**self).title() }
    fn renderer_options(&self) -> RendererOptions { (**self).renderer_options() }
    fn setup_camera(&mut self, ctx: &mut SetupContext) -> Result<NodeId, DemoError> { (**self).setup_camera(ctx) }
    fn setup_lights(&mut self, ctx: &mut SetupContext) -> Result<(), DemoError> { (**self).setup_lights(ctx) }
    fn setup_model(&mut self, ctx: &mut SetupContext) -> Result<(), DemoError> { (**self).setup_model(ctx) }
    fn setup_controls(&mut self, ctx: &mut SetupContext) -> Result<Option<OrbitControls>, DemoError> { (**self).setup_controls(ctx) }
    fn update(&mut self, scene: &mut Scene, seconds: f32) -> Result<(), DemoError> { (**self).update(scene, seconds) }
}

/// What setup steps get to work with.
pub struct SetupContext<'a> {
    pub scene: &'a mut Scene,
    pub textures: &'a TextureLoader,
    camera: Option<NodeId>,
    client_size: (u32, u32),
}

impl<'a> SetupContext<'a> {

    /// Camera created by [`Demo::setup_camera`].
    pub fn camera(&self) -> Result<NodeId, DemoError> {
        self.camera.ok_or(DemoError::CameraNotConfigured)
    }

    /// Container size, never zero.
    pub fn client_size(&self) -> (u32, u32) {
        self.client_size
    }

    pub fn aspect(&self) -> f32 {
        self.client_size.0 as f32 / self.client_size.1 as f32
    }
}

/// Setup completion. There is no way back to [`DemoState::Uninitialized`].
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum DemoState {
    Uninitialized,
    Running { camera: NodeId },
}

/**
 * Drives a [`Demo`]: owns its scene, renderer and host, runs setup in order,
 * keeps the camera in sync with the container size and renders frames.
 */
pub struct DemoApp<H, R, D> {
    host: H,
    renderer: R,
    demo: D,
    scene: Scene,
    textures: TextureLoader,
    controls: Option<OrbitControls>,
    state: DemoState,
}

impl<H: Host, R: Renderer, D: Demo> DemoApp<H, R, D> {

    pub fn new(host: H, renderer: R, demo: D, textures: TextureLoader) -> Self {
        Self {
            host,
            renderer,
            demo,
            scene: Scene::new(),
            textures,
            controls: None,
            state: DemoState::Uninitialized,
        }
    }

    /**
     * Builds the scene: camera, lights, model, then controls.
     * Sizes the renderer and schedules the first frame.
     */
    #[instrument(skip_all)]
    pub fn initialize(&mut self) -> Result<(), DemoError> {
        if self.state != DemoState::Uninitialized {
            return Err(DemoError::AlreadyInitialized);
        }
        log::info!("Initializing {}", self.demo.title());
        let options = self.demo.renderer_options();
        self.renderer.set_pixel_ratio(self.host.pixel_ratio());
        self.renderer.set_shadow_map_enabled(options.shadow_map);
        self.scene = Scene::new();

        let mut ctx = SetupContext {
            scene: &mut self.scene,
            textures: &self.textures,
            camera: None,
            client_size: clamped(self.host.client_size()),
        };
        let camera = self.demo.setup_camera(&mut ctx)?;
        match ctx.scene.camera(camera) {
            Ok(_) => {},
            Err(SceneGraphError::WrongKind) => return Err(DemoError::NotACamera),
            Err(_) => return Err(DemoError::CameraNotConfigured),
        }
        ctx.camera = Some(camera);
        log::debug!("Camera ready");
        self.demo.setup_lights(&mut ctx)?;
        log::debug!("Lights ready");
        self.demo.setup_model(&mut ctx)?;
        log::debug!("Model ready");
        self.controls = self.demo.setup_controls(&mut ctx)?;

        self.state = DemoState::Running { camera };
        self.resize()?;
        self.host.request_frame();
        Ok(())
    }

    /**
     * Matches camera aspect and renderer size to the container.
     * Does nothing before initialization.
     */
    pub fn resize(&mut self) -> Result<(), DemoError> {
        let DemoState::Running { camera } = self.state else {
            return Ok(());
        };
        let (width, height) = clamped(self.host.client_size());
        let camera = self.scene.camera_mut(camera)?;
        camera.aspect = width as f32 / height as f32;
        camera.update_projection_matrix();
        self.renderer.set_size(width, height);
        log::debug!("Resized to {width}x{height}");
        Ok(())
    }

    /**
     * Renders the scene, advances it to `timestamp_ms`, then requests the next frame.
     * Fails without drawing when no camera was configured.
     */
    #[instrument(skip_all)]
    pub fn on_frame(&mut self, timestamp_ms: f64) -> Result<(), DemoError> {
        let DemoState::Running { camera } = self.state else {
            return Err(DemoError::CameraNotConfigured);
        };
        log::trace!("Frame at {timestamp_ms}ms");
        self.renderer.render(&self.scene, camera)?;
        self.update(timestamp_ms)?;
        self.host.request_frame();
        Ok(())
    }

    /// Advances the scene without rendering.
    pub fn update(&mut self, timestamp_ms: f64) -> Result<(), DemoError> {
        if self.state == DemoState::Uninitialized {
            return Err(DemoError::CameraNotConfigured);
        }
        let seconds = (timestamp_ms * 0.001) as f32;
        self.demo.update(&mut self.scene, seconds)
    }

    /// Forwards pointer input to the controls, if any.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Result<(), DemoError> {
        let Some(controls) = &mut self.controls else {
            return Ok(());
        };
        let (_, height) = clamped(self.host.client_size());
        controls.handle(event, &mut self.scene, height as f32)?;
        Ok(())
    }

    pub fn state(&self) -> DemoState {
        self.state
    }

    pub fn camera(&self) -> Option<NodeId> {
        match self.state {
            DemoState::Running { camera } => Some(camera),
            DemoState::Uninitialized => None,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn demo(&self) -> &D {
        &self.demo
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn controls(&self) -> Option<&OrbitControls> {
        self.controls.as_ref()
    }
}

fn clamped((width, height): (u32, u32)) -> (u32, u32) {
    (width.max(1), height.max(1))
}

#[derive(Error, Display, Debug)]
pub enum DemoError {
    #[display(fmt="camera must be configured before rendering")]
    CameraNotConfigured,
    #[display(fmt="camera node is not a camera")]
    NotACamera,
    #[display(fmt="{subject} must be set up before updating")]
    MissingSubject { subject: &'static str },
    #[display(fmt="demo is already initialized")]
    AlreadyInitialized,
    #[display(fmt="{source}")]
    SceneGraph { source: SceneGraphError },
    #[display(fmt="{source}")]
    Render { source: RenderError },
    #[display(fmt="{source}")]
    Geometry { source: GeometryError },
}

impl From<SceneGraphError> for DemoError {
    fn from(source: SceneGraphError) -> Self {
        Self::SceneGraph { source }
    }
}

impl From<RenderError> for DemoError {
    fn from(source: RenderError) -> Self {
        Self::Render { source }
    }
}

impl From<GeometryError> for DemoError {
    fn from(source: GeometryError) -> Self {
        Self::Geometry { source }
    }
}


#[cfg(test)]
mod test {
    use crate::framework::*;
    use crate::graphics::TextureLoader;
    use crate::graphics::g3d::{Object3D, PerspectiveCamera};
    use crate::graphics::scene::{NodeId, Scene};

    /// Records the order setup steps ran in.
    #[derive(Default)]
    struct Recorder {
        steps: Vec<&'static str>,
        camera_is_group: bool,
        updates: Vec<f32>,
    }

    impl Demo for Recorder {
        fn title(&self) -> &str { "recorder" }

        fn setup_camera(&mut self, ctx: &mut SetupContext) -> Result<NodeId, DemoError> {
            self.steps.push("camera");
            if self.camera_is_group {
                return Ok(ctx.scene.add(Object3D::group())?);
            }
            Ok(ctx.scene.spawn(Object3D::camera(PerspectiveCamera::new(75.0, ctx.aspect(), 0.1, 1000.0))))
        }

        fn setup_lights(&mut self, ctx: &mut SetupContext) -> Result<(), DemoError> {
            ctx.camera()?;
            self.steps.push("lights");
            Ok(())
        }

        fn setup_model(&mut self, _ctx: &mut SetupContext) -> Result<(), DemoError> {
            self.steps.push("model");
            Ok(())
        }

        fn setup_controls(&mut self, _ctx: &mut SetupContext) -> Result<Option<OrbitControls>, DemoError> {
            self.steps.push("controls");
            Ok(None)
        }

        fn update(&mut self, _scene: &mut Scene, seconds: f32) -> Result<(), DemoError> {
            self.updates.push(seconds);
            Ok(())
        }
    }

    fn app(demo: Recorder) -> DemoApp<StaticHost, HeadlessRenderer, Recorder> {
        DemoApp::new(StaticHost::new(800, 600), HeadlessRenderer::new(), demo, TextureLoader::new("."))
    }

    #[test]
    fn setup_runs_in_order() {
        let mut app = app(Recorder::default());
        app.initialize().unwrap();
        assert_eq!(vec!["camera", "lights", "model", "controls"], app.demo().steps);
        assert_eq!(1, app.host().frame_requests());
        assert_eq!((800, 600), app.renderer().size());
        assert!(matches!(app.initialize(), Err(DemoError::AlreadyInitialized)));
    }

    #[test]
    fn frame_before_initialize_fails_without_drawing() {
        let mut app = app(Recorder::default());
        assert!(matches!(app.on_frame(16.0), Err(DemoError::CameraNotConfigured)));
        assert!(matches!(app.update(16.0), Err(DemoError::CameraNotConfigured)));
        assert_eq!(0, app.renderer().frames());
        assert_eq!(0, app.host().frame_requests());
        assert!(app.demo().updates.is_empty());
    }

    #[test]
    fn resize_before_initialize_is_a_no_op() {
        let mut app = app(Recorder::default());
        app.resize().unwrap();
        assert_eq!(DemoState::Uninitialized, app.state());
        assert_eq!((300, 150), app.renderer().size());
    }

    #[test]
    fn frame_renders_then_updates_in_seconds() {
        let mut app = app(Recorder::default());
        app.initialize().unwrap();
        app.on_frame(1500.0).unwrap();
        assert_eq!(1, app.renderer().frames());
        assert_eq!(vec![1.5], app.demo().updates);
        assert_eq!(2, app.host().frame_requests());
    }

    #[test]
    fn resize_tracks_container() {
        let mut app = app(Recorder::default());
        app.initialize().unwrap();
        app.host_mut().set_size(1000, 0);
        app.resize().unwrap();
        let camera = app.scene().camera(app.camera().unwrap()).unwrap();
        assert_eq!(1000.0, camera.aspect);
        assert_eq!((1000, 1), app.renderer().size());
    }

    #[test]
    fn camera_must_be_a_camera() {
        let mut app = app(Recorder { camera_is_group: true, ..Default::default() });
        assert!(matches!(app.initialize(), Err(DemoError::NotACamera)));
        assert_eq!(DemoState::Uninitialized, app.state());
    }
}
