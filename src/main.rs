use std::path::PathBuf;
use anyhow::Result;
use clap::Parser;
use scene_demos::config::DemoConfig;
use scene_demos::demos::{DemoKind, GeometryKind};
use scene_demos::framework::{Demo, DemoApp, HeadlessRenderer, StaticHost};
use scene_demos::graphics::TextureLoader;
use scene_demos::window::WindowRunner;

/// Milliseconds between simulated frames in headless mode.
const HEADLESS_FRAME_MS: f64 = 16.0;

#[derive(Parser, Debug)]
#[command(version, about = "Small 3D scenes driven by one demo scaffold")]
struct Cli {
    /// Demo to run
    #[arg(short, long, value_enum)]
    demo: Option<DemoKind>,

    /// Primitive shown by the geometry demo
    #[arg(short, long, value_enum)]
    geometry: Option<GeometryKind>,

    /// YAML config file. Defaults to scene_demos.yaml when present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory textures are loaded from
    #[arg(long)]
    assets: Option<PathBuf>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Render this many frames without a window and print statistics
    #[arg(long, value_name = "FRAMES")]
    headless: Option<u32>,
}

impl Cli {
    fn apply(self, config: &mut DemoConfig) -> Option<u32> {
        if let Some(demo) = self.demo { config.demo = demo; }
        if let Some(geometry) = self.geometry { config.geometry = geometry; }
        if let Some(assets) = self.assets { config.assets = assets; }
        if let Some(width) = self.width { config.window.width = width; }
        if let Some(height) = self.height { config.window.height = height; }
        self.headless
    }
}

fn main() -> Result<()> {
    #[cfg(feature = "profile")]
    let _guard = {
        use tracing_subscriber::prelude::*;
        let (chrome_layer, guard) = tracing_chrome::ChromeLayerBuilder::new().build();
        tracing_subscriber::registry().with(chrome_layer).init();
        guard
    };
    env_logger::init();

    let cli = Cli::parse();
    let mut config = DemoConfig::load_or_default(cli.config.as_deref())?;
    let headless = cli.apply(&mut config);
    log::debug!("{config:?}");

    let demo = config.demo.create(config.geometry);
    match headless {
        Some(frames) => run_headless(&config, demo, frames),
        None => {
            WindowRunner::default()
                .with_window_size(config.window.width, config.window.height)
                .with_title(config.window.title.clone())
                .with_assets(config.assets.clone())
                .with_antialias(config.antialias)
                .run(demo)?;
            Ok(())
        },
    }
}

fn run_headless(config: &DemoConfig, demo: Box<dyn Demo>, frames: u32) -> Result<()> {
    let host = StaticHost::new(config.window.width, config.window.height);
    let mut app = DemoApp::new(host, HeadlessRenderer::new(), demo, TextureLoader::new(&config.assets));
    app.initialize()?;
    for frame in 0..frames {
        app.on_frame(frame as f64 * HEADLESS_FRAME_MS)?;
    }
    let renderer = app.renderer();
    match renderer.last_frame() {
        Some(stats) => println!("{:?}: {} frames, last {stats:?}", config.demo, renderer.frames()),
        None => println!("{:?}: no frames rendered", config.demo),
    }
    Ok(())
}
