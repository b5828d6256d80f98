//! The seven demos, all driven by [`DemoApp`](crate::framework::DemoApp).

mod basic;
mod custom_geometry;
mod geometry;
mod shadow;
mod solar_system;
mod spotlight;
mod texture_map;

pub use basic::*;
pub use custom_geometry::*;
pub use geometry::*;
pub use shadow::*;
pub use solar_system::*;
pub use spotlight::{SpotlightDemo, TrackedTarget, ORBIT_RATE};
pub use texture_map::*;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use crate::framework::Demo;

/// Selects one of the demos.
#[derive(Copy, Clone, Eq, PartialEq, Default, Debug, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DemoKind {
    #[default]
    Basic,
    Geometry,
    SolarSystem,
    TextureMap,
    CustomGeometry,
    Spotlight,
    Shadow,
}

impl DemoKind {
    /// Creates the demo. `geometry` only matters to [`DemoKind::Geometry`].
    pub fn create(self, geometry: GeometryKind) -> Box<dyn Demo> {
        match self {
            Self::Basic => Box::<BasicDemo>::default(),
            Self::Geometry => Box::new(GeometryDemo::new(geometry)),
            Self::SolarSystem => Box::<SolarSystemDemo>::default(),
            Self::TextureMap => Box::<TextureMapDemo>::default(),
            Self::CustomGeometry => Box::<CustomGeometryDemo>::default(),
            Self::Spotlight => Box::<SpotlightDemo>::default(),
            Self::Shadow => Box::<ShadowDemo>::default(),
        }
    }
}


#[cfg(test)]
mod test {
    use clap::ValueEnum;
    use crate::framework::{DemoApp, DemoError, DemoState, HeadlessRenderer, Renderer, StaticHost};
    use crate::graphics::TextureLoader;
    use super::{DemoKind, GeometryKind};

    fn app(kind: DemoKind) -> DemoApp<StaticHost, HeadlessRenderer, Box<dyn crate::framework::Demo>> {
        DemoApp::new(
            StaticHost::new(800, 600),
            HeadlessRenderer::new(),
            kind.create(GeometryKind::default()),
            TextureLoader::new("missing-assets"),
        )
    }

    #[test]
    fn frames_before_setup_fail_without_drawing() {
        for kind in DemoKind::value_variants() {
            let mut app = app(*kind);
            assert!(matches!(app.on_frame(16.0), Err(DemoError::CameraNotConfigured)), "{kind:?}");
            assert!(matches!(app.update(16.0), Err(DemoError::CameraNotConfigured)), "{kind:?}");
            assert_eq!(0, app.renderer().frames(), "{kind:?}");
            assert_eq!(0, app.host().frame_requests(), "{kind:?}");

            // Resizing early is ignored.
            app.resize().unwrap();
            assert_eq!(DemoState::Uninitialized, app.state());
        }
    }

    #[test]
    fn every_demo_runs() {
        for kind in DemoKind::value_variants() {
            let mut app = app(*kind);
            app.initialize().unwrap();
            for frame in 0..3 {
                app.on_frame(frame as f64 * 16.0).unwrap();
            }
            assert_eq!(3, app.renderer().frames(), "{kind:?}");
            assert_eq!(app.camera(), app.renderer().last_camera(), "{kind:?}");
            // One request from setup, one per frame.
            assert_eq!(4, app.host().frame_requests(), "{kind:?}");
        }
    }

    #[test]
    fn resize_is_idempotent() {
        for kind in DemoKind::value_variants() {
            let mut app = app(*kind);
            app.initialize().unwrap();
            let camera = app.camera().unwrap();
            app.resize().unwrap();
            let first = (*app.scene().camera(camera).unwrap(), app.renderer().size());
            app.resize().unwrap();
            let second = (*app.scene().camera(camera).unwrap(), app.renderer().size());
            assert_eq!(first, second, "{kind:?}");
            assert_eq!((800, 600), second.1);
            assert!((second.0.aspect - 800.0 / 600.0).abs() < 1e-6);
        }
    }

    #[test]
    fn only_the_shadow_demo_enables_shadow_maps() {
        for kind in DemoKind::value_variants() {
            let mut app = app(*kind);
            app.initialize().unwrap();
            assert_eq!(*kind == DemoKind::Shadow, app.renderer().shadow_map_enabled(), "{kind:?}");
        }
    }

    #[test]
    fn parses_kebab_case() {
        assert_eq!(Ok(DemoKind::SolarSystem), DemoKind::from_str("solar-system", false));
        let kind: DemoKind = serde_yaml::from_str("custom-geometry").unwrap();
        assert_eq!(DemoKind::CustomGeometry, kind);
    }
}
