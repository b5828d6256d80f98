//! Demo scaffold: the [`Demo`] trait and the [`DemoApp`] controller that drives it,
//! plus the narrow [`Renderer`] and [`Host`] seams it talks to.

mod app;
mod controls;
mod host;
mod input;
mod renderer;

pub use app::*;
pub use controls::*;
pub use host::*;
pub use input::*;
pub use renderer::*;
