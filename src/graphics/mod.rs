//! Module that defines both graphics primitives, and the 3D engine that makes use of those primitives.
//! The graphics primitives are stored in the domain [`GraphicsState`].
//! The 3D graphics engine is [`G3D`], fed by a [`Scene`] flattened for one camera.

mod state;
pub mod g3d;
mod color;
mod shader;
pub mod scene;
mod buffer;
mod texture;
mod gpu;

pub use state::*;
pub use g3d::*;
pub use color::*;
pub use shader::*;
pub use scene::*;
pub use buffer::*;
pub use texture::*;
pub use gpu::*;
