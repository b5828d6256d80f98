mod g3d;
mod camera;
mod flat;
mod helper;
mod light;
mod material;
mod mesh;
mod object;
mod shape;
mod wireframe;

pub use g3d::*;
pub use camera::*;
pub use flat::*;
pub use helper::*;
pub use light::*;
pub use material::*;
pub use mesh::*;
pub use object::*;
pub use shape::*;
pub use wireframe::*;
