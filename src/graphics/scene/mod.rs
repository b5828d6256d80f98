mod scene_graph;
mod scene;

pub use scene_graph::*;
pub use scene::*;
