use fxhash::FxHashSet;
use glam::Vec3;
use crate::graphics::Color;
use crate::graphics::g3d::MeshData;

/**
 * Independent line segments. Every two consecutive positions form one segment.
 * Colors, when present, are per position.
 */
#[derive(Clone, Default, Debug, PartialEq)]
pub struct LineData {
    pub positions: Vec<Vec3>,
    pub colors: Option<Vec<Color>>,
}

impl LineData {

    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_segment(&mut self, start: Vec3, end: Vec3) {
        self.positions.extend([start, end]);
    }

    pub fn segment_count(&self) -> usize {
        self.positions.len() / 2
    }

    pub fn segments(&self) -> impl Iterator<Item = (Vec3, Vec3)> + '_ {
        self.positions
            .chunks_exact(2)
            .map(|pair| (pair[0], pair[1]))
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        if let Some(colors) = &mut self.colors {
            colors.clear();
        }
    }
}

/**
 * Edges of every triangle in a mesh, each shared edge emitted once.
 */
pub struct WireframeGeometry;

impl WireframeGeometry {
    pub fn from_mesh(mesh: &MeshData) -> LineData {
        let mut seen = FxHashSet::default();
        let mut lines = LineData::new();
        for triangle in mesh.triangle_indices() {
            for k in 0..3 {
                let a = triangle[k];
                let b = triangle[(k + 1) % 3];
                if !seen.insert((a.min(b), a.max(b))) {
                    continue;
                }
                let (Some(&start), Some(&end)) = (mesh.positions.get(a as usize), mesh.positions.get(b as usize)) else {
                    continue;
                };
                lines.push_segment(start, end);
            }
        }
        lines
    }
}


#[cfg(test)]
mod test {
    use crate::graphics::g3d::{MeshData, PlaneGeometry, BoxGeometry};
    use super::WireframeGeometry;

    #[test]
    fn quad_shares_diagonal() {
        let lines = WireframeGeometry::from_mesh(&PlaneGeometry::default().into());
        assert_eq!(5, lines.segment_count());
    }

    #[test]
    fn box_edges() {
        // Faces do not share vertices, so each face contributes its own 5 edges.
        let lines = WireframeGeometry::from_mesh(&BoxGeometry::default().into());
        assert_eq!(30, lines.segment_count());
    }

    #[test]
    fn non_indexed_triangle() {
        let mut mesh = MeshData::new();
        mesh.positions = vec![glam::Vec3::ZERO, glam::Vec3::X, glam::Vec3::Y];
        let lines = WireframeGeometry::from_mesh(&mesh);
        assert_eq!(3, lines.segment_count());
    }
}
