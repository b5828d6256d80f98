use glam::{Affine3A, Vec3};
use crate::graphics::Color;
use crate::graphics::g3d::{Object3D, ObjectKind, PerspectiveCamera};
use crate::graphics::scene::{NodeId, Node, SceneGraph, SceneGraphError};

/**
 * Scene graph of [`Object3D`]s with a dedicated root group.
 * Only nodes under the root are traversed and rendered. Nodes created with [`Scene::spawn`]
 * live beside the root until attached.
 */
pub struct Scene {
    graph: SceneGraph<Object3D>,
    root: NodeId,
    pub background: Option<Color>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {

    pub fn new() -> Self {
        let mut graph = SceneGraph::new();
        let root = graph.insert(Object3D::group().with_name("Scene"));
        Self { graph, root, background: None }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn graph(&self) -> &SceneGraph<Object3D> {
        &self.graph
    }

    /// Adds an object under the root.
    pub fn add(&mut self, object: Object3D) -> Result<NodeId, SceneGraphError> {
        self.add_child(self.root, object)
    }

    /// Creates a node outside of the rendered hierarchy.
    pub fn spawn(&mut self, object: Object3D) -> NodeId {
        self.graph.insert(object)
    }

    /**
     * Adds an object as the last child of `parent`.
     * Helpers are refreshed once so that they start out in sync with their subject.
     */
    pub fn add_child(&mut self, parent: NodeId, object: Object3D) -> Result<NodeId, SceneGraphError> {
        let is_helper = matches!(object.kind, ObjectKind::Helper(_));
        let node_id = self.graph.insert_child(object, parent)?;
        if is_helper {
            if let Err(err) = self.update_helper(node_id) {
                self.graph.remove(node_id);
                return Err(err);
            }
        }
        Ok(node_id)
    }

    /// Moves a node and its descendants under `parent`. The root stays a root.
    pub fn attach(&mut self, node_id: NodeId, parent: NodeId) -> Result<(), SceneGraphError> {
        if node_id == self.root {
            return Err(SceneGraphError::RootNotMovable);
        }
        self.graph.attach(node_id, parent)
    }

    pub fn get(&self, node_id: NodeId) -> Option<&Object3D> {
        self.graph.get(node_id)
    }

    pub fn get_mut(&mut self, node_id: NodeId) -> Option<&mut Object3D> {
        self.graph.get_mut(node_id)
    }

    pub fn object(&self, node_id: NodeId) -> Result<&Object3D, SceneGraphError> {
        self.graph.get(node_id).ok_or(SceneGraphError::NoSuchNode)
    }

    pub fn object_mut(&mut self, node_id: NodeId) -> Result<&mut Object3D, SceneGraphError> {
        self.graph.get_mut(node_id).ok_or(SceneGraphError::NoSuchNode)
    }

    pub fn node(&self, node_id: NodeId) -> Option<&Node<Object3D>> {
        self.graph.get_node(node_id)
    }

    pub fn camera(&self, node_id: NodeId) -> Result<&PerspectiveCamera, SceneGraphError> {
        self.object(node_id)?
            .as_camera()
            .ok_or(SceneGraphError::WrongKind)
    }

    pub fn camera_mut(&mut self, node_id: NodeId) -> Result<&mut PerspectiveCamera, SceneGraphError> {
        self.object_mut(node_id)?
            .as_camera_mut()
            .ok_or(SceneGraphError::WrongKind)
    }

    /// True if the node is the root or one of its descendants.
    pub fn contains(&self, node_id: NodeId) -> bool {
        self.graph.is_ancestor(self.root, node_id)
    }

    /**
     * First object under the root with the given name, depth first.
     */
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        let mut found = None;
        self.graph.propagate(self.root, (), |_, node_id, object| {
            if found.is_none() && object.name == name {
                found = Some(node_id);
            }
        });
        found
    }

    /**
     * Composition of the node's local transform with those of all its ancestors.
     */
    pub fn world_matrix(&self, node_id: NodeId) -> Result<Affine3A, SceneGraphError> {
        let mut matrix = Affine3A::IDENTITY;
        let mut current = Some(node_id);
        while let Some(id) = current {
            let node = self.graph.get_node(id).ok_or(SceneGraphError::NoSuchNode)?;
            matrix = node.value().transform.matrix() * matrix;
            current = node.parent_id();
        }
        Ok(matrix)
    }

    pub fn world_position(&self, node_id: NodeId) -> Result<Vec3, SceneGraphError> {
        Ok(self.world_matrix(node_id)?.translation.into())
    }

    /**
     * Visits every visible object under the root with its world matrix, parents before children.
     * Hidden objects hide their descendants too.
     */
    pub fn traverse<'a, F>(&'a self, mut function: F)
    where
        F: FnMut(NodeId, &'a Object3D, Affine3A)
    {
        self.graph.propagate(self.root, (Affine3A::IDENTITY, true), |(parent, parent_visible), node_id, object| {
            let world = parent * object.transform.matrix();
            let visible = parent_visible && object.visible;
            if visible {
                function(node_id, object, world);
            }
            (world, visible)
        });
    }

    /**
     * Recomputes a helper from the current state of its subject.
     */
    pub fn update_helper(&mut self, node_id: NodeId) -> Result<(), SceneGraphError> {
        let mut helper = self.object(node_id)?
            .as_helper()
            .ok_or(SceneGraphError::WrongKind)?
            .clone();
        helper.refresh(self)?;
        if let ObjectKind::Helper(slot) = &mut self.object_mut(node_id)?.kind {
            *slot = helper;
        }
        Ok(())
    }
}


#[cfg(test)]
mod test {
    use std::f32::consts::FRAC_PI_2;
    use std::sync::Arc;
    use glam::Vec3;
    use crate::math::Transform;
    use crate::graphics::Color;
    use crate::graphics::g3d::*;
    use crate::graphics::scene::SceneGraphError;
    use super::Scene;

    #[test]
    fn world_position_composes_ancestors() {
        let mut scene = Scene::new();
        let pivot = scene.add(Object3D::group()
            .with_transform(Transform::default().with_euler(0.0, FRAC_PI_2, 0.0))
        ).unwrap();
        let child = scene.add_child(pivot, Object3D::group()
            .with_transform(Transform::default().with_xyz(3.0, 0.5, 0.0))
        ).unwrap();
        let position = scene.world_position(child).unwrap();
        assert!(position.abs_diff_eq(Vec3::new(0.0, 0.5, -3.0), 1e-5), "{position}");
    }

    #[test]
    fn spawned_nodes_are_outside_the_scene() {
        let mut scene = Scene::new();
        let camera = scene.spawn(Object3D::camera(PerspectiveCamera::default()));
        assert!(!scene.contains(camera));
        let mut visited = 0;
        scene.traverse(|_, _, _| visited += 1);
        assert_eq!(1, visited);
        scene.attach(camera, scene.root()).unwrap();
        assert!(scene.contains(camera));
    }

    #[test]
    fn root_cannot_be_reparented() {
        let mut scene = Scene::new();
        let camera = scene.spawn(Object3D::camera(PerspectiveCamera::default()));
        assert_eq!(Err(SceneGraphError::RootNotMovable), scene.attach(scene.root(), camera));
        assert!(scene.graph().get_node(scene.root()).unwrap().parent_id().is_none());
        assert!(!scene.contains(camera));
    }

    #[test]
    fn traverse_skips_hidden_subtrees() {
        let mut scene = Scene::new();
        let hidden = scene.add(Object3D::group().with_name("hidden")).unwrap();
        scene.add_child(hidden, Object3D::group().with_name("child")).unwrap();
        scene.add(Object3D::group().with_name("shown")).unwrap();
        scene.object_mut(hidden).unwrap().visible = false;
        let mut names = Vec::new();
        scene.traverse(|_, object, _| names.push(object.name.clone()));
        assert_eq!(vec!["Scene".to_owned(), "shown".to_owned()], names);
    }

    #[test]
    fn find_by_name() {
        let mut scene = Scene::new();
        let group = scene.add(Object3D::group()).unwrap();
        let cube = scene.add_child(group, Object3D::group().with_name("cube")).unwrap();
        assert_eq!(Some(cube), scene.find_by_name("cube"));
        assert_eq!(None, scene.find_by_name("sphere"));
    }

    #[test]
    fn camera_kind_is_checked() {
        let mut scene = Scene::new();
        let group = scene.add(Object3D::group()).unwrap();
        assert!(matches!(scene.camera(group), Err(SceneGraphError::WrongKind)));
    }

    #[test]
    fn helper_is_stale_until_refreshed() {
        let mut scene = Scene::new();
        let light = scene.add(Object3D::light(SpotLight::new(Color::WHITE, 2.0))
            .with_transform(Transform::default().with_xyz(0.0, 5.0, 0.0))
        ).unwrap();
        let helper = scene.add(Object3D::helper(Helper::spot_light(light))).unwrap();
        let before = scene.object(helper).unwrap().as_helper().unwrap().lines().clone();
        assert_eq!(37, before.segment_count());

        if let Some(light) = scene.object_mut(light).unwrap().as_light_mut() {
            light.set_target(Vec3::new(3.0, 0.5, 0.0));
        }
        let stale = scene.object(helper).unwrap().as_helper().unwrap().lines().clone();
        assert_eq!(before, stale);

        scene.update_helper(helper).unwrap();
        let fresh = scene.object(helper).unwrap().as_helper().unwrap().lines().clone();
        assert_ne!(before, fresh);
        let (apex, axis_end) = fresh.segments().next().unwrap();
        let expected = (Vec3::new(3.0, 0.5, 0.0) - Vec3::new(0.0, 5.0, 0.0)).normalize();
        assert!(apex.abs_diff_eq(Vec3::new(0.0, 5.0, 0.0), 1e-5));
        assert!((axis_end - apex).normalize().abs_diff_eq(expected, 1e-4));
    }

    #[test]
    fn vertex_normals_follow_world_transform() {
        let mut scene = Scene::new();
        let geometry = Arc::new(MeshData::from(PlaneGeometry::default()));
        let material = Material::from(PhongMaterial::default()).into_shared();
        let mesh = scene.add(Object3D::mesh(geometry, material)
            .with_transform(Transform::default().with_euler(-FRAC_PI_2, 0.0, 0.0))
        ).unwrap();
        let helper = scene.add(Object3D::helper(Helper::vertex_normals(mesh, 0.1, Color::YELLOW))).unwrap();
        let helper = scene.object(helper).unwrap().as_helper().unwrap();
        assert_eq!(4, helper.lines().segment_count());
        assert_eq!(Color::YELLOW, helper.color());
        for (start, end) in helper.lines().segments() {
            assert!((end - start).abs_diff_eq(Vec3::new(0.0, 0.1, 0.0), 1e-5));
        }
    }

    #[test]
    fn helper_of_wrong_kind() {
        let mut scene = Scene::new();
        let group = scene.add(Object3D::group()).unwrap();
        let result = scene.add(Object3D::helper(Helper::spot_light(group)));
        assert_eq!(Err(SceneGraphError::WrongKind), result.map(|_| ()));
    }
}
