use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use derive_more::*;

/// A hierarchical collection of [`Node`]s with parent/child relationships.
/// A node has at most one parent, and a parent exclusively owns its children.
///
/// * `T` - Value type stored in each node.
///
pub struct SceneGraph<T> {
    root_ids: Vec<NodeId>,
    nodes: SlotMap<NodeId, Node<T>>,
}

impl<T> Default for SceneGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SceneGraph<T> {

    pub fn new() -> Self {
        Self {
            root_ids: Vec::default(),
            nodes: SlotMap::default(),
        }
    }

    pub fn root_ids(&self) -> &[NodeId] {
        &self.root_ids
    }

    /**
     * Iterator over all values in the graph in no particular order.
     */
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &T)> {
        self.nodes
            .iter()
            .map(|(id, node)| (id, &node.value))
    }

    /**
     * Inserts a root value and returns its id.
     */
    pub fn insert(&mut self, value: T) -> NodeId {
        let node_id = self.nodes.insert(Node {
            value,
            parent_id: None,
            children_ids: SmallVec::new(),
        });
        self.root_ids.push(node_id);
        node_id
    }

    /**
     * Inserts a value as the last child of another.
     */
    pub fn insert_child(&mut self, value: T, parent_id: NodeId) -> Result<NodeId, SceneGraphError> {
        if !self.nodes.contains_key(parent_id) {
            return Err(SceneGraphError::NoSuchNode);
        }
        let node_id = self.nodes.insert(Node {
            value,
            parent_id: Some(parent_id),
            children_ids: SmallVec::new(),
        });
        if let Some(parent) = self.nodes.get_mut(parent_id) {
            parent.children_ids.push(node_id);
        }
        Ok(node_id)
    }

    pub fn get(&self, node_id: NodeId) -> Option<&T> {
        self.nodes
            .get(node_id)
            .map(|node| &node.value)
    }

    pub fn get_mut(&mut self, node_id: NodeId) -> Option<&mut T> {
        self.nodes
            .get_mut(node_id)
            .map(|node| &mut node.value)
    }

    /**
     * Gets a value by id, wrapped in its node.
     */
    pub fn get_node(&self, node_id: NodeId) -> Option<&Node<T>> {
        self.nodes.get(node_id)
    }

    pub fn contains(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(node_id)
    }

    /// True if `ancestor_id` is `node_id` or any of its ancestors.
    pub fn is_ancestor(&self, ancestor_id: NodeId, node_id: NodeId) -> bool {
        let mut current = Some(node_id);
        while let Some(id) = current {
            if id == ancestor_id {
                return true;
            }
            current = self.nodes.get(id).and_then(|node| node.parent_id);
        }
        false
    }

    /**
     * Moves a node, along with its descendants, to the end of another node's children.
     * Fails if the new parent is the node itself or one of its descendants.
     */
    pub fn attach(&mut self, node_id: NodeId, parent_id: NodeId) -> Result<(), SceneGraphError> {
        if !self.nodes.contains_key(node_id) || !self.nodes.contains_key(parent_id) {
            return Err(SceneGraphError::NoSuchNode);
        }
        if self.is_ancestor(node_id, parent_id) {
            return Err(SceneGraphError::CycleDetected);
        }
        self.unlink(node_id);
        if let Some(node) = self.nodes.get_mut(node_id) {
            node.parent_id = Some(parent_id);
        }
        if let Some(parent) = self.nodes.get_mut(parent_id) {
            parent.children_ids.push(node_id);
        }
        Ok(())
    }

    /**
     * Detaches a node from its parent, turning it into a root.
     */
    pub fn detach(&mut self, node_id: NodeId) -> Result<(), SceneGraphError> {
        if !self.nodes.contains_key(node_id) {
            return Err(SceneGraphError::NoSuchNode);
        }
        self.unlink(node_id);
        self.root_ids.push(node_id);
        Ok(())
    }

    /**
     * Removes a value and all of its descendants.
     */
    pub fn remove(&mut self, node_id: NodeId) {
        if !self.nodes.contains_key(node_id) {
            return;
        }
        self.unlink(node_id);
        remove(node_id, &mut self.nodes);
    }

    /**
     * The number of [`Node`]s stored.
     */
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Recursive fold-like operation starting at a node, visiting children in order.
    /// Value accumulates from parent to child.
    /// Useful for implementing transform propagation.
    pub fn propagate<'a, A, F>(&'a self, node_id: NodeId, accum: A, mut function: F)
    where
        A: Clone,
        F: FnMut(A, NodeId, &'a T) -> A
    {
        propagate_at(&self.nodes, node_id, accum, &mut function);
    }

    // Removes a node from its parent's child list, or from the root list.
    fn unlink(&mut self, node_id: NodeId) {
        let parent_id = self.nodes.get_mut(node_id).and_then(|node| node.parent_id.take());
        match parent_id {
            Some(parent_id) => {
                if let Some(parent) = self.nodes.get_mut(parent_id) {
                    parent.children_ids.retain(|id| *id != node_id);
                }
            },
            None => self.root_ids.retain(|id| *id != node_id),
        }
    }
}

fn propagate_at<'a, T, A, F>(
    nodes: &'a SlotMap<NodeId, Node<T>>,
    node_id: NodeId,
    accum: A,
    function: &mut F
)
where
    A: Clone,
    F: FnMut(A, NodeId, &'a T) -> A
{
    let Some(node) = nodes.get(node_id) else { return };
    let current = function(accum, node_id, &node.value);
    for child_id in &node.children_ids {
        propagate_at(nodes, *child_id, current.clone(), function);
    }
}

fn remove<T>(node_id: NodeId, nodes: &mut SlotMap<NodeId, Node<T>>) {
    let Some(node) = nodes.remove(node_id) else { return };
    for child_id in &node.children_ids {
        remove(*child_id, nodes);
    }
}

/// Container of a scene graph value, and a reference to its parent and children.
pub struct Node<T> {
    value: T,
    parent_id: Option<NodeId>,
    children_ids: SmallVec<[NodeId; 8]>,
}

impl<T> Node<T> {
    pub fn value(&self) -> &T {
        &self.value
    }
    pub fn parent_id(&self) -> Option<NodeId> {
        self.parent_id
    }
    pub fn children_ids(&self) -> &[NodeId] {
        &self.children_ids
    }
}

new_key_type! {
    /**
     * ID for a [`Node`].
     */
    pub struct NodeId;
}

#[derive(Error, Display, Debug, Copy, Clone, Eq, PartialEq)]
pub enum SceneGraphError {
    #[display(fmt="No such node")]
    NoSuchNode,
    #[display(fmt="Node cannot become a descendant of itself")]
    CycleDetected,
    #[display(fmt="The scene root cannot be re-parented")]
    RootNotMovable,
    #[display(fmt="Node has the wrong kind for this operation")]
    WrongKind,
}


#[cfg(test)]
mod test {
    use super::{SceneGraph, SceneGraphError};

    #[test]
    fn insert_children_in_order() {
        let mut graph = SceneGraph::new();
        let root = graph.insert("root");
        let a = graph.insert_child("a", root).unwrap();
        let b = graph.insert_child("b", root).unwrap();
        let root_node = graph.get_node(root).unwrap();
        assert_eq!(&[a, b], root_node.children_ids());
        assert_eq!(Some(root), graph.get_node(a).unwrap().parent_id());
    }

    #[test]
    fn insert_child_of_missing_parent() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(0);
        graph.remove(root);
        assert_eq!(Err(SceneGraphError::NoSuchNode), graph.insert_child(1, root));
        assert_eq!(0, graph.len());
    }

    #[test]
    fn attach_moves_between_parents() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(0);
        let a = graph.insert_child(1, root).unwrap();
        let b = graph.insert_child(2, root).unwrap();
        graph.attach(b, a).unwrap();
        assert_eq!(&[a], graph.get_node(root).unwrap().children_ids());
        assert_eq!(&[b], graph.get_node(a).unwrap().children_ids());
        assert_eq!(Some(a), graph.get_node(b).unwrap().parent_id());
    }

    #[test]
    fn attach_rejects_cycles() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(0);
        let a = graph.insert_child(1, root).unwrap();
        let b = graph.insert_child(2, a).unwrap();
        assert_eq!(Err(SceneGraphError::CycleDetected), graph.attach(a, b));
        assert_eq!(Err(SceneGraphError::CycleDetected), graph.attach(a, a));
    }

    #[test]
    fn detach_makes_root() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(0);
        let a = graph.insert_child(1, root).unwrap();
        graph.detach(a).unwrap();
        assert_eq!(&[root, a], graph.root_ids());
        assert!(graph.get_node(root).unwrap().children_ids().is_empty());
    }

    #[test]
    fn remove_is_recursive() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(0);
        let a = graph.insert_child(1, root).unwrap();
        graph.insert_child(2, a).unwrap();
        graph.remove(a);
        assert_eq!(1, graph.len());
        assert!(graph.get_node(root).unwrap().children_ids().is_empty());
    }

    #[test]
    fn propagate_accumulates() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(1);
        let a = graph.insert_child(2, root).unwrap();
        graph.insert_child(3, a).unwrap();
        graph.insert_child(4, root).unwrap();
        let mut sums = Vec::new();
        graph.propagate(root, 0, |sum, _, value| {
            let sum = sum + value;
            sums.push(sum);
            sum
        });
        assert_eq!(vec![1, 3, 6, 5], sums);
    }
}
