//! Arena-backed window tree with three root partitions.
//!
//! Every window lives in a single [`SlotMap`] and is addressed by a stable
//! [`NodeId`]. The roots own their main windows through ordered child lists
//! and a main window owns its sub-windows the same way. Parent links are
//! plain back-references used for lookup; nodes leave the arena only through
//! [`WindowTree::remove`].

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use super::window_node::{WindowId, WindowNode};
use crate::common::collections::{BTreeMap, HashMap};
use crate::sys::display::DisplayId;

slotmap::new_key_type! { pub struct NodeId; }

/// Main windows of one display, indexed by [`RootType::index`].
pub type RootBuckets = [Vec<NodeId>; 3];

/// Per-display index of the main windows. Derived from [`WindowTree`] and
/// rebuilt after structural changes; it never owns nodes.
pub type DisplayGroupWindowTree = BTreeMap<DisplayId, RootBuckets>;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RootType {
    Below = 0,
    App = 1,
    Above = 2,
}

impl RootType {
    /// Bottom-most partition first.
    pub const ALL: [RootType; 3] = [RootType::Below, RootType::App, RootType::Above];

    pub fn index(self) -> usize { self as usize }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parent {
    Root(RootType),
    Window(NodeId),
}

#[derive(Debug, Default)]
pub struct WindowTree {
    nodes: SlotMap<NodeId, WindowNode>,
    index: HashMap<WindowId, NodeId>,
    roots: [Vec<NodeId>; 3],
}

impl WindowTree {
    pub fn new() -> Self { Self::default() }

    /// Adds a detached node to the arena. A node already registered under
    /// the same window id is replaced in the id index but keeps its slot.
    pub fn insert(&mut self, node: WindowNode) -> NodeId {
        let window_id = node.id;
        let id = self.nodes.insert(node);
        self.index.insert(window_id, id);
        id
    }

    /// Frees a node. The node must already be detached; children are left
    /// for the caller to free.
    pub fn remove(&mut self, id: NodeId) -> Option<WindowNode> {
        let node = self.nodes.remove(id)?;
        if self.index.get(&node.id) == Some(&id) {
            self.index.remove(&node.id);
        }
        Some(node)
    }

    pub fn get(&self, id: NodeId) -> Option<&WindowNode> { self.nodes.get(id) }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut WindowNode> { self.nodes.get_mut(id) }

    pub fn contains(&self, id: NodeId) -> bool { self.nodes.contains_key(id) }

    pub fn find(&self, window_id: WindowId) -> Option<NodeId> { self.index.get(&window_id).copied() }

    pub fn len(&self) -> usize { self.nodes.len() }

    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &WindowNode)> { self.nodes.iter() }

    pub fn root(&self, root: RootType) -> &[NodeId] { &self.roots[root.index()] }

    pub fn children_of(&self, parent: Parent) -> &[NodeId] {
        match parent {
            Parent::Root(root) => &self.roots[root.index()],
            Parent::Window(id) => self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[]),
        }
    }

    fn children_of_mut(&mut self, parent: Parent) -> Option<&mut Vec<NodeId>> {
        match parent {
            Parent::Root(root) => Some(&mut self.roots[root.index()]),
            Parent::Window(id) => self.nodes.get_mut(id).map(|n| &mut n.children),
        }
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.parent.is_some())
    }

    pub fn parent_node(&self, id: NodeId) -> Option<NodeId> {
        match self.nodes.get(id)?.parent? {
            Parent::Window(parent) => Some(parent),
            Parent::Root(_) => None,
        }
    }

    /// The partition a node is attached under, following parent links.
    pub fn root_of(&self, id: NodeId) -> Option<RootType> {
        let mut cur = id;
        loop {
            match self.nodes.get(cur)?.parent? {
                Parent::Root(root) => return Some(root),
                Parent::Window(parent) => cur = parent,
            }
        }
    }

    /// Inserts `id` into `parent`'s children at `position` (clamped).
    pub fn attach(&mut self, id: NodeId, parent: Parent, position: usize) {
        if !self.nodes.contains_key(id) {
            return;
        }
        let Some(children) = self.children_of_mut(parent) else {
            return;
        };
        let position = position.min(children.len());
        children.insert(position, id);
        self.nodes[id].parent = Some(parent);
    }

    /// Removes `id` from its parent's child list and returns where it was.
    pub fn detach(&mut self, id: NodeId) -> Option<(Parent, usize)> {
        let parent = self.nodes.get_mut(id)?.parent.take()?;
        let children = self.children_of_mut(parent)?;
        let position = children.iter().position(|c| *c == id)?;
        children.remove(position);
        Some((parent, position))
    }

    /// `id` followed by every descendant, parents before children.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            let Some(node) = self.nodes.get(cur) else { continue };
            out.push(cur);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Every attached node under the three roots, bottom partition first.
    pub fn attached(&self) -> Vec<NodeId> {
        RootType::ALL
            .iter()
            .flat_map(|root| self.roots[root.index()].iter())
            .flat_map(|id| self.subtree(*id))
            .collect()
    }

    pub fn window_id(&self, id: NodeId) -> Option<WindowId> { self.nodes.get(id).map(|n| n.id) }

    pub fn draw_tree(&self) -> String {
        let roots = RootType::ALL
            .iter()
            .rev()
            .map(|root| {
                let children: Vec<_> =
                    self.roots[root.index()].iter().rev().map(|id| self.ascii_tree(*id)).collect();
                let desc = format!("{root:?}");
                if children.is_empty() {
                    ascii_tree::Tree::Leaf(vec![desc])
                } else {
                    ascii_tree::Tree::Node(desc, children)
                }
            })
            .collect();
        let tree = ascii_tree::Tree::Node("windows".to_string(), roots);
        let mut out = String::new();
        let _ = ascii_tree::write_tree(&mut out, &tree);
        out
    }

    fn ascii_tree(&self, id: NodeId) -> ascii_tree::Tree {
        let Some(node) = self.nodes.get(id) else {
            return ascii_tree::Tree::Leaf(vec![format!("{id:?} <freed>")]);
        };
        let r = node.window_rect;
        let desc = format!(
            "{} {} z={} {:?} {:?} [{} {} {} {}] {}",
            node.id,
            node.window_type,
            node.z_order,
            node.mode,
            node.showing_displays,
            r.x,
            r.y,
            r.width,
            r.height,
            if node.current_visibility { "visible" } else { "hidden" },
        );
        let children: Vec<_> = node.children.iter().rev().map(|c| self.ascii_tree(*c)).collect();
        if children.is_empty() {
            ascii_tree::Tree::Leaf(vec![desc])
        } else {
            ascii_tree::Tree::Node(desc, children)
        }
    }
}

impl Index<NodeId> for WindowTree {
    type Output = WindowNode;

    fn index(&self, index: NodeId) -> &Self::Output { &self.nodes[index] }
}

impl IndexMut<NodeId> for WindowTree {
    fn index_mut(&mut self, index: NodeId) -> &mut Self::Output { &mut self.nodes[index] }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::window_node::WindowType;

    fn node(id: u32, ty: WindowType) -> WindowNode { WindowNode::new(WindowId(id), ty) }

    #[test]
    fn attach_and_detach_keep_order() {
        let mut tree = WindowTree::new();
        let a = tree.insert(node(1, WindowType::AppMain));
        let b = tree.insert(node(2, WindowType::AppMain));
        let c = tree.insert(node(3, WindowType::AppMain));
        tree.attach(a, Parent::Root(RootType::App), 0);
        tree.attach(b, Parent::Root(RootType::App), 1);
        tree.attach(c, Parent::Root(RootType::App), 1);
        assert_eq!(tree.root(RootType::App), &[a, c, b]);

        assert_eq!(tree.detach(c), Some((Parent::Root(RootType::App), 1)));
        assert_eq!(tree.root(RootType::App), &[a, b]);
        assert!(!tree.is_attached(c));
        assert_eq!(tree.detach(c), None);
    }

    #[test]
    fn root_of_follows_parents() {
        let mut tree = WindowTree::new();
        let main = tree.insert(node(1, WindowType::AppMain));
        let sub = tree.insert(node(2, WindowType::AppSub));
        tree.attach(main, Parent::Root(RootType::App), 0);
        tree.attach(sub, Parent::Window(main), 0);
        assert_eq!(tree.root_of(sub), Some(RootType::App));
        assert_eq!(tree.parent_node(sub), Some(main));
        assert_eq!(tree.parent_node(main), None);
    }

    #[test]
    fn subtree_is_preorder() {
        let mut tree = WindowTree::new();
        let main = tree.insert(node(1, WindowType::AppMain));
        let media = tree.insert(node(2, WindowType::Media));
        let sub = tree.insert(node(3, WindowType::AppSub));
        tree.attach(main, Parent::Root(RootType::App), 0);
        tree.attach(media, Parent::Window(main), 0);
        tree.attach(sub, Parent::Window(main), 1);
        assert_eq!(tree.subtree(main), vec![main, media, sub]);
        assert_eq!(tree.attached(), vec![main, media, sub]);
    }

    #[test]
    fn remove_frees_index() {
        let mut tree = WindowTree::new();
        let a = tree.insert(node(7, WindowType::Toast));
        assert_eq!(tree.find(WindowId(7)), Some(a));
        assert!(tree.remove(a).is_some());
        assert_eq!(tree.find(WindowId(7)), None);
        assert!(!tree.contains(a));
    }

    #[test]
    fn draw_tree_lists_windows() {
        let mut tree = WindowTree::new();
        let a = tree.insert(node(1, WindowType::AppMain));
        tree.attach(a, Parent::Root(RootType::App), 0);
        let out = tree.draw_tree();
        assert!(out.contains("App"));
        assert!(out.contains("#1 AppMain"));
    }
}
