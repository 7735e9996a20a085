use std::collections::BTreeSet;

use foundation::arena::{Arena, ArenaIndex};
use tracing::trace;

use crate::tile_id::TileId;
use crate::validity::Validity;

pub type NodeIndex = ArenaIndex;

/// One node of the terrain quadtree as seen by consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct TileNode {
    pub id: TileId,
    pub validity: Validity,
    /// Approximate elevation of the tile centre; NaN until known.
    pub surrogate: f64,
    pub children: Vec<NodeIndex>,
}

impl TileNode {
    pub fn new(id: TileId) -> Self {
        Self {
            id,
            validity: Validity::Indeterminate,
            surrogate: f64::NAN,
            children: Vec::new(),
        }
    }
}

/// Read-only view of a terrain quadtree plus a "load if needed" trigger.
///
/// Consumers never mutate nodes. `request_load` only asks the owner to start
/// fetching an `Indeterminate` node; it must be idempotent and cheap because
/// it is called every frame until the node resolves.
pub trait TerrainTree {
    fn root(&self) -> Option<NodeIndex>;
    fn node(&self, index: NodeIndex) -> Option<&TileNode>;
    fn request_load(&mut self, index: NodeIndex);
}

/// Arena-owned quadtree. Nodes are never removed, so indices stay stable.
///
/// The owner (a tile loader) populates it; load requests from consumers are
/// collected and handed out with [`TileTree::take_load_requests`].
#[derive(Debug, Default)]
pub struct TileTree {
    nodes: Arena<TileNode>,
    root: Option<NodeIndex>,
    load_requests: BTreeSet<NodeIndex>,
}

impl TileTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Create the root node. Replaces any previous root reference.
    pub fn set_root(&mut self, id: TileId) -> NodeIndex {
        let idx = self.nodes.alloc(TileNode::new(id));
        self.root = Some(idx);
        idx
    }

    /// Attach a child node. Returns `None` if `parent` does not exist or `id`
    /// is not a direct child of the parent's tile.
    pub fn add_child(&mut self, parent: NodeIndex, id: TileId) -> Option<NodeIndex> {
        let parent_id = self.nodes.get(parent)?.id;
        if id.parent() != Some(parent_id) {
            return None;
        }
        let idx = self.nodes.alloc(TileNode::new(id));
        self.nodes.get_mut(parent)?.children.push(idx);
        Some(idx)
    }

    /// Mark a node as loaded with the given surrogate elevation.
    pub fn mark_valid(&mut self, index: NodeIndex, surrogate: f64) -> bool {
        let Some(node) = self.nodes.get_mut(index) else {
            return false;
        };
        node.validity = Validity::Valid;
        node.surrogate = surrogate;
        self.load_requests.remove(&index);
        true
    }

    pub fn mark_invalid(&mut self, index: NodeIndex) -> bool {
        let Some(node) = self.nodes.get_mut(index) else {
            return false;
        };
        node.validity = Validity::Invalid;
        self.load_requests.remove(&index);
        true
    }

    /// Replace the surrogate of an already loaded node (better data arrived).
    pub fn set_surrogate(&mut self, index: NodeIndex, surrogate: f64) -> bool {
        match self.nodes.get_mut(index) {
            Some(node) => {
                node.surrogate = surrogate;
                true
            }
            None => false,
        }
    }

    pub fn find(&self, id: TileId) -> Option<NodeIndex> {
        self.nodes
            .iter()
            .find(|(_, node)| node.id == id)
            .map(|(idx, _)| idx)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &TileNode)> {
        self.nodes.iter()
    }

    pub fn pending_load_requests(&self) -> usize {
        self.load_requests.len()
    }

    /// Drain outstanding load requests in stable index order.
    pub fn take_load_requests(&mut self) -> Vec<NodeIndex> {
        std::mem::take(&mut self.load_requests).into_iter().collect()
    }
}

impl TerrainTree for TileTree {
    fn root(&self) -> Option<NodeIndex> {
        self.root
    }

    fn node(&self, index: NodeIndex) -> Option<&TileNode> {
        self.nodes.get(index)
    }

    fn request_load(&mut self, index: NodeIndex) {
        let Some(node) = self.nodes.get(index) else {
            return;
        };
        if node.validity != Validity::Indeterminate {
            return;
        }
        if self.load_requests.insert(index) {
            trace!(tile = %node.id, "terrain load requested");
        }
    }
}
