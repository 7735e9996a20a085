//! Incremental terrain height lookup.
//!
//! A [`HeightRequest`] finds the ground elevation under a navigation point by
//! locating the sampling tile, then resolving the surrogate elevations of the
//! four tiles around it. Tiles may still be loading; every call does as much
//! as the tree allows and reports `Indeterminate` when it has to wait.

use std::collections::VecDeque;

use foundation::math::{Vec2, interpolate};
use terrain::{MAX_LOD, NodeIndex, NodeInfo, ReferenceFrame, TerrainTree, TileId, Validity, valid_surrogate};
use tracing::debug;

use crate::convertor::CoordConvertor;
use crate::error::DomainError;

/// Requests kept in flight at most: the one being resolved plus the latest.
pub const HEIGHT_QUEUE_CAPACITY: usize = 2;

/// Sampling descends until a tile holds fewer than `2^3` samples.
const SAMPLING_DEPTH_BIAS: f64 = 3.0;

/// Everything a request needs besides the tree.
pub struct HeightContext<'a> {
    pub frame: &'a ReferenceFrame,
    pub convertor: &'a dyn CoordConvertor,
    pub samples_per_view_extent: f64,
    pub view_extent: f64,
}

/// Progress of one corner lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CornerState {
    /// Not attached to the tree yet; starts at the root.
    Unbound,
    /// Waiting on this node to load, or about to inspect it.
    Awaiting(NodeIndex),
    Resolved(f64),
    Invalid,
}

impl CornerState {
    pub fn validity(self) -> Validity {
        match self {
            CornerState::Resolved(_) => Validity::Valid,
            CornerState::Invalid => Validity::Invalid,
            CornerState::Unbound | CornerState::Awaiting(_) => Validity::Indeterminate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerStep {
    pub state: CornerState,
    /// Node the tree should start loading.
    pub load: Option<NodeIndex>,
}

/// Advance a corner lookup as far as the tree currently allows.
///
/// Descends through loaded nodes toward `target`; stops at the target itself
/// or at a loaded leaf, whose surrogate elevation becomes the result.
pub fn corner_step<T: TerrainTree + ?Sized>(target: TileId, state: CornerState, tree: &T) -> CornerStep {
    let mut state = state;
    loop {
        let index = match state {
            CornerState::Resolved(v) if valid_surrogate(v) => return finished(state),
            CornerState::Resolved(_) | CornerState::Invalid => return finished(CornerState::Invalid),
            CornerState::Unbound => match tree.root() {
                Some(root) => root,
                None => return finished(CornerState::Unbound),
            },
            CornerState::Awaiting(index) => index,
        };
        let Some(node) = tree.node(index) else {
            return finished(CornerState::Invalid);
        };
        match node.validity {
            Validity::Invalid => return finished(CornerState::Invalid),
            Validity::Indeterminate => {
                return CornerStep {
                    state: CornerState::Awaiting(index),
                    load: Some(index),
                };
            }
            Validity::Valid => {}
        }
        if node.id == target || node.children.is_empty() {
            state = CornerState::Resolved(node.surrogate);
            continue;
        }
        let next = node
            .id
            .lod
            .checked_add(1)
            .and_then(|lod| target.ancestor_at(lod));
        let child = next.and_then(|id| {
            node.children
                .iter()
                .copied()
                .find(|&c| tree.node(c).is_some_and(|n| n.id == id))
        });
        state = match child {
            Some(c) => CornerState::Awaiting(c),
            None => CornerState::Invalid,
        };
    }
}

fn finished(state: CornerState) -> CornerStep {
    CornerStep { state, load: None }
}

/// One of the four elevation samples around the query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerQuery {
    pub target: TileId,
    pub state: CornerState,
}

impl CornerQuery {
    pub fn new(target: TileId) -> Self {
        Self {
            target,
            state: CornerState::Unbound,
        }
    }

    pub fn process<T: TerrainTree + ?Sized>(&mut self, tree: &mut T) -> Validity {
        let step = corner_step(self.target, self.state, &*tree);
        self.state = step.state;
        if let Some(index) = step.load {
            tree.request_load(index);
        }
        self.state.validity()
    }

    pub fn result(&self) -> Option<f64> {
        match self.state {
            CornerState::Resolved(v) => Some(v),
            _ => None,
        }
    }
}

/// Bilinear blend of corner samples ordered north-west, north-east,
/// south-west, south-east. `interpol.y` goes from the southern pair (0) to
/// the northern pair (1).
pub fn bilinear(corners: [f64; 4], interpol: Vec2) -> f64 {
    interpolate(
        interpolate(corners[2], corners[3], interpol.x),
        interpolate(corners[0], corners[1], interpol.x),
        interpol.y,
    )
}

#[derive(Debug, Clone, PartialEq)]
struct Located {
    node: NodeInfo,
    /// Query point in the sampling tile's SRS.
    sds: Vec2,
    interpol: Vec2,
    corners: [CornerQuery; 4],
}

#[derive(Debug, Clone, PartialEq)]
enum Stage {
    Unlocated,
    Located(Located),
    Resolved(f64),
    Invalid,
}

/// Elevation lookup at a navigation point, resumable across frames.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightRequest {
    nav_pos: Vec2,
    reset_offset: Option<f64>,
    sampling_lod: Option<u8>,
    stage: Stage,
}

impl HeightRequest {
    pub fn new(nav_pos: Vec2) -> Self {
        Self {
            nav_pos,
            reset_offset: None,
            sampling_lod: None,
            stage: Stage::Unlocated,
        }
    }

    /// A request whose result replaces the camera height (`height + offset`)
    /// instead of shifting it.
    pub fn with_reset_offset(nav_pos: Vec2, offset: f64) -> Self {
        Self {
            reset_offset: Some(offset),
            ..Self::new(nav_pos)
        }
    }

    pub fn nav_pos(&self) -> Vec2 {
        self.nav_pos
    }

    pub fn reset_offset(&self) -> Option<f64> {
        self.reset_offset
    }

    /// Elevation in the navigation SRS once resolved.
    pub fn result(&self) -> Option<f64> {
        match self.stage {
            Stage::Resolved(h) => Some(h),
            _ => None,
        }
    }

    /// Level of the sampling tile, once located.
    pub fn sampling_lod(&self) -> Option<u8> {
        self.sampling_lod
    }

    /// Do one step of work. `Valid` and `Invalid` are final.
    pub fn process<T: TerrainTree + ?Sized>(&mut self, ctx: &HeightContext<'_>, tree: &mut T) -> Validity {
        match self.stage {
            Stage::Resolved(_) => return Validity::Valid,
            Stage::Invalid => return Validity::Invalid,
            Stage::Unlocated => match locate(ctx, self.nav_pos) {
                Ok(located) => {
                    self.sampling_lod = Some(located.node.id.lod);
                    self.stage = Stage::Located(located);
                }
                Err(err) => return self.abandon(&err),
            },
            Stage::Located(_) => {}
        }
        let Stage::Located(located) = &mut self.stage else {
            return Validity::Invalid;
        };

        let mut determined = true;
        let mut failed = None;
        for corner in &mut located.corners {
            match corner.process(tree) {
                Validity::Invalid => {
                    failed = Some(corner.target);
                    break;
                }
                Validity::Indeterminate => determined = false,
                Validity::Valid => {}
            }
        }
        if let Some(tile) = failed {
            debug!(%tile, "height request abandoned: corner unavailable");
            self.stage = Stage::Invalid;
            return Validity::Invalid;
        }
        if !determined {
            return Validity::Indeterminate;
        }

        let samples = located.corners.map(|c| c.result().unwrap_or(f64::NAN));
        let height = bilinear(samples, located.interpol);
        let converted = ctx
            .convertor
            .convert(located.sds.extend(height), located.node.srs, ctx.frame.navigation_srs);
        match converted {
            Ok(p) => {
                self.stage = Stage::Resolved(p.z);
                Validity::Valid
            }
            Err(err) => self.abandon(&DomainError::from(err)),
        }
    }

    fn abandon(&mut self, err: &DomainError) -> Validity {
        debug!(%err, x = self.nav_pos.x, y = self.nav_pos.y, "height request abandoned");
        self.stage = Stage::Invalid;
        Validity::Invalid
    }
}

fn locate(ctx: &HeightContext<'_>, nav_pos: Vec2) -> Result<Located, DomainError> {
    let (root, sds) = locate_root(ctx, nav_pos)?;
    let node = sampled_node(ctx, root, sds)?;
    let (corner, interpol) = corner_layout(&node, sds)?;
    let mut corners = [CornerQuery::new(corner); 4];
    for (i, query) in corners.iter_mut().enumerate() {
        let (dx, dy) = ((i % 2) as i64, (i / 2) as i64);
        let id = corner
            .offset(dx, dy)
            .ok_or(DomainError::CornerOutOfRange(node.id))?;
        *query = CornerQuery::new(id);
    }
    Ok(Located {
        node,
        sds,
        interpol,
        corners,
    })
}

/// First searchable division root containing the point, and the point in
/// that root's SRS.
fn locate_root(ctx: &HeightContext<'_>, nav_pos: Vec2) -> Result<(NodeInfo, Vec2), DomainError> {
    for root in ctx.frame.bisection_roots() {
        let Ok(sds) = ctx
            .convertor
            .convert(nav_pos.extend(0.0), ctx.frame.navigation_srs, root.srs)
        else {
            continue;
        };
        let info = NodeInfo::from_root(root);
        if info.inside(sds.xy()) {
            return Ok((info, sds.xy()));
        }
    }
    Err(DomainError::OutsideReferenceFrame)
}

/// Descend to the tile whose size matches the requested sampling density.
fn sampled_node(ctx: &HeightContext<'_>, root: NodeInfo, sds: Vec2) -> Result<NodeInfo, DomainError> {
    let mut info = root;
    loop {
        let desire = (ctx.samples_per_view_extent * info.extent_size() / ctx.view_extent).log2();
        if !(desire >= SAMPLING_DEPTH_BIAS) || info.id.lod >= MAX_LOD {
            return Ok(info);
        }
        info = info
            .children()
            .into_iter()
            .find(|child| child.inside(sds))
            .ok_or(DomainError::NoContainingChild(info.id))?;
    }
}

/// North-west tile of the 2x2 block whose centres surround `sds`, and the
/// position of `sds` inside that block of centres.
fn corner_layout(node: &NodeInfo, sds: Vec2) -> Result<(TileId, Vec2), DomainError> {
    let center = node.extents.center();
    let size = node.extents.size();
    let mut interpol = Vec2::new((sds.x - center.x) / size.x, (sds.y - center.y) / size.y);
    let mut dx = 0;
    let mut dy = 0;
    if sds.x < center.x {
        dx = -1;
        interpol.x += 1.0;
    }
    if sds.y < center.y {
        interpol.y += 1.0;
    } else {
        dy = -1;
    }
    let corner = node
        .id
        .offset(dx, dy)
        .ok_or(DomainError::CornerOutOfRange(node.id))?;
    Ok((corner, interpol))
}

/// FIFO of pending height requests, bounded by [`HEIGHT_QUEUE_CAPACITY`].
#[derive(Debug, Clone, Default)]
pub struct HeightQueue {
    requests: VecDeque<HeightRequest>,
}

impl HeightQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append, or replace the newest entry when full. The front request keeps
    /// its progress either way.
    pub fn push(&mut self, request: HeightRequest) {
        if self.requests.len() < HEIGHT_QUEUE_CAPACITY {
            self.requests.push_back(request);
        } else if let Some(back) = self.requests.back_mut() {
            *back = request;
        }
    }

    pub fn front(&self) -> Option<&HeightRequest> {
        self.requests.front()
    }

    pub fn front_mut(&mut self) -> Option<&mut HeightRequest> {
        self.requests.front_mut()
    }

    pub fn pop_front(&mut self) -> Option<HeightRequest> {
        self.requests.pop_front()
    }

    pub fn clear(&mut self) {
        self.requests.clear();
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeightRequest> {
        self.requests.iter()
    }
}
