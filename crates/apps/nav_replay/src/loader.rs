//! Simulated tile loader: answers load requests after a fixed delay with
//! procedural surrogate heights, growing the tree one level per load.

use std::collections::BTreeMap;

use navigation::DomainError;
use serde::{Deserialize, Serialize};
use terrain::{MAX_LOD, NodeIndex, ReferenceFrame, TerrainTree, TileId, TileTree};
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Frames between a load request and the tile becoming available.
    pub latency_frames: u64,
    /// Tiles at this level are loaded without children.
    pub max_lod: u8,
    pub base_height: f64,
    pub amplitude: f64,
    /// Horizontal wavelength of the synthetic relief, in metres.
    pub wavelength: f64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            latency_frames: 3,
            max_lod: 12,
            base_height: 200.0,
            amplitude: 150.0,
            wavelength: 50_000.0,
        }
    }
}

pub struct SyntheticLoader {
    config: LoaderConfig,
    frame: ReferenceFrame,
    pub tree: TileTree,
    /// Requested node -> frame at which it finishes loading.
    in_flight: BTreeMap<NodeIndex, u64>,
    loaded: u64,
}

impl SyntheticLoader {
    pub fn new(config: LoaderConfig, frame: ReferenceFrame) -> Result<Self, String> {
        let root = frame
            .bisection_roots()
            .next()
            .map(|r| r.id)
            .ok_or_else(|| "reference frame has no searchable root".to_string())?;
        let mut tree = TileTree::new();
        tree.set_root(root);
        Ok(Self {
            config,
            frame,
            tree,
            in_flight: BTreeMap::new(),
            loaded: 0,
        })
    }

    pub fn loaded(&self) -> u64 {
        self.loaded
    }

    /// Accept new requests and finish the ones whose delay has passed.
    pub fn tick(&mut self, frame_no: u64) {
        for index in self.tree.take_load_requests() {
            self.in_flight
                .entry(index)
                .or_insert(frame_no + self.config.latency_frames);
        }
        let ready: Vec<NodeIndex> = self
            .in_flight
            .iter()
            .filter(|&(_, &at)| at <= frame_no)
            .map(|(&index, _)| index)
            .collect();
        for index in ready {
            self.in_flight.remove(&index);
            self.finish(index);
        }
    }

    fn finish(&mut self, index: NodeIndex) {
        let Some(id) = self.tree.node(index).map(|n| n.id) else {
            return;
        };
        match self.surrogate(id) {
            Ok(height) => {
                self.tree.mark_valid(index, height);
                if id.lod < self.config.max_lod.min(MAX_LOD) {
                    for child in id.children() {
                        self.tree.add_child(index, child);
                    }
                }
                self.loaded += 1;
                trace!(tile = %id, height, "tile loaded");
            }
            Err(err) => {
                debug!(tile = %id, %err, "tile unavailable");
                self.tree.mark_invalid(index);
            }
        }
    }

    /// Height of the relief at the tile centre.
    fn surrogate(&self, id: TileId) -> Result<f64, DomainError> {
        let info = self.frame.node_info(id).ok_or(DomainError::OutsideReferenceFrame)?;
        let c = info.extents.center() * info.srs.metres_per_unit();
        let k = std::f64::consts::TAU / self.config.wavelength;
        Ok(self.config.base_height + self.config.amplitude * (c.x * k).sin() * (c.y * k).cos())
    }
}
