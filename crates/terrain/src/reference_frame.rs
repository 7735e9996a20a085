//! Reference frame description: which SRS the camera navigates in, which SRS
//! is physical, whether the navigation plane wraps, and how the terrain
//! quadtree is rooted.

use foundation::bounds::Aabb2;
use foundation::math::{Srs, SrsKind, Vec2, WGS84_A};
use serde::{Deserialize, Serialize};

use crate::tile_id::TileId;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partitioning {
    /// Subtree is a regular quadtree and can be addressed by bisection.
    #[default]
    Bisection,
    /// Children are listed explicitly; not searchable by position.
    Manual,
}

/// A root of the reference frame division.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivisionNode {
    pub id: TileId,
    pub srs: Srs,
    pub extents: Aabb2,
    #[serde(default)]
    pub partitioning: Partitioning,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodicAxis {
    X,
    Y,
}

impl PeriodicAxis {
    pub fn index(self) -> usize {
        match self {
            PeriodicAxis::X => 0,
            PeriodicAxis::Y => 1,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Periodicity {
    pub axis: PeriodicAxis,
    pub period: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceFrame {
    pub navigation_srs: Srs,
    pub physical_srs: Srs,
    /// Wrap of the projected navigation plane. Geographic frames always wrap
    /// longitude and ignore this field.
    #[serde(default)]
    pub periodicity: Option<Periodicity>,
    pub division: Vec<DivisionNode>,
}

impl ReferenceFrame {
    /// WGS84 longitude/latitude navigation over a single geographic root.
    pub fn geographic() -> Self {
        Self {
            navigation_srs: Srs::Geographic,
            physical_srs: Srs::Geocentric,
            periodicity: None,
            division: vec![DivisionNode {
                id: TileId::root(),
                srs: Srs::Geographic,
                extents: Aabb2::new([-180.0, -90.0], [180.0, 90.0]),
                partitioning: Partitioning::Bisection,
            }],
        }
    }

    /// Projected navigation over the square Web Mercator world, wrapping in x.
    pub fn web_mercator() -> Self {
        let half = std::f64::consts::PI * WGS84_A;
        Self {
            navigation_srs: Srs::WebMercator,
            physical_srs: Srs::Geocentric,
            periodicity: Some(Periodicity {
                axis: PeriodicAxis::X,
                period: 2.0 * half,
            }),
            division: vec![DivisionNode {
                id: TileId::root(),
                srs: Srs::WebMercator,
                extents: Aabb2::new([-half, -half], [half, half]),
                partitioning: Partitioning::Bisection,
            }],
        }
    }

    pub fn navigation_kind(&self) -> SrsKind {
        self.navigation_srs.kind()
    }

    /// Division roots that can be searched by position, in declaration order.
    pub fn bisection_roots(&self) -> impl Iterator<Item = &DivisionNode> {
        self.division
            .iter()
            .filter(|n| n.partitioning == Partitioning::Bisection)
    }

    /// Extents and SRS of an arbitrary tile, derived from the division root
    /// that contains it.
    pub fn node_info(&self, id: TileId) -> Option<NodeInfo> {
        self.bisection_roots()
            .find(|root| id.is_within(root.id))
            .map(|root| NodeInfo::descendant_of(root, id))
    }
}

/// Geometry of one tile: its address, sampling SRS and extents in that SRS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeInfo {
    pub id: TileId,
    pub srs: Srs,
    pub extents: Aabb2,
}

impl NodeInfo {
    pub fn from_root(root: &DivisionNode) -> Self {
        Self {
            id: root.id,
            srs: root.srs,
            extents: root.extents,
        }
    }

    /// Caller guarantees `id.is_within(root.id)`.
    fn descendant_of(root: &DivisionNode, id: TileId) -> Self {
        let depth = id.lod - root.id.lod;
        let n = TileId::grid_size(depth) as f64;
        let size = root.extents.size();
        let (w, h) = (size.x / n, size.y / n);
        let lx = (id.x - (root.id.x << depth)) as f64;
        let ly = (id.y - (root.id.y << depth)) as f64;
        let min_x = root.extents.min[0] + lx * w;
        let max_y = root.extents.max[1] - ly * h;
        Self {
            id,
            srs: root.srs,
            extents: Aabb2::new([min_x, max_y - h], [min_x + w, max_y]),
        }
    }

    pub fn inside(&self, p: Vec2) -> bool {
        self.extents.contains(p)
    }

    /// The four child tiles, in [`TileId::children`] order.
    pub fn children(&self) -> [NodeInfo; 4] {
        let size = self.extents.size();
        let (w, h) = (size.x * 0.5, size.y * 0.5);
        let [min_x, _] = self.extents.min;
        let [_, max_y] = self.extents.max;
        let ids = self.id.children();
        std::array::from_fn(|i| {
            let (col, row) = ((i % 2) as f64, (i / 2) as f64);
            let x0 = min_x + col * w;
            let y1 = max_y - row * h;
            NodeInfo {
                id: ids[i],
                srs: self.srs,
                extents: Aabb2::new([x0, y1 - h], [x0 + w, y1]),
            }
        })
    }

    /// Edge length in metres used to decide sampling depth (the longer
    /// side). Angular extents are measured along the equator.
    pub fn extent_size(&self) -> f64 {
        let s = self.extents.size();
        s.x.max(s.y) * self.srs.metres_per_unit()
    }
}
