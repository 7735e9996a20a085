//! Camera navigation over a planet-scale terrain: input gestures become
//! targets, a per-frame update eases the camera toward them, and ground
//! elevation under the camera is resolved incrementally from the terrain tree.

pub mod camera;
pub mod convertor;
pub mod error;
pub mod height;
pub mod navigation;
pub mod options;
pub mod position;
pub mod solver;
pub mod statistics;

pub use camera::*;
pub use convertor::*;
pub use error::*;
pub use height::*;
pub use navigation::*;
pub use options::*;
pub use position::*;
pub use solver::*;
pub use statistics::*;
