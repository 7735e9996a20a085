pub mod angles;
pub mod ecef;
pub mod geodesy;
pub mod mat;
pub mod srs;
pub mod vec;

pub use angles::*;
pub use ecef::*;
pub use geodesy::*;
pub use mat::*;
pub use srs::*;
pub use vec::*;
