pub mod reference_frame;
pub mod tile_id;
pub mod tree;
pub mod validity;

pub use reference_frame::*;
pub use tile_id::*;
pub use tree::*;
pub use validity::*;
