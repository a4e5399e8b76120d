pub mod batch;
pub mod manager;
pub mod material;
pub mod pool;
pub mod render_data;

pub use batch::{
    Batch, BatchState, Member, MemberRoute, MergedDraw, PassThroughReason, RenderTemplate,
    MAX_VERTEX_LIMIT,
};
pub use manager::{BatchManager, BatchStats, DrawItem};
pub use material::{DrawFlags, Material, ShaderType};
pub use pool::{BatchId, BatchPool, BatchReclaim};
pub use render_data::RenderData;
