//! Section Visibility - decoding of culling engine tiles onto renderer regions
//! Built with compartmentalized benchmarkable components
pub mod camera;
pub mod config;
pub mod coords;
pub mod engine;
pub mod ffi;
pub mod graph;
pub mod perf;
pub mod region;
pub mod tile;

pub use camera::{CameraTransform, Frustum};
pub use config::{ConfigError, CullingConfig};
pub use coords::{iterate_splits_on_axis, AxisSplit, AxisSplits};
pub use engine::{CullingEngine, EngineError, GraphParams, SearchRequest};
pub use ffi::{
    decode_tile_records, encode_tile_records, FfiCamera, FfiSlice, FfiTile, NativeEngine,
    NativeEntryPoints, WireError,
};
pub use graph::{FrameStats, SearchOptions, VisibilityGraph};
pub use perf::{CounterSnapshot, FunctionCounters, FUNCTION_COUNTERS};
pub use region::{
    LocalSectionIndex, Region, RegionLayout, RegionMap, RegionStore, RenderRegion, RenderSection,
    Section,
};
pub use tile::{DecodeStats, SectionVisitor, Tile, TileDecoder, TILE_HEIGHT, TILE_LENGTH, TILE_WIDTH};
