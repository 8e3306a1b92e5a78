/// Culling engine backed by a native library's exported functions
/// Resolving the symbols is left to the embedder; this only owns the graph handle
use glam::IVec3;
use std::ffi::c_void;
use std::ptr::NonNull;

use super::{FfiCamera, FfiSlice};
use crate::engine::{CullingEngine, EngineError, GraphParams, SearchRequest};
use crate::tile::Tile;

pub type CreateGraphFn =
    unsafe extern "C" fn(render_distance: u8, world_bottom_section_y: i8, world_top_section_y: i8) -> *mut c_void;
pub type SetSectionFn = unsafe extern "C" fn(graph: *mut c_void, x: i32, y: i32, z: i32, visibility: u64);
pub type SearchFn = unsafe extern "C" fn(
    out: *mut FfiSlice,
    graph: *mut c_void,
    camera: *const FfiCamera,
    search_distance: f32,
    use_occlusion_culling: bool,
);
pub type DeleteGraphFn = unsafe extern "C" fn(graph: *mut c_void);

/// The engine's exported graph functions.
#[derive(Copy, Clone, Debug)]
pub struct NativeEntryPoints {
    create_graph: CreateGraphFn,
    set_section: SetSectionFn,
    search: SearchFn,
    delete_graph: DeleteGraphFn,
}

impl NativeEntryPoints {
    /// # Safety
    ///
    /// The functions must follow the engine's graph contract: `create_graph`
    /// returns a handle or null, the handle stays valid until `delete_graph`,
    /// and `search` writes a slice that stays valid until the next call on
    /// the same handle.
    pub unsafe fn new(
        create_graph: CreateGraphFn,
        set_section: SetSectionFn,
        search: SearchFn,
        delete_graph: DeleteGraphFn,
    ) -> Self {
        Self {
            create_graph,
            set_section,
            search,
            delete_graph,
        }
    }
}

/// Owns one native graph. The graph is deleted on drop.
pub struct NativeEngine {
    entry: NativeEntryPoints,
    graph: NonNull<c_void>,
    tiles: Vec<Tile>,
}

impl NativeEngine {
    pub fn create(entry: NativeEntryPoints, params: GraphParams) -> Result<Self, EngineError> {
        params.validate()?;

        // SAFETY: the entry points were vouched for in `NativeEntryPoints::new`.
        let raw = unsafe {
            (entry.create_graph)(
                params.render_distance,
                params.world_bottom_section_y,
                params.world_top_section_y,
            )
        };
        let graph = NonNull::new(raw).ok_or(EngineError::GraphCreationFailed(params))?;

        log::debug!(
            "Created native culling graph {:p} (render distance {}, sections {}..={})",
            graph,
            params.render_distance,
            params.world_bottom_section_y,
            params.world_top_section_y
        );

        Ok(Self {
            entry,
            graph,
            tiles: Vec::new(),
        })
    }
}

impl CullingEngine for NativeEngine {
    fn set_section(&mut self, pos: IVec3, visibility: u64) {
        // SAFETY: `graph` is live until drop.
        unsafe { (self.entry.set_section)(self.graph.as_ptr(), pos.x, pos.y, pos.z, visibility) };
    }

    fn search(&mut self, request: &SearchRequest) -> Result<&[Tile], EngineError> {
        let mut slice = FfiSlice::EMPTY;

        // SAFETY: `graph` is live until drop and both pointers outlive the call.
        unsafe {
            (self.entry.search)(
                &mut slice,
                self.graph.as_ptr(),
                &request.camera,
                request.search_distance,
                request.use_occlusion_culling,
            );
            slice.read_into(&mut self.tiles)?;
        }

        log::trace!("Native search returned {} tiles", self.tiles.len());
        Ok(&self.tiles)
    }
}

impl Drop for NativeEngine {
    fn drop(&mut self) {
        log::debug!("Deleting native culling graph {:p}", self.graph);
        // SAFETY: the handle came from `create_graph` and is deleted exactly once.
        unsafe { (self.entry.delete_graph)(self.graph.as_ptr()) };
    }
}
