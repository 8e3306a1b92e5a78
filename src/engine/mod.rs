//! Interface to the external spatial-culling engine
//!
//! The engine owns a section graph built from per-section visibility bitmasks
//! and answers frustum/occlusion queries with a sequence of tiles. Only the
//! call contract lives here; [`crate::ffi::NativeEngine`] binds it to a native
//! library.
use glam::IVec3;
use std::fmt;

use crate::ffi::{FfiCamera, WireError};
use crate::tile::Tile;

/// Parameters the engine graph is created with.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GraphParams {
    pub render_distance: u8,
    pub world_bottom_section_y: i8,
    pub world_top_section_y: i8,
}

impl GraphParams {
    pub fn new(render_distance: u8, world_bottom_section_y: i8, world_top_section_y: i8) -> Self {
        Self {
            render_distance,
            world_bottom_section_y,
            world_top_section_y,
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.world_top_section_y < self.world_bottom_section_y {
            return Err(EngineError::InvalidParams(format!(
                "world top section {} is below world bottom section {}",
                self.world_top_section_y, self.world_bottom_section_y
            )));
        }
        if self.render_distance == 0 {
            return Err(EngineError::InvalidParams(
                "render distance must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of section layers between bottom and top, inclusive
    #[inline]
    pub fn world_height(&self) -> i32 {
        self.world_top_section_y as i32 - self.world_bottom_section_y as i32 + 1
    }
}

impl Default for GraphParams {
    fn default() -> Self {
        Self {
            render_distance: 12,
            world_bottom_section_y: -4,
            world_top_section_y: 19,
        }
    }
}

/// One engine query.
#[derive(Copy, Clone, Debug)]
pub struct SearchRequest {
    pub camera: FfiCamera,
    pub search_distance: f32,
    pub use_occlusion_culling: bool,
}

/// A culling engine holding a section graph.
pub trait CullingEngine {
    /// Replace the visibility bitmask stored for a section.
    fn set_section(&mut self, pos: IVec3, visibility: u64);

    /// Run a query. The returned tiles stay valid until the next call on the
    /// engine.
    fn search(&mut self, request: &SearchRequest) -> Result<&[Tile], EngineError>;
}

impl<E: CullingEngine + ?Sized> CullingEngine for Box<E> {
    fn set_section(&mut self, pos: IVec3, visibility: u64) {
        (**self).set_section(pos, visibility)
    }

    fn search(&mut self, request: &SearchRequest) -> Result<&[Tile], EngineError> {
        (**self).search(request)
    }
}

#[derive(Debug)]
pub enum EngineError {
    /// The engine returned a null graph handle
    GraphCreationFailed(GraphParams),
    InvalidParams(String),
    Wire(WireError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::GraphCreationFailed(params) => write!(
                f,
                "failed to create culling graph (render distance {}, sections {}..={})",
                params.render_distance, params.world_bottom_section_y, params.world_top_section_y
            ),
            EngineError::InvalidParams(reason) => write!(f, "invalid graph parameters: {reason}"),
            EngineError::Wire(err) => write!(f, "malformed search result: {err}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Wire(err) => Some(err),
            _ => None,
        }
    }
}

impl From<WireError> for EngineError {
    fn from(err: WireError) -> Self {
        EngineError::Wire(err)
    }
}
