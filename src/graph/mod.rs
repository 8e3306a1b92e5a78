//! Per-frame visibility queries against a culling engine
//!
//! [`VisibilityGraph`] owns the engine, forwards section visibility changes to
//! it and turns each query result into section visits through a
//! [`TileDecoder`]. When no engine could be created the graph is unsupported
//! and every operation is a no-op.
use glam::IVec3;
use std::collections::HashMap;
use std::time::Instant;

use crate::camera::{CameraTransform, Frustum};
use crate::engine::{CullingEngine, EngineError, SearchRequest};
use crate::ffi::FfiCamera;
#[cfg_attr(not(feature = "profiling"), allow(unused_imports))]
use crate::perf::FUNCTION_COUNTERS;
use crate::perf::QueryTimings;
use crate::region::{Region, RegionStore};
use crate::tile::{DecodeStats, SectionVisitor, TileDecoder};
use crate::{count_add, count_call, perf_scope};

/// Query options that may change from frame to frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SearchOptions {
    /// Search radius in blocks
    pub search_distance: f32,
    pub use_occlusion_culling: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            search_distance: 192.0,
            use_occlusion_culling: true,
        }
    }
}

/// Result of one [`VisibilityGraph::find_visible`] call.
#[derive(Copy, Clone, Debug, Default)]
pub struct FrameStats {
    pub tiles: usize,
    pub decode: DecodeStats,
    pub timings: QueryTimings,
}

pub struct VisibilityGraph<E: CullingEngine> {
    engine: Option<E>,
    /// Last bitmask forwarded per section; sections at 0 are not tracked
    last_visibility: HashMap<IVec3, u64>,
}

impl<E: CullingEngine> VisibilityGraph<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine: Some(engine),
            last_visibility: HashMap::new(),
        }
    }

    /// A graph with no engine behind it.
    pub fn unsupported() -> Self {
        Self {
            engine: None,
            last_visibility: HashMap::new(),
        }
    }

    /// Wrap the outcome of creating an engine. A failure is logged and
    /// produces an unsupported graph.
    pub fn from_engine(engine: Result<E, EngineError>) -> Self {
        match engine {
            Ok(engine) => Self::new(engine),
            Err(err) => {
                log::error!("Culling engine unavailable, falling back to no culling: {err}");
                Self::unsupported()
            }
        }
    }

    #[inline]
    pub fn is_supported(&self) -> bool {
        self.engine.is_some()
    }

    pub fn engine(&self) -> Option<&E> {
        self.engine.as_ref()
    }

    /// Number of sections with a non-zero bitmask held by the engine
    pub fn tracked_sections(&self) -> usize {
        self.last_visibility.len()
    }

    /// Forward a section's visibility bitmask if it differs from the last one
    /// sent. Returns whether the engine was called.
    pub fn set_section(&mut self, pos: IVec3, visibility: u64) -> bool {
        let Some(engine) = self.engine.as_mut() else {
            return false;
        };

        let previous = self.last_visibility.get(&pos).copied().unwrap_or(0);
        if previous == visibility {
            count_call!(FUNCTION_COUNTERS.set_section_unchanged);
            return false;
        }

        if visibility == 0 {
            self.last_visibility.remove(&pos);
        } else {
            self.last_visibility.insert(pos, visibility);
        }

        log::trace!("set_section {pos}: {previous:#x} -> {visibility:#x}");
        engine.set_section(pos, visibility);
        count_call!(FUNCTION_COUNTERS.set_section_forwarded);
        true
    }

    /// Query the engine and visit every visible section in `store`, marking
    /// each with `frame`. Nothing is visited if the query fails.
    pub fn find_visible<R, V>(
        &mut self,
        store: &R,
        visitor: &mut V,
        frustum: &Frustum,
        transform: &CameraTransform,
        options: SearchOptions,
        frame: u32,
    ) -> Result<FrameStats, EngineError>
    where
        R: RegionStore,
        V: SectionVisitor<<R::Region as Region>::Section> + ?Sized,
    {
        let Some(engine) = self.engine.as_mut() else {
            return Ok(FrameStats::default());
        };

        perf_scope!("find_visible");
        count_call!(FUNCTION_COUNTERS.searches);

        let request = SearchRequest {
            camera: FfiCamera::new(frustum, transform),
            search_distance: options.search_distance,
            use_occlusion_culling: options.use_occlusion_culling,
        };

        let search_start = Instant::now();
        let tiles = engine.search(&request)?;
        let search_us = search_start.elapsed().as_secs_f64() * 1_000_000.0;
        count_add!(FUNCTION_COUNTERS.tiles_received, tiles.len() as u64);

        let decode_start = Instant::now();
        let decode = TileDecoder::new(store).decode_all(tiles, frame, visitor);
        let decode_us = decode_start.elapsed().as_secs_f64() * 1_000_000.0;

        let stats = FrameStats {
            tiles: tiles.len(),
            decode,
            timings: QueryTimings {
                search_us,
                decode_us,
            },
        };

        log::trace!(
            "Frame {frame}: {} tiles, {} sections visited, {} regions missing",
            stats.tiles,
            decode.sections_visited,
            decode.regions_missing
        );
        stats.timings.log_summary();

        Ok(stats)
    }
}
