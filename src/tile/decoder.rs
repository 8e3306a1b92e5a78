//! Mapping of tile visibility bits onto renderer regions
//!
//! Tiles and regions line up on X and Z, so the region X/Z coordinates come
//! straight from the tile origin. On Y the tile is walked split by region
//! height, which yields each region the tile passes through together with the
//! tile-local Y levels that belong to it.
use glam::IVec3;
use std::ops::AddAssign;

use crate::coords::AxisSplits;
#[cfg_attr(not(feature = "profiling"), allow(unused_imports))]
use crate::perf::FUNCTION_COUNTERS;
use crate::region::{Region, RegionLayout, RegionStore, Section, REGION_LENGTH_SH, REGION_WIDTH_SH};
use crate::{count_add, count_call};

use super::{SetBits, Tile, TILE_HEIGHT, TILE_IDX_X_OFFSET, TILE_IDX_Z_OFFSET, TILE_LENGTH_M, TILE_WIDTH_M};

/// Receives each section found visible during a decode pass.
pub trait SectionVisitor<S: ?Sized> {
    fn visit(&mut self, section: &S);
}

impl<S: ?Sized, F: FnMut(&S)> SectionVisitor<S> for F {
    #[inline]
    fn visit(&mut self, section: &S) {
        self(section)
    }
}

/// Work done while decoding one or more tiles.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub tiles: u64,
    /// Region-height splits enumerated on the Y axis
    pub region_splits: u64,
    pub region_lookups: u64,
    pub regions_missing: u64,
    pub section_lookups: u64,
    pub sections_missing: u64,
    pub sections_visited: u64,
    /// Tile levels at or above `i32::MAX`, past the end of the decodable range
    pub levels_clipped: u64,
}

impl AddAssign for DecodeStats {
    fn add_assign(&mut self, other: Self) {
        self.tiles += other.tiles;
        self.region_splits += other.region_splits;
        self.region_lookups += other.region_lookups;
        self.regions_missing += other.regions_missing;
        self.section_lookups += other.section_lookups;
        self.sections_missing += other.sections_missing;
        self.sections_visited += other.sections_visited;
        self.levels_clipped += other.levels_clipped;
    }
}

/// Decodes tiles against a region store.
pub struct TileDecoder<'a, R: RegionStore> {
    regions: &'a R,
    layout: RegionLayout,
}

impl<'a, R: RegionStore> TileDecoder<'a, R> {
    pub fn new(regions: &'a R) -> Self {
        Self {
            layout: regions.layout(),
            regions,
        }
    }

    #[inline]
    pub fn layout(&self) -> RegionLayout {
        self.layout
    }

    /// Mark every visible section of `tile` with `frame` and report it to
    /// `visitor`. Unloaded regions and sections are skipped.
    pub fn decode<V>(&self, tile: &Tile, frame: u32, visitor: &mut V) -> DecodeStats
    where
        V: SectionVisitor<<R::Region as Region>::Section> + ?Sized,
    {
        let mut stats = DecodeStats {
            tiles: 1,
            ..Default::default()
        };

        if tile.is_empty() {
            return stats;
        }

        let region_x = tile.origin.x >> REGION_WIDTH_SH;
        let region_z = tile.origin.z >> REGION_LENGTH_SH;

        // Y ranges are half-open, so levels from `i32::MAX` up are dropped.
        let end_y = tile.origin.y.saturating_add(TILE_HEIGHT);
        stats.levels_clipped = (TILE_HEIGHT - (end_y - tile.origin.y)) as u64;

        let splits = AxisSplits::new(tile.origin.y, end_y, self.layout.height());

        for split in splits {
            stats.region_splits += 1;

            let tile_levels = split.source_range();
            let tile_levels = tile_levels.start as usize..tile_levels.end as usize;

            // Nothing visible on these levels, so the region is never needed.
            if !tile.any_visible_in(tile_levels.clone()) {
                continue;
            }

            stats.region_lookups += 1;
            count_call!(FUNCTION_COUNTERS.region_lookups);

            let Some(region) = self.regions.region(IVec3::new(region_x, split.split, region_z))
            else {
                stats.regions_missing += 1;
                continue;
            };

            for (section_y_in_region, section_y_in_tile) in (split.start..split.end).zip(tile_levels) {
                for bit in SetBits::new(tile.slice(section_y_in_tile)) {
                    // The bit index is the ZX part of the YZX tile index. Tiles and
                    // regions share X and Z, so the local coordinates carry over.
                    let section_x = (bit >> TILE_IDX_X_OFFSET) & TILE_WIDTH_M;
                    let section_z = (bit >> TILE_IDX_Z_OFFSET) & TILE_LENGTH_M;
                    let index =
                        region.pack_local_index(section_x, section_y_in_region as u32, section_z);

                    stats.section_lookups += 1;
                    match region.section(index) {
                        Some(section) => {
                            section.set_last_visible_frame(frame);
                            visitor.visit(section);
                            stats.sections_visited += 1;
                        }
                        None => stats.sections_missing += 1,
                    }
                }
            }
        }

        count_call!(FUNCTION_COUNTERS.tiles_decoded);
        count_add!(FUNCTION_COUNTERS.sections_visited, stats.sections_visited);

        stats
    }

    /// Decode tiles in order, accumulating their stats.
    pub fn decode_all<V>(&self, tiles: &[Tile], frame: u32, visitor: &mut V) -> DecodeStats
    where
        V: SectionVisitor<<R::Region as Region>::Section> + ?Sized,
    {
        let mut stats = DecodeStats::default();
        for tile in tiles {
            stats += self.decode(tile, frame, visitor);
        }
        stats
    }
}
