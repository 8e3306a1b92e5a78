//! Renderer-side partitioning of sections into regions
//!
//! Regions share width and length with tiles, but their height is configurable
//! and their Y alignment is independent of the culling engine's tiles. The
//! decoder only needs the capability traits below; [`RegionMap`] is an
//! in-memory implementation for tools, tests and simple embedders.
pub mod map;

pub use map::{RegionMap, RenderRegion, RenderSection};

use glam::{IVec3, UVec3};
use std::fmt;

use crate::tile::{TILE_LENGTH_SH, TILE_WIDTH_SH};

pub const REGION_WIDTH_SH: u32 = TILE_WIDTH_SH;
pub const REGION_LENGTH_SH: u32 = TILE_LENGTH_SH;
pub const REGION_WIDTH: i32 = 1 << REGION_WIDTH_SH;
pub const REGION_LENGTH: i32 = 1 << REGION_LENGTH_SH;

pub const DEFAULT_REGION_HEIGHT_SH: u32 = 2;
/// Largest supported height shift; keeps local indices within 16 bits.
pub const MAX_REGION_HEIGHT_SH: u32 = 5;

/// Shape of a region and the bit layout of section indices inside it.
///
/// Local indices use XZY order: Y in the low bits, then Z, then X.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RegionLayout {
    height_shift: u32,
}

impl RegionLayout {
    /// Returns `None` if the height shift is larger than [`MAX_REGION_HEIGHT_SH`].
    pub const fn new(height_shift: u32) -> Option<Self> {
        if height_shift > MAX_REGION_HEIGHT_SH {
            None
        } else {
            Some(Self { height_shift })
        }
    }

    #[inline]
    pub const fn height_shift(&self) -> u32 {
        self.height_shift
    }

    #[inline]
    pub const fn height(&self) -> i32 {
        1 << self.height_shift
    }

    #[inline]
    pub const fn section_count(&self) -> usize {
        ((REGION_WIDTH as usize) * (REGION_LENGTH as usize)) << self.height_shift
    }

    #[inline]
    pub const fn z_offset(&self) -> u32 {
        self.height_shift
    }

    #[inline]
    pub const fn x_offset(&self) -> u32 {
        self.height_shift + REGION_LENGTH_SH
    }

    /// Pack region-local coordinates into a local section index.
    #[inline]
    pub const fn pack_local_index(&self, x: u32, y: u32, z: u32) -> LocalSectionIndex {
        let y_mask = (1 << self.height_shift) - 1;
        LocalSectionIndex(
            (((x & (REGION_WIDTH as u32 - 1)) << self.x_offset())
                | ((z & (REGION_LENGTH as u32 - 1)) << self.z_offset())
                | (y & y_mask)) as u16,
        )
    }

    #[inline]
    pub const fn unpack_local_index(&self, index: LocalSectionIndex) -> UVec3 {
        let raw = index.0 as u32;
        let y_mask = (1 << self.height_shift) - 1;
        UVec3::new(
            (raw >> self.x_offset()) & (REGION_WIDTH as u32 - 1),
            raw & y_mask,
            (raw >> self.z_offset()) & (REGION_LENGTH as u32 - 1),
        )
    }

    /// Region coordinates containing a world section position.
    #[inline]
    pub fn region_pos(&self, section: IVec3) -> IVec3 {
        IVec3::new(
            section.x >> REGION_WIDTH_SH,
            section.y >> self.height_shift,
            section.z >> REGION_LENGTH_SH,
        )
    }

    /// Section coordinates of a region's minimum corner.
    #[inline]
    pub fn region_origin(&self, region: IVec3) -> IVec3 {
        IVec3::new(
            region.x << REGION_WIDTH_SH,
            region.y << self.height_shift,
            region.z << REGION_LENGTH_SH,
        )
    }

    /// Local index of a world section position inside its region.
    #[inline]
    pub fn local_index_of(&self, section: IVec3) -> LocalSectionIndex {
        self.pack_local_index(section.x as u32, section.y as u32, section.z as u32)
    }
}

impl Default for RegionLayout {
    fn default() -> Self {
        Self {
            height_shift: DEFAULT_REGION_HEIGHT_SH,
        }
    }
}

/// Index of a section inside its region.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct LocalSectionIndex(pub u16);

impl LocalSectionIndex {
    #[inline]
    pub const fn to_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for LocalSectionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pack region coordinates into a single key: 22 bits X, 22 bits Z, 20 bits Y.
#[inline]
pub const fn region_key(x: i32, y: i32, z: i32) -> u64 {
    (((x as i64) & 0x3F_FFFF) << 42 | ((z as i64) & 0x3F_FFFF) << 20 | ((y as i64) & 0xF_FFFF))
        as u64
}

/// A section that can be marked visible for a frame.
///
/// Lookups hand out shared references, so implementations keep the frame
/// counter behind interior mutability.
pub trait Section {
    fn set_last_visible_frame(&self, frame: u32);
}

/// A loaded region of sections.
pub trait Region {
    type Section: Section;

    /// Pack region-local coordinates into this region's index layout.
    fn pack_local_index(&self, x: u32, y: u32, z: u32) -> LocalSectionIndex;

    /// Section at a local index, or `None` if that section is not loaded.
    fn section(&self, index: LocalSectionIndex) -> Option<&Self::Section>;
}

/// Lookup of loaded regions by region coordinates.
pub trait RegionStore {
    type Region: Region;

    fn layout(&self) -> RegionLayout;

    /// Region at the given region coordinates, or `None` if it is not loaded.
    fn region(&self, region_pos: IVec3) -> Option<&Self::Region>;
}
