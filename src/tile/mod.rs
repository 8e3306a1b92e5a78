//! Visibility tiles produced by the culling engine
//!
//! A tile is an 8x8x8 cube of sections with one visibility bit per section.
//! Bits are packed in YZX order, so each of the eight `u64` words holds the
//! complete X/Z slice of one tile-local Y level.
pub mod decoder;

pub use decoder::{DecodeStats, SectionVisitor, TileDecoder};

use glam::{IVec3, UVec3};

pub const TILE_WIDTH: i32 = 8;
pub const TILE_HEIGHT: i32 = 8;
pub const TILE_LENGTH: i32 = 8;

pub const TILE_WIDTH_SH: u32 = 3;
pub const TILE_HEIGHT_SH: u32 = 3;
pub const TILE_LENGTH_SH: u32 = 3;

pub const TILE_WIDTH_M: u32 = TILE_WIDTH as u32 - 1;
pub const TILE_HEIGHT_M: u32 = TILE_HEIGHT as u32 - 1;
pub const TILE_LENGTH_M: u32 = TILE_LENGTH as u32 - 1;

// YZX order
pub const TILE_IDX_X_OFFSET: u32 = 0;
pub const TILE_IDX_Z_OFFSET: u32 = 3;
pub const TILE_IDX_Y_OFFSET: u32 = 6;

pub const TILE_VOLUME: usize = (TILE_WIDTH * TILE_HEIGHT * TILE_LENGTH) as usize;

/// One tile of visible sections, owned by the caller after decoding the
/// engine's result.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tile {
    /// Section coordinates of the tile's minimum corner
    pub origin: IVec3,
    /// One word per tile-local Y level, bits indexed by `(z << 3) | x`
    pub visible_sections: [u64; TILE_HEIGHT as usize],
}

impl Tile {
    #[inline]
    pub const fn new(origin: IVec3, visible_sections: [u64; TILE_HEIGHT as usize]) -> Self {
        Self {
            origin,
            visible_sections,
        }
    }

    /// A tile with no visible sections.
    #[inline]
    pub const fn empty(origin: IVec3) -> Self {
        Self::new(origin, [0; TILE_HEIGHT as usize])
    }

    /// A tile with every section visible.
    #[inline]
    pub const fn full(origin: IVec3) -> Self {
        Self::new(origin, [u64::MAX; TILE_HEIGHT as usize])
    }

    /// Pack tile-local coordinates into a YZX bit index.
    #[inline]
    pub const fn pack_index(x: u32, y: u32, z: u32) -> u32 {
        ((y & TILE_HEIGHT_M) << TILE_IDX_Y_OFFSET)
            | ((z & TILE_LENGTH_M) << TILE_IDX_Z_OFFSET)
            | ((x & TILE_WIDTH_M) << TILE_IDX_X_OFFSET)
    }

    /// Unpack a YZX bit index into tile-local coordinates.
    #[inline]
    pub const fn unpack_index(index: u32) -> (u32, u32, u32) {
        (
            (index >> TILE_IDX_X_OFFSET) & TILE_WIDTH_M,
            (index >> TILE_IDX_Y_OFFSET) & TILE_HEIGHT_M,
            (index >> TILE_IDX_Z_OFFSET) & TILE_LENGTH_M,
        )
    }

    /// The X/Z slice of visible sections at a tile-local Y level.
    #[inline]
    pub fn slice(&self, local_y: usize) -> u64 {
        self.visible_sections[local_y]
    }

    #[inline]
    pub fn is_visible(&self, local: UVec3) -> bool {
        let index = Self::pack_index(local.x, local.y, local.z);
        (self.visible_sections[(index >> 6) as usize] >> (index & 63)) & 1 != 0
    }

    #[inline]
    pub fn set_visible(&mut self, local: UVec3) {
        let index = Self::pack_index(local.x, local.y, local.z);
        self.visible_sections[(index >> 6) as usize] |= 1u64 << (index & 63);
    }

    /// Returns true if no section in the tile is visible.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.visible_sections.iter().all(|&slice| slice == 0)
    }

    /// Number of visible sections in the tile.
    #[inline]
    pub fn visible_count(&self) -> u32 {
        self.visible_sections.iter().map(|slice| slice.count_ones()).sum()
    }

    /// Whether any slice in `range` has a visible section.
    #[inline]
    pub fn any_visible_in(&self, range: std::ops::Range<usize>) -> bool {
        self.visible_sections[range].iter().any(|&slice| slice != 0)
    }

    /// World section coordinates of every visible section, in YZX order.
    pub fn visible_positions(&self) -> impl Iterator<Item = IVec3> + '_ {
        self.visible_sections
            .iter()
            .enumerate()
            .flat_map(move |(y, &slice)| {
                SetBits::new(slice).map(move |bit| {
                    let (x, _, z) = Self::unpack_index(bit);
                    self.origin + IVec3::new(x as i32, y as i32, z as i32)
                })
            })
    }

    /// Tile origin containing the given section, for a world whose tiles start
    /// at `world_bottom_section_y`.
    #[inline]
    pub fn origin_of(section: IVec3, world_bottom_section_y: i32) -> IVec3 {
        let shifted_y = section.y - world_bottom_section_y;
        IVec3::new(
            (section.x >> TILE_WIDTH_SH) << TILE_WIDTH_SH,
            ((shifted_y >> TILE_HEIGHT_SH) << TILE_HEIGHT_SH) + world_bottom_section_y,
            (section.z >> TILE_LENGTH_SH) << TILE_LENGTH_SH,
        )
    }
}

/// Iterates the set bits of a word from lowest to highest, clearing the lowest
/// set bit each step so zero words cost nothing.
#[derive(Copy, Clone, Debug)]
pub struct SetBits(u64);

impl SetBits {
    #[inline]
    pub const fn new(bits: u64) -> Self {
        Self(bits)
    }
}

impl Iterator for SetBits {
    type Item = u32;

    #[inline]
    fn next(&mut self) -> Option<u32> {
        if self.0 == 0 {
            return None;
        }
        let bit = self.0.trailing_zeros();
        self.0 &= self.0 - 1;
        Some(bit)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let count = self.0.count_ones() as usize;
        (count, Some(count))
    }
}

impl ExactSizeIterator for SetBits {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_index_is_yzx() {
        assert_eq!(Tile::pack_index(0, 0, 0), 0);
        assert_eq!(Tile::pack_index(1, 0, 0), 1);
        assert_eq!(Tile::pack_index(0, 0, 1), 8);
        assert_eq!(Tile::pack_index(0, 1, 0), 64);
        assert_eq!(Tile::pack_index(7, 7, 7), 511);
    }

    #[test]
    fn unpack_inverts_pack() {
        for index in 0..TILE_VOLUME as u32 {
            let (x, y, z) = Tile::unpack_index(index);
            assert_eq!(Tile::pack_index(x, y, z), index);
        }
    }

    #[test]
    fn set_visible_lands_in_matching_slice() {
        let mut tile = Tile::empty(IVec3::ZERO);
        tile.set_visible(UVec3::new(3, 5, 2));

        assert_eq!(tile.slice(5), 1 << ((2 << 3) | 3));
        assert!(tile.is_visible(UVec3::new(3, 5, 2)));
        assert!(!tile.is_visible(UVec3::new(2, 5, 3)));
        assert_eq!(tile.visible_count(), 1);
    }

    #[test]
    fn set_bits_clears_lowest_first() {
        let bits: Vec<u32> = SetBits::new(0b1010_0001).collect();
        assert_eq!(bits, vec![0, 5, 7]);
        assert_eq!(SetBits::new(0).count(), 0);
        assert_eq!(SetBits::new(u64::MAX).len(), 64);
    }

    #[test]
    fn visible_positions_are_world_coordinates() {
        let mut tile = Tile::empty(IVec3::new(16, -4, -8));
        tile.set_visible(UVec3::new(1, 2, 3));
        tile.set_visible(UVec3::new(7, 0, 0));

        let positions: Vec<IVec3> = tile.visible_positions().collect();
        assert_eq!(
            positions,
            vec![IVec3::new(23, -4, -8), IVec3::new(17, -2, -5)]
        );
    }

    #[test]
    fn origin_of_respects_world_bottom() {
        assert_eq!(Tile::origin_of(IVec3::new(9, 0, -1), -4), IVec3::new(8, -4, -8));
        assert_eq!(Tile::origin_of(IVec3::new(0, 4, 0), -4), IVec3::new(0, 4, 0));
        assert_eq!(Tile::origin_of(IVec3::new(0, 3, 0), -4), IVec3::new(0, -4, 0));
    }
}
