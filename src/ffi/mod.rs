//! Fixed-layout records exchanged with a native culling engine
//!
//! Every record here is `repr(C)` and matches the engine's struct layout
//! byte for byte. Engine results are validated and copied into owned [`Tile`]
//! values before anything walks them.
pub mod native;

pub use native::{NativeEngine, NativeEntryPoints};

use bytemuck::{Pod, Zeroable};
use glam::IVec3;
use std::fmt;
use std::mem::{align_of, size_of};

use crate::camera::{CameraTransform, Frustum};
use crate::tile::{Tile, TILE_HEIGHT, TILE_LENGTH_M, TILE_WIDTH_M};

/// Frustum planes and camera position as the engine expects them.
///
/// Plane order is -X, -Y, -Z, +X, +Y, +Z, each stored as (x, y, z, w).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct FfiCamera {
    pub frustum_planes: [[f32; 4]; 6],
    pub pos: [f64; 3],
}

impl FfiCamera {
    pub fn new(frustum: &Frustum, transform: &CameraTransform) -> Self {
        Self {
            frustum_planes: frustum.to_arrays(),
            pos: transform.position.to_array(),
        }
    }
}

/// One 8x8x8 tile of visibility results.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct FfiTile {
    pub origin_section_coords: [i32; 3],
    pub _padding: u32,
    pub visible_sections: [u64; TILE_HEIGHT as usize],
}

impl FfiTile {
    /// Same record with every field converted between native and
    /// little-endian byte order. The conversion is its own inverse.
    fn swap_le(self) -> Self {
        Self {
            origin_section_coords: self.origin_section_coords.map(i32::to_le),
            _padding: 0,
            visible_sections: self.visible_sections.map(u64::to_le),
        }
    }

    /// Convert record `index` into a tile, rejecting origins the decoder
    /// cannot place: X/Z off the tile grid, or Y so high that the tile's top
    /// level would pass `i32::MAX`.
    pub fn to_tile(&self, index: usize) -> Result<Tile, WireError> {
        let [x, y, z] = self.origin_section_coords;
        if (x as u32 & TILE_WIDTH_M) != 0 || (z as u32 & TILE_LENGTH_M) != 0 {
            return Err(WireError::UnalignedOrigin {
                index,
                origin: self.origin_section_coords,
            });
        }
        if y > i32::MAX - (TILE_HEIGHT - 1) {
            return Err(WireError::OriginOutOfRange {
                index,
                origin: self.origin_section_coords,
            });
        }
        Ok(Tile::from(*self))
    }
}

impl From<FfiTile> for Tile {
    #[inline]
    fn from(record: FfiTile) -> Self {
        Tile::new(
            IVec3::from_array(record.origin_section_coords),
            record.visible_sections,
        )
    }
}

impl From<&Tile> for FfiTile {
    #[inline]
    fn from(tile: &Tile) -> Self {
        Self {
            origin_section_coords: tile.origin.to_array(),
            _padding: 0,
            visible_sections: tile.visible_sections,
        }
    }
}

/// Engine-owned array of tile records.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct FfiSlice {
    pub data_ptr: *const FfiTile,
    pub count: usize,
}

impl FfiSlice {
    pub const EMPTY: FfiSlice = FfiSlice {
        data_ptr: std::ptr::null(),
        count: 0,
    };

    /// Check the slice header without touching the data.
    pub fn validate(&self) -> Result<(), WireError> {
        if self.count == 0 {
            return Ok(());
        }
        if self.data_ptr.is_null() {
            return Err(WireError::NullData { count: self.count });
        }
        let addr = self.data_ptr as usize;
        if addr % align_of::<FfiTile>() != 0 {
            return Err(WireError::Misaligned { addr });
        }
        match self.count.checked_mul(size_of::<FfiTile>()) {
            Some(bytes) if bytes <= isize::MAX as usize => Ok(()),
            _ => Err(WireError::CountOverflow { count: self.count }),
        }
    }

    /// Copy the records into `out`, replacing its contents.
    ///
    /// # Safety
    ///
    /// If the header passes [`FfiSlice::validate`], `data_ptr` must point to
    /// `count` initialized records that stay alive for the duration of the call.
    pub unsafe fn read_into(&self, out: &mut Vec<Tile>) -> Result<(), WireError> {
        out.clear();
        self.validate()?;
        if self.count == 0 {
            return Ok(());
        }

        let records = std::slice::from_raw_parts(self.data_ptr, self.count);
        out.reserve(records.len());
        for (index, record) in records.iter().enumerate() {
            match record.to_tile(index) {
                Ok(tile) => out.push(tile),
                Err(err) => {
                    out.clear();
                    return Err(err);
                }
            }
        }
        Ok(())
    }
}

impl Default for FfiSlice {
    fn default() -> Self {
        Self::EMPTY
    }
}

pub const FFI_TILE_SIZE: usize = size_of::<FfiTile>();
pub const FFI_CAMERA_SIZE: usize = size_of::<FfiCamera>();

const _: () = assert!(size_of::<FfiTile>() == 80);
const _: () = assert!(align_of::<FfiTile>() == 8);
const _: () = assert!(std::mem::offset_of!(FfiTile, visible_sections) == 16);
const _: () = assert!(size_of::<FfiCamera>() == 120);
const _: () = assert!(std::mem::offset_of!(FfiCamera, pos) == 96);

/// Parse a little-endian dump of tile records.
pub fn decode_tile_records(bytes: &[u8]) -> Result<Vec<Tile>, WireError> {
    if bytes.len() % FFI_TILE_SIZE != 0 {
        return Err(WireError::TrailingBytes {
            len: bytes.len(),
            trailing: bytes.len() % FFI_TILE_SIZE,
        });
    }

    bytes
        .chunks_exact(FFI_TILE_SIZE)
        .enumerate()
        .map(|(index, chunk)| {
            bytemuck::pod_read_unaligned::<FfiTile>(chunk)
                .swap_le()
                .to_tile(index)
        })
        .collect()
}

/// Serialize tiles as little-endian records.
pub fn encode_tile_records(tiles: &[Tile]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(tiles.len() * FFI_TILE_SIZE);
    for tile in tiles {
        bytes.extend_from_slice(bytemuck::bytes_of(&FfiTile::from(tile).swap_le()));
    }
    bytes
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    NullData { count: usize },
    Misaligned { addr: usize },
    CountOverflow { count: usize },
    TrailingBytes { len: usize, trailing: usize },
    /// X or Z of a tile origin is not a multiple of the tile size
    UnalignedOrigin { index: usize, origin: [i32; 3] },
    /// The tile would reach past `i32::MAX` on Y
    OriginOutOfRange { index: usize, origin: [i32; 3] },
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireError::NullData { count } => {
                write!(f, "null tile data with a count of {count}")
            }
            WireError::Misaligned { addr } => write!(
                f,
                "tile data at {addr:#x} is not aligned to {} bytes",
                align_of::<FfiTile>()
            ),
            WireError::CountOverflow { count } => {
                write!(f, "tile count {count} overflows the address space")
            }
            WireError::TrailingBytes { len, trailing } => write!(
                f,
                "{len} bytes is not a whole number of {FFI_TILE_SIZE}-byte tile records ({trailing} trailing)"
            ),
            WireError::UnalignedOrigin { index, origin } => write!(
                f,
                "tile {index} origin {origin:?} is not aligned to the tile grid on X/Z"
            ),
            WireError::OriginOutOfRange { index, origin } => write!(
                f,
                "tile {index} origin {origin:?} extends past the top of the section range"
            ),
        }
    }
}

impl std::error::Error for WireError {}
