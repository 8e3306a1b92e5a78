use glam::{IVec3, UVec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
/// Integration tests for tile decoding
/// These tests check that every visible bit lands on the right section for
/// any tile alignment and region height
use section_visibility::*;

fn random_tile(rng: &mut ChaCha8Rng, origin: IVec3, density: f64) -> Tile {
    let mut tile = Tile::empty(origin);
    for y in 0..8 {
        for z in 0..8 {
            for x in 0..8 {
                if rng.gen_bool(density) {
                    tile.set_visible(UVec3::new(x, y, z));
                }
            }
        }
    }
    tile
}

fn loaded_around(layout: RegionLayout, tile: &Tile) -> RegionMap {
    let mut map = RegionMap::new(layout);
    map.insert_box(tile.origin, tile.origin + IVec3::splat(7));
    map
}

fn decode_positions(map: &RegionMap, tile: &Tile, frame: u32) -> (Vec<IVec3>, DecodeStats) {
    let mut visited = Vec::new();
    let stats = TileDecoder::new(map).decode(tile, frame, &mut |section: &RenderSection| {
        visited.push(section.position())
    });
    (visited, stats)
}

#[test]
fn decoded_sections_match_set_bits_for_all_alignments() {
    let mut rng = ChaCha8Rng::seed_from_u64(0xDEC0DE);

    for shift in 0..=5 {
        let layout = RegionLayout::new(shift).unwrap();
        for _ in 0..40 {
            let origin = IVec3::new(
                rng.gen_range(-8..8) * 8,
                rng.gen_range(-70..70),
                rng.gen_range(-8..8) * 8,
            );
            let tile = random_tile(&mut rng, origin, 0.3);
            let map = loaded_around(layout, &tile);

            let (visited, stats) = decode_positions(&map, &tile, 5);

            let expected: HashSet<IVec3> = tile.visible_positions().collect();
            let unique: HashSet<IVec3> = visited.iter().copied().collect();
            assert_eq!(visited.len(), unique.len(), "duplicate visit, shift {shift}");
            assert_eq!(unique, expected, "origin {origin}, shift {shift}");
            assert_eq!(stats.sections_visited, tile.visible_count() as u64);
            assert_eq!(stats.regions_missing, 0);
            assert_eq!(stats.sections_missing, 0);
            assert_eq!(map.visible_sections(5).count(), expected.len());
        }
    }
}

#[test]
fn single_bit_round_trips_to_world_position() {
    let origin = IVec3::new(-16, 3, 40);
    let layout = RegionLayout::default();

    for y in 0..8u32 {
        for z in [0u32, 5, 7] {
            for x in [0u32, 2, 7] {
                let mut tile = Tile::empty(origin);
                tile.set_visible(UVec3::new(x, y, z));
                let map = loaded_around(layout, &tile);

                let (visited, _) = decode_positions(&map, &tile, 1);
                assert_eq!(
                    visited,
                    vec![origin + IVec3::new(x as i32, y as i32, z as i32)]
                );
            }
        }
    }
}

#[test]
fn tile_aligned_to_world_bottom_spans_region_boundaries() {
    // World bottom at section -3: tiles start at -3, 5, 13, ...
    let section = IVec3::new(9, 6, -1);
    let origin = Tile::origin_of(section, -3);
    assert_eq!(origin, IVec3::new(8, 5, -8));

    let mut tile = Tile::empty(origin);
    tile.set_visible(UVec3::new(1, 1, 7));
    let map = loaded_around(RegionLayout::default(), &tile);

    let (visited, stats) = decode_positions(&map, &tile, 2);
    assert_eq!(visited, vec![section]);
    // [5, 8), [8, 12), [12, 13)
    assert_eq!(stats.region_splits, 3);
    assert_eq!(stats.region_lookups, 1);
}

#[test]
fn empty_tiles_never_touch_the_store() {
    let tile = Tile::empty(IVec3::new(0, 2, 0));
    let map = loaded_around(RegionLayout::default(), &Tile::full(tile.origin));

    let (visited, stats) = decode_positions(&map, &tile, 1);
    assert!(visited.is_empty());
    assert_eq!(stats.region_lookups, 0);
    assert_eq!(stats.section_lookups, 0);
}

#[test]
fn partially_loaded_world_skips_missing_sections() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let tile = Tile::full(IVec3::new(0, -2, 0));

    let mut map = RegionMap::new(RegionLayout::default());
    let mut loaded = HashSet::new();
    for position in tile.visible_positions() {
        if rng.gen_bool(0.5) {
            map.insert_section(position);
            loaded.insert(position);
        }
    }

    let (visited, stats) = decode_positions(&map, &tile, 3);
    let visited: HashSet<IVec3> = visited.into_iter().collect();

    assert_eq!(visited, loaded);
    assert_eq!(
        stats.sections_visited + stats.sections_missing,
        stats.section_lookups
    );
}

#[test]
fn tiles_are_decoded_in_order_without_dedup() {
    let origin = IVec3::new(8, 0, 8);
    let mut tile = Tile::empty(origin);
    tile.set_visible(UVec3::new(0, 0, 0));
    let map = loaded_around(RegionLayout::default(), &tile);

    let mut visited = Vec::new();
    let stats = TileDecoder::new(&map).decode_all(&[tile, tile], 4, &mut |s: &RenderSection| {
        visited.push(s.position())
    });

    assert_eq!(visited, vec![origin, origin]);
    assert_eq!(stats.tiles, 2);
}

#[test]
fn tiles_at_the_top_of_the_section_range_decode_without_overflow() {
    let origin = IVec3::new(0, i32::MAX - 3, 0);
    let mut tile = Tile::empty(origin);
    tile.set_visible(UVec3::new(4, 0, 4));
    tile.set_visible(UVec3::new(4, 7, 4));

    for shift in 0..=5 {
        let mut map = RegionMap::new(RegionLayout::new(shift).unwrap());
        map.insert_box(IVec3::new(0, i32::MAX - 3, 0), IVec3::new(7, i32::MAX, 7));

        let (visited, stats) = decode_positions(&map, &tile, 1);
        assert_eq!(visited, vec![IVec3::new(4, i32::MAX - 3, 4)], "shift {shift}");
        assert_eq!(stats.levels_clipped, 5);
    }
}
