/// Decode a dump of culling engine tiles against a fully loaded region map
/// and report what a frame over that result would visit
///
/// Usage: tile_dump <tiles.bin> [config.toml]
use glam::IVec3;
use section_visibility::perf::PerfTimer;
use section_visibility::{
    decode_tile_records, CullingConfig, RegionMap, RegionStore, RenderSection, TileDecoder,
};
use std::collections::HashSet;
use std::error::Error;
use std::{env, fs, process};

const FRAME: u32 = 1;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <tiles.bin> [config.toml]", args[0]);
        process::exit(2);
    }

    if let Err(err) = run(&args[1], args.get(2).map(String::as_str)) {
        log::error!("{err}");
        process::exit(1);
    }
}

fn run(dump_path: &str, config_path: Option<&str>) -> Result<(), Box<dyn Error>> {
    let config = match config_path {
        Some(path) => CullingConfig::load(path)?,
        None => CullingConfig::default(),
    };
    let layout = config.region_layout()?;

    let bytes = fs::read(dump_path)?;
    let tiles = decode_tile_records(&bytes)?;
    log::info!(
        "Read {} tiles ({} bytes) from {}",
        tiles.len(),
        bytes.len(),
        dump_path
    );

    // Origins are on the tile grid and at most i32::MAX - 7 on Y after decoding.
    let mut map = RegionMap::new(layout);
    for tile in &tiles {
        map.insert_box(tile.origin, tile.origin + IVec3::splat(7));
    }
    log::info!(
        "Loaded {} sections in {} regions (region height {})",
        map.section_count(),
        map.region_count(),
        layout.height()
    );

    let mut regions_touched = HashSet::new();
    let stats = {
        let _timer = PerfTimer::new("decode");
        let decoder = TileDecoder::new(&map);
        decoder.decode_all(&tiles, FRAME, &mut |section: &RenderSection| {
            regions_touched.insert(map.layout().region_pos(section.position()));
        })
    };

    let visible_bits: u64 = tiles.iter().map(|tile| tile.visible_count() as u64).sum();
    log::info!("Visible bits:       {visible_bits}");
    log::info!("Sections visited:   {}", stats.sections_visited);
    log::info!("Regions touched:    {}", regions_touched.len());
    log::info!("Region splits:      {}", stats.region_splits);
    log::info!("Region lookups:     {}", stats.region_lookups);
    if stats.sections_visited != visible_bits {
        log::warn!(
            "{} visible bits did not map to a section",
            visible_bits - stats.sections_visited
        );
    }

    println!(
        "{} tiles, {} sections visited, {} regions touched",
        tiles.len(),
        stats.sections_visited,
        regions_touched.len()
    );

    #[cfg(feature = "profiling")]
    section_visibility::FUNCTION_COUNTERS.snapshot().log_report();

    Ok(())
}
