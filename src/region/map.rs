/// In-memory region store keyed by packed region coordinates
/// Regions are created when their first section is inserted and dropped when
/// their last section is removed
use super::{region_key, LocalSectionIndex, Region, RegionLayout, RegionStore, Section};
use glam::IVec3;
use std::cell::Cell;
use std::collections::HashMap;

/// A loaded section and the last frame it was found visible in.
#[derive(Debug)]
pub struct RenderSection {
    position: IVec3,
    last_visible_frame: Cell<Option<u32>>,
}

impl RenderSection {
    pub fn new(position: IVec3) -> Self {
        Self {
            position,
            last_visible_frame: Cell::new(None),
        }
    }

    /// World section coordinates
    #[inline]
    pub fn position(&self) -> IVec3 {
        self.position
    }

    #[inline]
    pub fn last_visible_frame(&self) -> Option<u32> {
        self.last_visible_frame.get()
    }

    #[inline]
    pub fn is_visible_in(&self, frame: u32) -> bool {
        self.last_visible_frame.get() == Some(frame)
    }
}

impl Section for RenderSection {
    #[inline]
    fn set_last_visible_frame(&self, frame: u32) {
        self.last_visible_frame.set(Some(frame));
    }
}

/// Fixed slot array of sections, indexed by local section index.
pub struct RenderRegion {
    position: IVec3,
    layout: RegionLayout,
    sections: Box<[Option<RenderSection>]>,
    section_count: usize,
}

impl RenderRegion {
    pub fn new(position: IVec3, layout: RegionLayout) -> Self {
        Self {
            position,
            layout,
            sections: (0..layout.section_count()).map(|_| None).collect(),
            section_count: 0,
        }
    }

    /// Region coordinates
    #[inline]
    pub fn position(&self) -> IVec3 {
        self.position
    }

    /// Section coordinates of the region's minimum corner
    #[inline]
    pub fn origin(&self) -> IVec3 {
        self.layout.region_origin(self.position)
    }

    #[inline]
    pub fn section_count(&self) -> usize {
        self.section_count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.section_count == 0
    }

    /// Returns false if a section was already loaded at that index.
    fn insert(&mut self, index: LocalSectionIndex, position: IVec3) -> bool {
        let slot = &mut self.sections[index.to_usize()];
        if slot.is_some() {
            return false;
        }
        *slot = Some(RenderSection::new(position));
        self.section_count += 1;
        true
    }

    fn remove(&mut self, index: LocalSectionIndex) -> Option<RenderSection> {
        let removed = self.sections[index.to_usize()].take();
        if removed.is_some() {
            self.section_count -= 1;
        }
        removed
    }

    pub fn sections(&self) -> impl Iterator<Item = &RenderSection> {
        self.sections.iter().flatten()
    }
}

impl Region for RenderRegion {
    type Section = RenderSection;

    #[inline]
    fn pack_local_index(&self, x: u32, y: u32, z: u32) -> LocalSectionIndex {
        self.layout.pack_local_index(x, y, z)
    }

    #[inline]
    fn section(&self, index: LocalSectionIndex) -> Option<&RenderSection> {
        self.sections.get(index.to_usize())?.as_ref()
    }
}

/// Loaded regions, indexed by packed region key
pub struct RegionMap {
    layout: RegionLayout,
    regions: HashMap<u64, RenderRegion>,
}

impl RegionMap {
    pub fn new(layout: RegionLayout) -> Self {
        Self {
            layout,
            regions: HashMap::new(),
        }
    }

    /// Load a section, creating its region if needed.
    /// Returns false if the section was already loaded.
    pub fn insert_section(&mut self, position: IVec3) -> bool {
        let layout = self.layout;
        let region_pos = layout.region_pos(position);
        self.regions
            .entry(region_key(region_pos.x, region_pos.y, region_pos.z))
            .or_insert_with(|| RenderRegion::new(region_pos, layout))
            .insert(layout.local_index_of(position), position)
    }

    /// Unload a section, dropping its region once empty.
    pub fn remove_section(&mut self, position: IVec3) -> Option<RenderSection> {
        let region_pos = self.layout.region_pos(position);
        let key = region_key(region_pos.x, region_pos.y, region_pos.z);

        let region = self.regions.get_mut(&key)?;
        let removed = region.remove(self.layout.local_index_of(position));
        if region.is_empty() {
            self.regions.remove(&key);
        }
        removed
    }

    /// Load every section in the inclusive box `[min, max]`.
    pub fn insert_box(&mut self, min: IVec3, max: IVec3) -> usize {
        let mut inserted = 0;
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                for z in min.z..=max.z {
                    if self.insert_section(IVec3::new(x, y, z)) {
                        inserted += 1;
                    }
                }
            }
        }
        inserted
    }

    pub fn get_section(&self, position: IVec3) -> Option<&RenderSection> {
        self.region(self.layout.region_pos(position))?
            .section(self.layout.local_index_of(position))
    }

    #[inline]
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn section_count(&self) -> usize {
        self.regions.values().map(RenderRegion::section_count).sum()
    }

    pub fn regions(&self) -> impl Iterator<Item = &RenderRegion> {
        self.regions.values()
    }

    /// Sections whose last visible frame is `frame`
    pub fn visible_sections(&self, frame: u32) -> impl Iterator<Item = &RenderSection> {
        self.regions
            .values()
            .flat_map(|region| region.sections())
            .filter(move |section| section.is_visible_in(frame))
    }

    /// Clear all regions
    pub fn clear(&mut self) {
        self.regions.clear();
    }
}

impl RegionStore for RegionMap {
    type Region = RenderRegion;

    #[inline]
    fn layout(&self) -> RegionLayout {
        self.layout
    }

    #[inline]
    fn region(&self, region_pos: IVec3) -> Option<&RenderRegion> {
        self.regions
            .get(&region_key(region_pos.x, region_pos.y, region_pos.z))
    }
}
