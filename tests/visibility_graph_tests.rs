use glam::{IVec3, Mat4, UVec3, Vec3};
use std::collections::HashMap;
/// Integration tests for per-frame visibility queries
/// A scripted engine stands in for the native culling library
use section_visibility::*;

/// Keeps its own copy of the section graph and answers every search with a
/// fixed tile list.
#[derive(Default)]
struct ScriptedEngine {
    sections: HashMap<IVec3, u64>,
    set_calls: usize,
    last_request: Option<SearchRequest>,
    result: Vec<Tile>,
}

impl CullingEngine for ScriptedEngine {
    fn set_section(&mut self, pos: IVec3, visibility: u64) {
        self.set_calls += 1;
        if visibility == 0 {
            self.sections.remove(&pos);
        } else {
            self.sections.insert(pos, visibility);
        }
    }

    fn search(&mut self, request: &SearchRequest) -> Result<&[Tile], EngineError> {
        self.last_request = Some(*request);
        Ok(&self.result)
    }
}

fn camera_frustum() -> Frustum {
    let view = Mat4::look_at_rh(Vec3::new(0.0, 64.0, 0.0), Vec3::new(0.0, 64.0, -1.0), Vec3::Y);
    let projection = Mat4::perspective_rh(70.0f32.to_radians(), 16.0 / 9.0, 0.05, 512.0);
    Frustum::from_view_projection(&(projection * view))
}

#[test]
fn camera_record_uses_axis_plane_order() {
    let frustum = camera_frustum();
    let mut graph = VisibilityGraph::new(ScriptedEngine::default());
    let map = RegionMap::new(RegionLayout::default());

    graph
        .find_visible(
            &map,
            &mut |_: &RenderSection| {},
            &frustum,
            &CameraTransform::new(0.5, 64.0, 0.5),
            SearchOptions::default(),
            1,
        )
        .unwrap();

    let camera = graph.engine().unwrap().last_request.unwrap().camera;
    for (i, plane) in frustum.planes.iter().enumerate() {
        assert_eq!(camera.frustum_planes[i], plane.to_array());
    }
    // -X plane faces +X, +X plane faces -X
    assert!(camera.frustum_planes[0][0] > 0.0);
    assert!(camera.frustum_planes[3][0] < 0.0);
    assert_eq!(camera.pos, [0.5, 64.0, 0.5]);
}

#[test]
fn repeated_updates_reach_the_engine_once() {
    let mut graph = VisibilityGraph::new(ScriptedEngine::default());
    let updates = [
        (IVec3::new(0, 0, 0), 0x3F),
        (IVec3::new(0, 0, 0), 0x3F),
        (IVec3::new(1, 0, 0), 0x01),
        (IVec3::new(0, 0, 0), 0x3F),
        (IVec3::new(1, 0, 0), 0x00),
        (IVec3::new(1, 0, 0), 0x00),
        (IVec3::new(0, 0, 0), 0x3E),
    ];

    let forwarded = updates
        .iter()
        .filter(|&&(pos, visibility)| graph.set_section(pos, visibility))
        .count();

    let engine = graph.engine().unwrap();
    assert_eq!(forwarded, 4);
    assert_eq!(engine.set_calls, 4);
    assert_eq!(engine.sections.get(&IVec3::ZERO), Some(&0x3E));
    assert!(!engine.sections.contains_key(&IVec3::new(1, 0, 0)));
    assert_eq!(graph.tracked_sections(), 1);
}

#[test]
fn frames_mark_only_their_own_sections() {
    let mut map = RegionMap::new(RegionLayout::new(3).unwrap());
    map.insert_box(IVec3::new(0, -4, 0), IVec3::new(15, 11, 7));

    let mut first = Tile::empty(IVec3::new(0, -4, 0));
    first.set_visible(UVec3::new(0, 0, 0));
    first.set_visible(UVec3::new(7, 7, 7));
    let mut second = Tile::empty(IVec3::new(8, 4, 0));
    second.set_visible(UVec3::new(3, 3, 3));

    let engine = ScriptedEngine {
        result: vec![first, second],
        ..Default::default()
    };
    let mut graph = VisibilityGraph::new(engine);

    let stats = graph
        .find_visible(
            &map,
            &mut |_: &RenderSection| {},
            &camera_frustum(),
            &CameraTransform::default(),
            SearchOptions::default(),
            10,
        )
        .unwrap();

    assert_eq!(stats.tiles, 2);
    assert_eq!(stats.decode.sections_visited, 3);

    let mut visible: Vec<IVec3> = map.visible_sections(10).map(RenderSection::position).collect();
    visible.sort_by_key(|p| (p.x, p.y, p.z));
    assert_eq!(
        visible,
        vec![IVec3::new(0, -4, 0), IVec3::new(7, 3, 7), IVec3::new(11, 7, 3)]
    );
    assert_eq!(map.visible_sections(9).count(), 0);
}

#[test]
fn failed_engine_creation_yields_unsupported_graph() {
    let _ = env_logger::builder().is_test(true).try_init();

    let failed: Result<ScriptedEngine, EngineError> =
        Err(EngineError::GraphCreationFailed(GraphParams::default()));
    let mut graph = VisibilityGraph::from_engine(failed);

    assert!(!graph.is_supported());
    assert!(!graph.set_section(IVec3::ONE, 0xFF));

    let mut map = RegionMap::new(RegionLayout::default());
    map.insert_section(IVec3::ZERO);
    let stats = graph
        .find_visible(
            &map,
            &mut |_: &RenderSection| panic!("unsupported graph visited a section"),
            &camera_frustum(),
            &CameraTransform::default(),
            SearchOptions::default(),
            1,
        )
        .unwrap();
    assert_eq!(stats.decode, DecodeStats::default());
}

#[test]
fn boxed_engines_can_be_swapped_at_runtime() {
    let mut tile = Tile::empty(IVec3::ZERO);
    tile.set_visible(UVec3::ZERO);
    let engine: Box<dyn CullingEngine> = Box::new(ScriptedEngine {
        result: vec![tile],
        ..Default::default()
    });
    let mut graph = VisibilityGraph::new(engine);

    let mut map = RegionMap::new(RegionLayout::default());
    map.insert_section(IVec3::ZERO);

    let mut visits = 0;
    graph
        .find_visible(
            &map,
            &mut |_: &RenderSection| visits += 1,
            &camera_frustum(),
            &CameraTransform::default(),
            SearchOptions::default(),
            1,
        )
        .unwrap();
    assert_eq!(visits, 1);
}
