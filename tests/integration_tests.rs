//! Integration tests for tetdeck
//!
//! These tests run the pipeline from tetrahedralizer tables to a written deck

use approx::assert_relative_eq;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tetdeck::config::{DeckConfig, Units};
use tetdeck::contact::{build_region, tag_object_faces, ContactFaceTag, MembershipPolicy, TaggedRegion};
use tetdeck::io::tetgen::{parse_element_table, parse_node_table};
use tetdeck::io::{read_deck_mesh, write_deck, write_deck_file, RunReport, Scene, SurfaceObject, TableFiles};
use tetdeck::mesh::reorder::{to_solver_order, to_tetgen_order};
use tetdeck::mesh::{detect_ground_nodes, FaceLabel, GlobalMesh, IndexAllocator, Node, Point};
use tetdeck::pipeline::build_deck;
use tetdeck::TetDeckError;

#[allow(dead_code)]
#[path = "../benches/synthetic_mesh.rs"]
mod synthetic_mesh;

const CORNERS: [[f64; 3]; 4] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
];

/// Mid-edge slots 5..10 of a tetrahedralizer element row
const TETGEN_EDGES: [(usize, usize); 6] = [(2, 3), (0, 3), (0, 1), (1, 2), (1, 3), (2, 0)];

/// Node and element table text of one quadratic tetrahedron
fn single_tet_tables(shift: [f64; 3]) -> (String, String) {
    let corners: Vec<[f64; 3]> = CORNERS
        .iter()
        .map(|c| [c[0] + shift[0], c[1] + shift[1], c[2] + shift[2]])
        .collect();
    let mut points = corners.clone();
    for (a, b) in TETGEN_EDGES {
        points.push([
            (corners[a][0] + corners[b][0]) / 2.0,
            (corners[a][1] + corners[b][1]) / 2.0,
            (corners[a][2] + corners[b][2]) / 2.0,
        ]);
    }

    let mut nodes = String::from("10  3  0  0\n");
    for (i, p) in points.iter().enumerate() {
        nodes.push_str(&format!("{}  {}  {}  {}\n", i + 1, p[0], p[1], p[2]));
    }
    nodes.push_str("# Generated by tetgen -qpgF -o2 part.stl\n");

    let elements = "1  10  0\n1  1  2  3  4  5  6  7  8  9  10\n# Generated by tetgen -qpgF -o2 part.stl\n"
        .to_string();

    (nodes, elements)
}

fn write_single_tet_tables(dir: &Path, stem: &str, shift: [f64; 3]) -> TableFiles {
    let (nodes, elements) = single_tet_tables(shift);
    std::fs::write(dir.join(format!("{}.1.node", stem)), nodes).unwrap();
    std::fs::write(dir.join(format!("{}.1.ele", stem)), elements).unwrap();

    // Relative to the scene file
    TableFiles {
        nodes: PathBuf::from(format!("{}.1.node", stem)),
        elements: PathBuf::from(format!("{}.1.ele", stem)),
    }
}

fn single_tet_object(name: &str, master: bool, shift: [f64; 3], tables: TableFiles) -> SurfaceObject {
    SurfaceObject {
        name: name.to_string(),
        master,
        vertices: CORNERS
            .iter()
            .map(|c| [c[0] + shift[0], c[1] + shift[1], c[2] + shift[2]])
            .collect(),
        triangles: vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]],
        tagged_vertices: vec![0, 1, 2, 3],
        tables: Some(tables),
    }
}

/// Object A (master) on the ground, object B (slave) one unit below it
fn write_two_tet_scene(dir: &Path) -> PathBuf {
    let below = [0.0, 0.0, -1.0];
    let scene = Scene {
        objects: vec![
            single_tet_object("A", true, [0.0; 3], write_single_tet_tables(dir, "a", [0.0; 3])),
            single_tet_object("B", false, below, write_single_tet_tables(dir, "b", below)),
        ],
    };
    let path = dir.join("scene.json");
    scene.to_file(&path).unwrap();
    path
}

#[test]
fn test_end_to_end_two_tetrahedra() {
    let dir = tempfile::tempdir().unwrap();
    let scene_path = write_two_tet_scene(dir.path());
    let scene = Scene::from_file(&scene_path).expect("scene should load");
    let config = DeckConfig::default();

    let assembled = build_deck(&scene, &config).expect("build should succeed");
    let mesh = &assembled.mesh;

    // Two quadratic tetrahedra: 8 corner nodes plus 12 mid-edge nodes
    assert_eq!(mesh.num_nodes(), 20);
    assert_eq!(mesh.num_elements(), 2);
    let ids: Vec<usize> = mesh.nodes.iter().map(|n| n.id).collect();
    assert_eq!(ids, (1..=20).collect::<Vec<_>>());
    assert_eq!(mesh.elements[0].id, 1);
    assert_eq!(mesh.elements[1].id, 2);

    let corners: HashSet<usize> = mesh
        .elements
        .iter()
        .flat_map(|e| e.corners())
        .collect();
    assert_eq!(corners, [1, 2, 3, 4, 11, 12, 13, 14].into_iter().collect());

    // Every face of A is on the master surface, every face of B on the slave
    let expected = |element_id| -> Vec<ContactFaceTag> {
        FaceLabel::ALL
            .iter()
            .map(|&face| ContactFaceTag::new(element_id, face))
            .collect()
    };
    assert_eq!(mesh.masters, expected(1));
    assert_eq!(mesh.slaves, expected(2));

    // Ground plane is z = 0: A's base and B's apex
    assert_eq!(assembled.ground_nodes, vec![1, 2, 3, 7, 8, 10, 14]);

    // Deck on disk
    let deck_path = dir.path().join("model.inp");
    write_deck_file(&deck_path, mesh, &assembled.ground_nodes, &config).unwrap();
    let text = std::fs::read_to_string(&deck_path).unwrap();

    assert!(text.contains("*SURFACE, NAME=Sslav\n2,S1\n2,S2\n2,S3\n2,S4\n"));
    assert!(text.contains("*SURFACE, NAME=Smast\n1,S1\n1,S2\n1,S3\n1,S4\n"));
    assert!(text.contains("*NSET, NSET=FIX\n1,\n2,\n3,\n7,\n8,\n10,\n14\n"));

    let deck = read_deck_mesh(&text).unwrap();
    assert_eq!(deck.nodes, mesh.nodes);
    assert_eq!(deck.elements, mesh.elements);
    assert_eq!(deck.fixed_nodes, assembled.ground_nodes);
    assert_eq!(deck.masters, mesh.masters);
    assert_eq!(deck.slaves, mesh.slaves);

    // Report
    let report_path = dir.path().join("report.json");
    RunReport::new(
        scene_path.display().to_string(),
        deck_path.display().to_string(),
        &config,
        assembled.objects.clone(),
        mesh,
        assembled.ground_nodes.len(),
    )
    .export(&report_path)
    .unwrap();
    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report["totals"]["master_faces"], 4);
    assert_eq!(report["objects"][1]["first_node_id"], 11);
}

#[test]
fn test_element_references_resolve() {
    let dir = tempfile::tempdir().unwrap();
    let scene = Scene::from_file(write_two_tet_scene(dir.path())).unwrap();
    let assembled = build_deck(&scene, &DeckConfig::default()).unwrap();
    let mesh = &assembled.mesh;

    for element in &mesh.elements {
        let distinct: HashSet<usize> = element.node_ids.iter().copied().collect();
        assert_eq!(distinct.len(), 10, "element {} repeats a node", element.id);
        for id in element.node_ids {
            assert!(mesh.node(id).is_some(), "element {} references missing node {}", element.id, id);
        }
    }

    for tag in mesh.masters.iter().chain(&mesh.slaves) {
        assert!(tag.element_id >= 1 && tag.element_id <= mesh.num_elements());
    }
}

#[test]
fn test_mid_edge_nodes_after_reordering() {
    let dir = tempfile::tempdir().unwrap();
    let scene = Scene::from_file(write_two_tet_scene(dir.path())).unwrap();
    let mesh = build_deck(&scene, &DeckConfig::default()).unwrap().mesh;

    // Solver order: corners, then edges (0,1) (1,2) (2,0) (0,3) (1,3) (2,3)
    let solver_edges = [(0, 1), (1, 2), (2, 0), (0, 3), (1, 3), (2, 3)];
    for element in &mesh.elements {
        let position = |slot: usize| mesh.node(element.node_ids[slot]).unwrap().position;
        for (k, (a, b)) in solver_edges.iter().enumerate() {
            let mid = Point::from((position(*a).coords + position(*b).coords) / 2.0);
            let node = position(4 + k);
            assert_relative_eq!(node.x, mid.x, epsilon = 1e-12);
            assert_relative_eq!(node.y, mid.y, epsilon = 1e-12);
            assert_relative_eq!(node.z, mid.z, epsilon = 1e-12);
        }
    }
}

#[test]
fn test_node_count_is_sum_of_objects() {
    let mut allocator = IndexAllocator::new();
    let mut mesh = GlobalMesh::new();
    let mut imported = 0;

    for (k, name) in ["A", "B", "C"].iter().enumerate() {
        let (node_text, element_text) = single_tet_tables([k as f64 * 3.0, 0.0, 0.0]);
        let raw = tetdeck::io::RawTetMesh {
            nodes: parse_node_table(&node_text, "nodes", 2).unwrap(),
            elements: parse_element_table(&element_text, "elements").unwrap(),
        };
        imported += raw.nodes.len();

        let object = allocator.assign(name, k == 0, &raw).unwrap();
        assert_eq!(allocator.node_offset(), imported);
        mesh.absorb(&object);
    }

    assert_eq!(mesh.num_nodes(), imported);
    for (k, node) in mesh.nodes.iter().enumerate() {
        assert_eq!(node.id, k + 1);
    }
    assert_eq!(mesh.elements[2].corners(), [21, 22, 23, 24]);
}

#[test]
fn test_reorder_round_trip() {
    let raw = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
    let solver = to_solver_order(&raw);

    assert_eq!(solver, [1, 2, 3, 4, 7, 8, 10, 6, 9, 5]);
    assert_eq!(to_tetgen_order(&solver), raw);
}

#[test]
fn test_ground_detection_is_exact() {
    let nodes = vec![
        Node::new(1, Point::new(0.3, 0.7, 0.0)),
        Node::new(2, Point::new(0.3, 0.7, 1e-9)),
        Node::new(3, Point::new(0.3, 0.7, -1e-9)),
        Node::new(4, Point::new(5.0, 5.0, 0.0)),
    ];
    assert_eq!(detect_ground_nodes(&nodes), vec![1, 4]);
}

#[test]
fn test_tagging_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let scene = Scene::from_file(write_two_tet_scene(dir.path())).unwrap();

    for policy in [MembershipPolicy::VertexSet, MembershipPolicy::TriangleContainment] {
        let mut config = DeckConfig::default();
        config.tagging.policy = policy;

        let first = build_deck(&scene, &config).unwrap().mesh;
        let second = build_deck(&scene, &config).unwrap().mesh;
        assert_eq!(first.masters, second.masters);
        assert_eq!(first.slaves, second.slaves);
    }
}

#[test]
fn test_triangle_containment_first_match() {
    let dir = tempfile::tempdir().unwrap();
    let scene = Scene::from_file(write_two_tet_scene(dir.path())).unwrap();

    let mut config = DeckConfig::default();
    config.tagging.policy = MembershipPolicy::TriangleContainment;
    let mesh = build_deck(&scene, &config).unwrap().mesh;
    assert_eq!(mesh.masters, vec![ContactFaceTag::new(1, FaceLabel::S1)]);
    assert_eq!(mesh.slaves, vec![ContactFaceTag::new(2, FaceLabel::S1)]);

    config.tagging.first_match_only = Some(false);
    let mesh = build_deck(&scene, &config).unwrap().mesh;
    assert_eq!(mesh.masters.len(), 4);
}

#[test]
fn test_deck_round_trip_two_tetrahedra() {
    let dir = tempfile::tempdir().unwrap();
    let scene = Scene::from_file(write_two_tet_scene(dir.path())).unwrap();
    let assembled = build_deck(&scene, &DeckConfig::default()).unwrap();

    let mut buffer = Vec::new();
    write_deck(&mut buffer, &assembled.mesh, &assembled.ground_nodes, &DeckConfig::default()).unwrap();
    let deck = read_deck_mesh(&String::from_utf8(buffer).unwrap()).unwrap();

    assert_eq!(deck.nodes.len(), 20);
    for (read, built) in deck.nodes.iter().zip(&assembled.mesh.nodes) {
        assert_eq!(read.id, built.id);
        assert_eq!(read.position, built.position);
    }
    let tuples: Vec<[usize; 10]> = deck.elements.iter().map(|e| e.node_ids).collect();
    let expected: Vec<[usize; 10]> = assembled.mesh.elements.iter().map(|e| e.node_ids).collect();
    assert_eq!(tuples, expected);
}

#[test]
fn test_millimeter_deck() {
    let dir = tempfile::tempdir().unwrap();
    let scene = Scene::from_file(write_two_tet_scene(dir.path())).unwrap();
    let mut config = DeckConfig::default();
    config.units = Units::Millimeters;

    let assembled = build_deck(&scene, &config).unwrap();
    // Ground detection runs before scaling
    assert_eq!(assembled.ground_nodes.len(), 7);

    let mut buffer = Vec::new();
    write_deck(&mut buffer, &assembled.mesh, &assembled.ground_nodes, &config).unwrap();
    let deck = read_deck_mesh(&String::from_utf8(buffer).unwrap()).unwrap();
    assert_relative_eq!(deck.nodes[1].position.x, 1000.0);
    assert_relative_eq!(deck.nodes[10].position.z, -1000.0);
}

#[test]
fn test_malformed_table_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    let scene_path = write_two_tet_scene(dir.path());
    std::fs::write(
        dir.path().join("b.1.ele"),
        "1  10  0\n1  1  2  3  x  5  6  7  8  9  10\n# trailer\n",
    )
    .unwrap();

    let scene = Scene::from_file(&scene_path).unwrap();
    match build_deck(&scene, &DeckConfig::default()) {
        Err(TetDeckError::ObjectImport { object, source }) => {
            assert_eq!(object, "B");
            match *source {
                TetDeckError::Parse { line, .. } => assert_eq!(line, 2),
                other => panic!("expected a parse error, got {:?}", other),
            }
        }
        other => panic!("expected an import failure, got {:?}", other.map(|d| d.mesh.num_nodes())),
    }
}

#[test]
fn test_failed_build_leaves_existing_deck() {
    let dir = tempfile::tempdir().unwrap();
    let deck_path = dir.path().join("model.inp");
    std::fs::write(&deck_path, "previous deck").unwrap();

    // An element pointing past its object's nodes never reaches the writer
    let scene_path = write_two_tet_scene(dir.path());
    std::fs::write(
        dir.path().join("a.1.ele"),
        "1  10  0\n1  1  2  3  4  5  6  7  8  9  11\n# trailer\n",
    )
    .unwrap();
    let scene = Scene::from_file(&scene_path).unwrap();

    let result = build_deck(&scene, &DeckConfig::default());
    assert!(matches!(result, Err(TetDeckError::IndexResolution(_))));
    assert_eq!(std::fs::read_to_string(&deck_path).unwrap(), "previous deck");
}

#[test]
fn test_large_object_tagging_keeps_element_order() {
    // 6 * 10^3 elements, above the size where tagging goes parallel
    let raw = synthetic_mesh::generate_tet10_grid(10, 10, 10, 1.0);
    let object = IndexAllocator::new().assign("grid", true, &raw).unwrap();
    assert_eq!(object.elements.len(), 6000);
    let surface = synthetic_mesh::generate_bottom_surface(10, 10, 1.0);

    for policy in [MembershipPolicy::VertexSet, MembershipPolicy::TriangleContainment] {
        let region = build_region(policy, &surface, 2).unwrap();

        for first_match_only in [false, true] {
            let tags = tag_object_faces(&object, region.as_ref(), first_match_only).unwrap();

            let mut expected = Vec::new();
            for element in &object.elements {
                for label in FaceLabel::ALL {
                    let on_surface = element
                        .face(label)
                        .iter()
                        .all(|&id| region.contains(&object.nodes[id - 1].position));
                    if on_surface {
                        expected.push(ContactFaceTag::new(element.id, label));
                        if first_match_only {
                            break;
                        }
                    }
                }
            }

            // Two bottom triangles per grid cell
            assert_eq!(expected.len(), 200, "{} {}", policy, first_match_only);
            assert_eq!(tags, expected, "{} {}", policy, first_match_only);
        }
    }
}
