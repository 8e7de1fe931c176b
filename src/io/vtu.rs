//! VTU (VTK Unstructured Grid) preview of the assembled mesh

use crate::contact::types::ContactFaceTag;
use crate::error::{Result, TetDeckError};
use crate::mesh::types::{GlobalMesh, TET10_NODES};
use std::path::Path;
use vtkio::model::*;

/// Default VTK file format version (2.2 for broad compatibility)
pub const DEFAULT_VTK_VERSION: (u8, u8) = (2, 2);

/// Number of tagged faces per element
fn faces_per_element(tags: &[ContactFaceTag], num_elements: usize) -> Vec<i32> {
    let mut counts = vec![0i32; num_elements];
    for tag in tags {
        if let Some(count) = tag.element_id.checked_sub(1).and_then(|i| counts.get_mut(i)) {
            *count += 1;
        }
    }
    counts
}

fn scalars(name: &str, data: IOBuffer) -> Attribute {
    Attribute::DataArray(DataArray {
        name: name.into(),
        elem: ElementType::Scalars {
            num_comp: 1,
            lookup_table: None,
        },
        data,
    })
}

/// Write the quadratic tetrahedral mesh with contact and ground markers
///
/// Cell data `master_faces` and `slave_faces` count each element's tagged
/// faces; point data `fixed` is 1 on ground nodes.
pub fn write_tet_mesh_vtu(
    mesh: &GlobalMesh,
    ground_nodes: &[usize],
    output_path: &Path,
    vtk_version: Option<(u8, u8)>,
) -> Result<()> {
    let version = vtk_version.unwrap_or(DEFAULT_VTK_VERSION);
    log::info!(
        "Writing mesh with {} elements to {:?} (VTK version {}.{})",
        mesh.num_elements(),
        output_path,
        version.0,
        version.1
    );

    let points: Vec<f64> = mesh
        .nodes
        .iter()
        .flat_map(|n| [n.position.x, n.position.y, n.position.z])
        .collect();

    // Node ids are 1-based and contiguous, VTK indices are 0-based
    let mut connectivity = Vec::with_capacity(mesh.num_elements() * TET10_NODES);
    for element in &mesh.elements {
        for id in element.node_ids {
            let index = id.checked_sub(1).filter(|&i| i < mesh.num_nodes()).ok_or_else(|| {
                TetDeckError::IndexResolution(format!(
                    "element {} references node {} outside the mesh",
                    element.id, id
                ))
            })?;
            connectivity.push(index as u64);
        }
    }

    // C3D10 and VTK_QUADRATIC_TETRA share the same node order
    let cells = Cells {
        cell_verts: VertexNumbers::XML {
            connectivity,
            offsets: (0..mesh.num_elements())
                .map(|i| ((i + 1) * TET10_NODES) as u64)
                .collect(),
        },
        types: vec![CellType::QuadraticTetra; mesh.num_elements()],
    };

    let mut ugrid = UnstructuredGridPiece {
        points: IOBuffer::F64(points),
        cells,
        data: Attributes::new(),
    };

    ugrid.data.cell.push(scalars(
        "master_faces",
        IOBuffer::I32(faces_per_element(&mesh.masters, mesh.num_elements())),
    ));
    ugrid.data.cell.push(scalars(
        "slave_faces",
        IOBuffer::I32(faces_per_element(&mesh.slaves, mesh.num_elements())),
    ));

    let mut fixed = vec![0i32; mesh.num_nodes()];
    for &id in ground_nodes {
        if let Some(flag) = id.checked_sub(1).and_then(|i| fixed.get_mut(i)) {
            *flag = 1;
        }
    }
    ugrid.data.point.push(scalars("fixed", IOBuffer::I32(fixed)));

    let vtk = Vtk {
        version: Version::new(version),
        title: "Quadratic tetrahedral mesh".to_string(),
        byte_order: ByteOrder::LittleEndian,
        data: DataSet::UnstructuredGrid {
            pieces: vec![Piece::Inline(Box::new(ugrid))],
            meta: None,
        },
        file_path: None,
    };

    vtk.export(output_path)
        .map_err(|e| TetDeckError::VtkError(format!("Failed to write VTU file: {}", e)))?;

    log::info!("Successfully wrote VTU file to {:?}", output_path);

    Ok(())
}
