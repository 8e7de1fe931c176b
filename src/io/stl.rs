//! ASCII STL writer for the tetrahedralizer's input surface

use crate::error::Result;
use crate::io::scene::SurfaceObject;
use crate::mesh::geometry::triangle_normal;
use crate::mesh::types::Vec3;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write an object's triangles as an ASCII STL solid
pub fn write_ascii_stl<W: Write>(object: &SurfaceObject, out: &mut W) -> Result<()> {
    let name = solid_name(&object.name);
    writeln!(out, "solid {}", name)?;

    for &[a, b, c] in &object.triangles {
        let (pa, pb, pc) = (object.vertex(a)?, object.vertex(b)?, object.vertex(c)?);
        let normal = triangle_normal(&pa, &pb, &pc);
        let normal = if normal.norm() > 1e-12 {
            normal.normalize()
        } else {
            Vec3::zeros()
        };

        writeln!(out, "  facet normal {} {} {}", normal.x, normal.y, normal.z)?;
        writeln!(out, "    outer loop")?;
        for p in [pa, pb, pc] {
            writeln!(out, "      vertex {} {} {}", p.x, p.y, p.z)?;
        }
        writeln!(out, "    endloop")?;
        writeln!(out, "  endfacet")?;
    }

    writeln!(out, "endsolid {}", name)?;
    Ok(())
}

/// Write an object's surface to an ASCII STL file
pub fn write_ascii_stl_file(object: &SurfaceObject, path: &Path) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_ascii_stl(object, &mut out)?;
    out.flush()?;
    log::debug!(
        "Wrote {} triangles of '{}' to {:?}",
        object.triangles.len(),
        object.name,
        path
    );
    Ok(())
}

/// STL solid names end at the first whitespace
fn solid_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}
