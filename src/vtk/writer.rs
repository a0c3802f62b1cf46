use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};

use super::VtkEncoding;
use super::reader::COLORS_ARRAY;
use crate::error::Result;
use crate::types::PolyMesh;

/// Values per line in ASCII data blocks.
const VALUES_PER_LINE: usize = 9;

/// Serialize a mesh as legacy VTK polydata (triangles only).
///
/// Layout: `POINTS n float`, `POLYGONS t 4t`, and when colors are present
/// `POINT_DATA n` followed by `COLOR_SCALARS Colors 3`.
pub fn encode_vtk(mesh: &PolyMesh, encoding: VtkEncoding) -> Result<Vec<u8>> {
    let mut out: Vec<u8> = Vec::with_capacity(64 + mesh.positions.len() * 12);
    let vertex_count = mesh.vertex_count();
    let triangle_count = mesh.triangle_count();

    writeln!(out, "# vtk DataFile Version 3.0")?;
    writeln!(out, "vtk output")?;
    writeln!(out, "{}", encoding.header_keyword())?;
    writeln!(out, "DATASET POLYDATA")?;

    writeln!(out, "POINTS {vertex_count} float")?;
    match encoding {
        VtkEncoding::Ascii => {
            for line in mesh.positions.chunks(VALUES_PER_LINE) {
                write_ascii_line(&mut out, line)?;
            }
        }
        VtkEncoding::Binary => {
            for &v in &mesh.positions {
                out.write_f32::<BigEndian>(v)?;
            }
            out.push(b'\n');
        }
    }

    writeln!(out, "POLYGONS {triangle_count} {}", triangle_count * 4)?;
    match encoding {
        VtkEncoding::Ascii => {
            for tri in mesh.indices.chunks_exact(3) {
                writeln!(out, "3 {} {} {}", tri[0], tri[1], tri[2])?;
            }
        }
        VtkEncoding::Binary => {
            for tri in mesh.indices.chunks_exact(3) {
                out.write_i32::<BigEndian>(3)?;
                for &i in tri {
                    out.write_i32::<BigEndian>(i as i32)?;
                }
            }
            out.push(b'\n');
        }
    }

    if let Some(colors) = &mesh.colors {
        writeln!(out, "POINT_DATA {vertex_count}")?;
        writeln!(out, "COLOR_SCALARS {COLORS_ARRAY} 3")?;
        match encoding {
            VtkEncoding::Ascii => {
                // ASCII color scalars are normalized floats.
                for rgb in colors {
                    writeln!(
                        out,
                        "{} {} {}",
                        rgb[0] as f64 / 255.0,
                        rgb[1] as f64 / 255.0,
                        rgb[2] as f64 / 255.0
                    )?;
                }
            }
            VtkEncoding::Binary => {
                out.extend(colors.iter().flatten());
                out.push(b'\n');
            }
        }
    }

    Ok(out)
}

fn write_ascii_line(out: &mut Vec<u8>, values: &[f32]) -> Result<()> {
    let mut first = true;
    for v in values {
        if !first {
            out.push(b' ');
        }
        write!(out, "{v}")?;
        first = false;
    }
    out.push(b'\n');
    Ok(())
}
