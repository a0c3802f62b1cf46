pub mod reader;
pub mod writer;

use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::error::{DecimateError, Result};
use crate::types::PolyMesh;

pub use reader::parse_vtk;
pub use writer::encode_vtk;

/// Data encoding of a written VTK file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VtkEncoding {
    #[default]
    #[value(name = "ascii")]
    Ascii,
    #[value(name = "binary")]
    Binary,
}

impl VtkEncoding {
    fn header_keyword(self) -> &'static str {
        match self {
            VtkEncoding::Ascii => "ASCII",
            VtkEncoding::Binary => "BINARY",
        }
    }
}

impl std::fmt::Display for VtkEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VtkEncoding::Ascii => write!(f, "ascii"),
            VtkEncoding::Binary => write!(f, "binary"),
        }
    }
}

/// Read a legacy VTK polydata file.
pub fn read_mesh(path: &Path) -> Result<PolyMesh> {
    let data = fs::read(path)
        .map_err(|e| DecimateError::Input(format!("Failed to open {}: {e}", path.display())))?;

    let mesh = parse_vtk(&data).map_err(|e| match e {
        DecimateError::Parse(msg) => DecimateError::Parse(format!("{}: {msg}", path.display())),
        other => other,
    })?;

    debug!(
        path = %path.display(),
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        colors = mesh.has_colors(),
        "Read mesh"
    );
    Ok(mesh)
}

/// Write a mesh to `path`, replacing any existing file.
///
/// The data goes to a temporary file in the destination directory which is
/// then renamed over `path`, so readers never observe a partial file. The
/// destination directory must already exist.
pub fn write_mesh(mesh: &PolyMesh, path: &Path, encoding: VtkEncoding) -> Result<()> {
    mesh.validate().map_err(|e| {
        DecimateError::Output(format!("Refusing to write invalid mesh {}: {e}", path.display()))
    })?;

    let bytes = encode_vtk(mesh, encoding)?;
    write_atomic(path, &bytes)?;

    debug!(
        path = %path.display(),
        %encoding,
        bytes = bytes.len(),
        triangles = mesh.triangle_count(),
        "Wrote mesh"
    );
    Ok(())
}

/// Write `bytes` to a temporary file next to `path`, then rename it over
/// `path`. Readers see either the old file or the complete new one.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let output_err =
        |e: std::io::Error| DecimateError::Output(format!("Failed to write {}: {e}", path.display()));

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(output_err)?;
    tmp.write_all(bytes).map_err(output_err)?;
    tmp.as_file().sync_all().map_err(output_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o644)).map_err(output_err)?;
    }

    tmp.persist(path).map_err(|e| output_err(e.error))?;
    Ok(())
}
