/// Triangulated surface mesh as read from / written to a VTK polydata file.
///
/// Buffers are flat `Vec<f32>` / `Vec<u32>` so they can be handed to
/// meshoptimizer and glTF writers without conversion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolyMesh {
    /// Interleaved positions: [x, y, z, x, y, z, ...]
    pub positions: Vec<f32>,
    /// Triangle indices into the position buffer
    pub indices: Vec<u32>,
    /// Per-vertex RGB colors in [0, 255], one entry per vertex
    pub colors: Option<Vec<[u8; 3]>>,
}

impl PolyMesh {
    /// Number of vertices (positions / 3).
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of triangles (indices / 3).
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Whether a per-vertex color array is attached.
    pub fn has_colors(&self) -> bool {
        self.colors.is_some()
    }

    /// Whether the mesh contains no geometry.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Axis-aligned bounds as `(min, max)`, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        if self.is_empty() {
            return None;
        }
        let mut min = [f32::INFINITY; 3];
        let mut max = [f32::NEG_INFINITY; 3];
        for p in self.positions.chunks_exact(3) {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }
        Some((min, max))
    }

    /// Check the structural invariants: whole triangles, in-range indices
    /// and one color per vertex.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.positions.len() % 3 != 0 {
            return Err(format!(
                "position buffer length {} is not a multiple of 3",
                self.positions.len()
            ));
        }
        if self.indices.len() % 3 != 0 {
            return Err(format!(
                "index buffer length {} is not a multiple of 3",
                self.indices.len()
            ));
        }
        let vertex_count = self.vertex_count();
        if let Some(&bad) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(format!(
                "triangle index {bad} out of range for {vertex_count} vertices"
            ));
        }
        if let Some(colors) = &self.colors {
            if colors.len() != vertex_count {
                return Err(format!(
                    "color array has {} entries for {vertex_count} vertices",
                    colors.len()
                ));
            }
        }
        Ok(())
    }
}
