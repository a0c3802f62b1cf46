use meshopt::{SimplifyOptions, VertexDataAdapter};
use tracing::debug;

use super::{MeshSimplifier, SimplifiedMesh, validate_reduction};
use crate::error::{DecimateError, Result};
use crate::types::PolyMesh;

/// meshoptimizer-backed simplifier.
///
/// Runs an edge-collapse pass with no border lock first. If that stalls
/// above the target, a clustering pass that ignores topology finishes the
/// job, which may split or merge connected components.
#[derive(Debug, Clone, Copy)]
pub struct MeshoptSimplifier {
    /// Error limit relative to the mesh extent; 1.0 effectively disables it.
    pub max_error: f32,
    /// Allow the topology-agnostic pass when edge collapse stalls.
    pub sloppy_fallback: bool,
}

impl Default for MeshoptSimplifier {
    fn default() -> Self {
        Self {
            max_error: 1.0,
            sloppy_fallback: true,
        }
    }
}

/// Index count to aim for when removing `reduction` of `triangle_count` triangles.
pub fn target_index_count(triangle_count: usize, reduction: f32) -> usize {
    let keep = ((1.0 - reduction as f64) * triangle_count as f64).round() as usize;
    keep.min(triangle_count) * 3
}

impl MeshSimplifier for MeshoptSimplifier {
    fn simplify(&self, mesh: &PolyMesh, reduction: f32) -> Result<SimplifiedMesh> {
        validate_reduction(reduction)?;

        if reduction == 0.0 || mesh.triangle_count() == 0 {
            return Ok(SimplifiedMesh {
                mesh: mesh.clone(),
                achieved_error: 0.0,
                used_fallback: false,
            });
        }

        let positions_bytes = meshopt::typed_to_bytes(&mesh.positions);
        let adapter = VertexDataAdapter::new(positions_bytes, 12, 0)
            .map_err(|e| DecimateError::Simplify(format!("invalid vertex buffer: {e:?}")))?;

        let target_count = target_index_count(mesh.triangle_count(), reduction);

        let mut achieved_error: f32 = 0.0;
        let mut indices = meshopt::simplify(
            &mesh.indices,
            &adapter,
            target_count,
            self.max_error,
            SimplifyOptions::None,
            Some(&mut achieved_error),
        );

        let mut used_fallback = false;
        if indices.len() > target_count && self.sloppy_fallback {
            let mut sloppy_error: f32 = 0.0;
            let sloppy = meshopt::simplify_sloppy(
                &indices,
                &adapter,
                target_count,
                self.max_error,
                Some(&mut sloppy_error),
            );
            debug!(
                collapsed = indices.len() / 3,
                sloppy = sloppy.len() / 3,
                target = target_count / 3,
                "Edge collapse stalled, ran clustering pass"
            );
            if sloppy.len() < indices.len() {
                indices = sloppy;
                achieved_error = achieved_error.max(sloppy_error);
                used_fallback = true;
            }
        }

        if indices.len() > mesh.indices.len() {
            indices = mesh.indices.clone();
        }

        Ok(SimplifiedMesh {
            mesh: compact_mesh(indices, mesh),
            achieved_error,
            used_fallback,
        })
    }

    fn name(&self) -> &'static str {
        "meshopt"
    }
}

/// Remap indices to remove unreferenced vertices and rebuild attribute arrays.
///
/// Scans the index buffer to find referenced vertices, builds a compact remap,
/// then rebuilds positions and colors with only referenced vertices.
pub fn compact_mesh(indices: Vec<u32>, source: &PolyMesh) -> PolyMesh {
    if indices.is_empty() {
        return PolyMesh {
            colors: source.colors.as_ref().map(|_| Vec::new()),
            ..Default::default()
        };
    }

    // old_index -> new_index (u32::MAX if unreferenced)
    let mut remap = vec![u32::MAX; source.vertex_count()];
    let mut next_vertex: u32 = 0;
    for &idx in &indices {
        let i = idx as usize;
        if remap[i] == u32::MAX {
            remap[i] = next_vertex;
            next_vertex += 1;
        }
    }
    let new_vertex_count = next_vertex as usize;

    let new_indices: Vec<u32> = indices.iter().map(|&i| remap[i as usize]).collect();

    let mut new_positions = vec![0.0f32; new_vertex_count * 3];
    let mut new_colors = source
        .colors
        .as_ref()
        .map(|_| vec![[0u8; 3]; new_vertex_count]);

    for (old_idx, &new_idx) in remap.iter().enumerate() {
        if new_idx == u32::MAX {
            continue;
        }
        let ni = new_idx as usize;
        new_positions[ni * 3..ni * 3 + 3].copy_from_slice(&source.positions[old_idx * 3..old_idx * 3 + 3]);

        if let (Some(dst), Some(src)) = (new_colors.as_mut(), source.colors.as_ref()) {
            dst[ni] = src[old_idx];
        }
    }

    PolyMesh {
        positions: new_positions,
        indices: new_indices,
        colors: new_colors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `n x n` quads (2 triangles each) over a gently curved surface.
    fn make_surface(n: usize, with_colors: bool) -> PolyMesh {
        let verts_per_side = n + 1;
        let vertex_count = verts_per_side * verts_per_side;
        let mut positions = Vec::with_capacity(vertex_count * 3);
        let mut colors = Vec::with_capacity(vertex_count);

        for y in 0..verts_per_side {
            for x in 0..verts_per_side {
                let fx = x as f32 / n as f32;
                let fy = y as f32 / n as f32;
                let fz = 0.1 * (fx * std::f32::consts::PI).sin() * (fy * std::f32::consts::PI).sin();
                positions.extend_from_slice(&[fx, fy, fz]);
                colors.push([(fx * 255.0) as u8, (fy * 255.0) as u8, 40]);
            }
        }

        let mut indices = Vec::with_capacity(n * n * 6);
        for y in 0..n {
            for x in 0..n {
                let tl = (y * verts_per_side + x) as u32;
                let tr = tl + 1;
                let bl = tl + verts_per_side as u32;
                let br = bl + 1;
                indices.extend_from_slice(&[tl, bl, tr, tr, bl, br]);
            }
        }

        PolyMesh {
            positions,
            indices,
            colors: with_colors.then_some(colors),
        }
    }

    #[test]
    fn never_increases_triangle_count() {
        let mesh = make_surface(30, false);
        let simplifier = MeshoptSimplifier::default();
        for reduction in [0.0, 0.5, 0.9, 1.0] {
            let result = simplifier.simplify(&mesh, reduction).unwrap();
            assert!(
                result.mesh.triangle_count() <= mesh.triangle_count(),
                "reduction {reduction} grew the mesh"
            );
            assert!(result.mesh.validate().is_ok());
        }
    }

    #[test]
    fn zero_reduction_is_identity() {
        let mesh = make_surface(10, true);
        let result = MeshoptSimplifier::default().simplify(&mesh, 0.0).unwrap();
        assert_eq!(result.mesh, mesh);
        assert!(!result.used_fallback);
    }

    #[test]
    fn ninety_percent_reduction_is_material() {
        let mesh = make_surface(22, false); // 968 triangles
        assert_eq!(mesh.triangle_count(), 968);

        let result = MeshoptSimplifier::default().simplify(&mesh, 0.9).unwrap();
        assert!(result.mesh.triangle_count() > 0);
        assert!(result.mesh.triangle_count() <= 150, "got {}", result.mesh.triangle_count());
    }

    #[test]
    fn colors_follow_kept_vertices() {
        let mesh = make_surface(20, true);
        let result = MeshoptSimplifier::default().simplify(&mesh, 0.5).unwrap();
        let colors = result.mesh.colors.as_ref().unwrap();
        assert_eq!(colors.len(), result.mesh.vertex_count());

        // Vertex positions are never moved, so each kept vertex still carries its color.
        let source_colors = mesh.colors.as_ref().unwrap();
        for (i, p) in result.mesh.positions.chunks_exact(3).enumerate() {
            let original = mesh
                .positions
                .chunks_exact(3)
                .position(|q| q == p)
                .unwrap();
            assert_eq!(colors[i], source_colors[original]);
        }
    }

    #[test]
    fn simplify_empty_mesh() {
        let result = MeshoptSimplifier::default()
            .simplify(&PolyMesh::default(), 0.5)
            .unwrap();
        assert!(result.mesh.is_empty());
        assert_eq!(result.achieved_error, 0.0);
    }

    #[test]
    fn target_index_count_rounds_to_triangles() {
        assert_eq!(target_index_count(1000, 0.9), 300);
        assert_eq!(target_index_count(1000, 0.0), 3000);
        assert_eq!(target_index_count(1000, 1.0), 0);
        assert_eq!(target_index_count(3, 0.5), 6);
    }

    #[test]
    fn compact_mesh_removes_unreferenced() {
        let source = PolyMesh {
            positions: vec![
                0.0, 0.0, 0.0, // v0
                9.0, 9.0, 9.0, // v1 -- unreferenced
                1.0, 0.0, 0.0, // v2
                0.0, 1.0, 0.0, // v3
            ],
            indices: vec![0, 2, 3],
            colors: Some(vec![[1, 1, 1], [9, 9, 9], [2, 2, 2], [3, 3, 3]]),
        };

        let compacted = compact_mesh(vec![0, 2, 3], &source);
        assert_eq!(compacted.vertex_count(), 3);
        assert_eq!(compacted.indices, vec![0, 1, 2]);
        assert_eq!(compacted.colors, Some(vec![[1, 1, 1], [2, 2, 2], [3, 3, 3]]));
        assert_eq!(&compacted.positions[3..6], &[1.0, 0.0, 0.0]);
    }
}
