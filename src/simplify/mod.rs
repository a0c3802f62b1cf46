pub mod meshopt_simplifier;

use crate::error::{DecimateError, Result};
use crate::types::PolyMesh;

pub use meshopt_simplifier::{MeshoptSimplifier, compact_mesh};

/// Result of mesh simplification: new mesh + achieved error.
#[derive(Debug, Clone)]
pub struct SimplifiedMesh {
    pub mesh: PolyMesh,
    /// Error reported by the backend, relative to the mesh extent.
    pub achieved_error: f32,
    /// Whether the topology-agnostic fallback pass ran.
    pub used_fallback: bool,
}

/// A triangle-reduction backend.
///
/// `reduction` is the fraction of triangles to remove, in `[0, 1]`.
/// Implementations never return more triangles than they were given and
/// make no promise about preserving topology.
pub trait MeshSimplifier: Send + Sync {
    fn simplify(&self, mesh: &PolyMesh, reduction: f32) -> Result<SimplifiedMesh>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// Reject reduction fractions outside `[0, 1]` (NaN included).
pub fn validate_reduction(reduction: f32) -> Result<()> {
    if (0.0..=1.0).contains(&reduction) {
        Ok(())
    } else {
        Err(DecimateError::InvalidArgument(format!(
            "reduction fraction must be within [0, 1], got {reduction}"
        )))
    }
}

/// Decimate `mesh` with the default simplifier.
pub fn decimate(mesh: &PolyMesh, reduction: f32) -> Result<PolyMesh> {
    MeshoptSimplifier::default()
        .simplify(mesh, reduction)
        .map(|s| s.mesh)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduction_range() {
        assert!(validate_reduction(0.0).is_ok());
        assert!(validate_reduction(0.9).is_ok());
        assert!(validate_reduction(1.0).is_ok());
        assert!(matches!(
            validate_reduction(1.01),
            Err(DecimateError::InvalidArgument(_))
        ));
        assert!(validate_reduction(-0.1).is_err());
        assert!(validate_reduction(f32::NAN).is_err());
    }

    #[test]
    fn decimate_rejects_bad_reduction() {
        let mesh = PolyMesh {
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            indices: vec![0, 1, 2],
            colors: None,
        };
        assert!(decimate(&mesh, 2.0).is_err());
    }
}
