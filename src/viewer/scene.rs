use std::path::Path;

use glam::Vec3;
use tracing::{info, warn};

use crate::error::Result;
use crate::pairing::{self, MeshPair, PairingMode};
use crate::types::PolyMesh;
use crate::vtk;

/// Root meshes without a `Colors` array are drawn dark gray.
pub const ROOT_FALLBACK_COLOR: [u8; 3] = [25, 25, 25];
/// Stem meshes without a `Colors` array get the renderer's default white.
pub const STEM_FALLBACK_COLOR: [u8; 3] = [255, 255, 255];
pub const ROOT_OPACITY: f32 = 0.1;
pub const STEM_OPACITY: f32 = 1.0;
/// Scene background, linear RGB.
pub const BACKGROUND: [f32; 3] = [0.0, 0.3, 0.5];
/// Vertical field of view of the framing camera.
pub const CAMERA_YFOV: f32 = std::f32::consts::FRAC_PI_6;

/// One colored, possibly translucent mesh.
#[derive(Debug, Clone)]
pub struct Actor {
    pub name: String,
    pub mesh: PolyMesh,
    /// One RGB color per vertex.
    pub colors: Vec<[u8; 3]>,
    pub opacity: f32,
}

/// The root and stem actors of one sample, grouped as a unit.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub name: String,
    pub root: Actor,
    pub stem: Actor,
}

/// Perspective camera looking down -Z at the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrame {
    pub position: Vec3,
    pub target: Vec3,
    pub yfov: f32,
    pub znear: f32,
    pub zfar: f32,
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub assemblies: Vec<Assembly>,
    pub background: [f32; 3],
}

impl Scene {
    /// Bounds over every actor in the scene.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        self.assemblies
            .iter()
            .flat_map(|a| [&a.root, &a.stem])
            .filter_map(|actor| actor.mesh.bounds())
            .map(|(min, max)| (Vec3::from(min), Vec3::from(max)))
            .reduce(|(amin, amax), (bmin, bmax)| (amin.min(bmin), amax.max(bmax)))
    }

    /// Camera placed on +Z so the scene's bounding sphere fills the view.
    pub fn camera(&self) -> CameraFrame {
        let Some((min, max)) = self.bounds() else {
            return CameraFrame {
                position: Vec3::Z,
                target: Vec3::ZERO,
                yfov: CAMERA_YFOV,
                znear: 0.01,
                zfar: 100.0,
            };
        };

        let target = (min + max) * 0.5;
        let radius = ((max - min).length() * 0.5).max(1e-3);
        let distance = radius / (CAMERA_YFOV * 0.5).sin();

        CameraFrame {
            position: target + Vec3::Z * distance,
            target,
            yfov: CAMERA_YFOV,
            znear: (distance - radius).max(radius * 0.01),
            zfar: distance + radius * 2.0,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.assemblies
            .iter()
            .map(|a| a.root.mesh.triangle_count() + a.stem.mesh.triangle_count())
            .sum()
    }
}

/// Per-vertex colors: the mesh's own colors, else `fallback` everywhere.
pub fn synthesize_colors(mesh: &PolyMesh, fallback: [u8; 3]) -> Vec<[u8; 3]> {
    match &mesh.colors {
        Some(colors) if colors.len() == mesh.vertex_count() => colors.clone(),
        _ => vec![fallback; mesh.vertex_count()],
    }
}

/// Group a root and stem mesh with their colors and opacities.
pub fn build_assembly(name: impl Into<String>, root: PolyMesh, stem: PolyMesh) -> Assembly {
    let name = name.into();
    Assembly {
        root: Actor {
            name: format!("{name}/root"),
            colors: synthesize_colors(&root, ROOT_FALLBACK_COLOR),
            mesh: root,
            opacity: ROOT_OPACITY,
        },
        stem: Actor {
            name: format!("{name}/stem"),
            colors: synthesize_colors(&stem, STEM_FALLBACK_COLOR),
            mesh: stem,
            opacity: STEM_OPACITY,
        },
        name,
    }
}

/// Read every mesh pair of the two directories into one scene.
///
/// Pairs whose files cannot be read are logged and left out.
pub fn compose_scene(root_dir: &Path, stem_dir: &Path, mode: PairingMode) -> Result<Scene> {
    let root_files = pairing::list_mesh_files(root_dir)?;
    let stem_files = pairing::list_mesh_files(stem_dir)?;
    let pairing = pairing::pair_files(&root_files, &stem_files, mode);

    let mut assemblies = Vec::with_capacity(pairing.pairs.len());
    for pair in &pairing.pairs {
        match load_pair(pair) {
            Ok(assembly) => assemblies.push(assembly),
            Err(e) => warn!(root = %pair.root.display(), stem = %pair.stem.display(), error = %e, "Skipping pair"),
        }
    }

    info!(
        pairs = pairing.pairs.len(),
        assemblies = assemblies.len(),
        "Composed scene"
    );

    Ok(Scene {
        assemblies,
        background: BACKGROUND,
    })
}

fn load_pair(pair: &MeshPair) -> Result<Assembly> {
    let root = vtk::read_mesh(&pair.root)?;
    let stem = vtk::read_mesh(&pair.stem)?;
    let name = pair
        .root
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(build_assembly(name, root, stem))
}
