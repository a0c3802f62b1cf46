pub mod glb;
pub mod scene;

use tracing::info;

use crate::config::ViewConfig;
use crate::error::Result;

pub use glb::{encode_scene_glb, write_scene_glb};
pub use scene::{Actor, Assembly, CameraFrame, Scene, build_assembly, compose_scene, synthesize_colors};

/// Compose the scene for `config` and export it. Returns the number of
/// assemblies written; zero pairs writes nothing.
pub fn run(config: &ViewConfig) -> Result<usize> {
    let scene = compose_scene(&config.root_dir, &config.stem_dir, config.pairing)?;
    if scene.assemblies.is_empty() {
        info!("No .vtk pairs found in the specified directories, no scene written");
        return Ok(0);
    }
    write_scene_glb(&scene, &config.output)?;
    Ok(scene.assemblies.len())
}
