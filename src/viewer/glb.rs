use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::Path;

use gltf::binary::Glb;
use gltf_json::accessor::{ComponentType, GenericComponentType, Type as AccessorType};
use gltf_json::buffer::Target;
use gltf_json::material::AlphaMode;
use gltf_json::mesh::{Mode, Primitive, Semantic};
use gltf_json::validation::{Checked, USize64};
use gltf_json::Index;
use tracing::info;

use super::scene::{Actor, Scene};
use crate::error::{DecimateError, Result};
use crate::vtk;

/// Serialize a composed scene into a self-contained GLB.
///
/// Each assembly becomes a node with one child node per actor. Vertex colors
/// go to `COLOR_0` as normalized u8; actor opacity becomes the material's
/// base color alpha, with `BLEND` mode for translucent actors. A perspective
/// camera node frames the scene and the background color is stored in the
/// scene's `extras`.
pub fn encode_scene_glb(scene: &Scene) -> Result<Vec<u8>> {
    let mut root = gltf_json::Root {
        asset: gltf_json::Asset {
            version: "2.0".into(),
            generator: Some("plant-decimate".into()),
            ..Default::default()
        },
        ..Default::default()
    };

    let mut bin_data: Vec<u8> = Vec::new();
    let buffer_idx = Index::new(0); // pushed at the end
    let mut scene_nodes = Vec::with_capacity(scene.assemblies.len() + 1);

    for assembly in &scene.assemblies {
        let children = vec![
            push_actor(&mut root, &mut bin_data, buffer_idx, &assembly.root),
            push_actor(&mut root, &mut bin_data, buffer_idx, &assembly.stem),
        ];
        scene_nodes.push(root.push(gltf_json::Node {
            name: Some(assembly.name.clone()),
            children: Some(children),
            ..Default::default()
        }));
    }

    let frame = scene.camera();
    let camera_idx = root.push(gltf_json::Camera {
        name: Some("auto-frame".into()),
        orthographic: None,
        perspective: Some(gltf_json::camera::Perspective {
            aspect_ratio: Some(1.0),
            yfov: frame.yfov,
            zfar: Some(frame.zfar),
            znear: frame.znear,
            extensions: Default::default(),
            extras: Default::default(),
        }),
        type_: Checked::Valid(gltf_json::camera::Type::Perspective),
        extensions: Default::default(),
        extras: Default::default(),
    });
    scene_nodes.push(root.push(gltf_json::Node {
        name: Some("camera".into()),
        camera: Some(camera_idx),
        translation: Some(frame.position.to_array()),
        ..Default::default()
    }));

    let extras = serde_json::value::to_raw_value(&serde_json::json!({
        "background": scene.background,
    }))
    .map_err(|e| DecimateError::Output(format!("scene extras: {e}")))?;

    let scene_idx = root.push(gltf_json::Scene {
        nodes: scene_nodes,
        name: Some("plant pairs".into()),
        extensions: Default::default(),
        extras: Some(extras),
    });
    root.scene = Some(scene_idx);

    // Pad binary data to 4-byte alignment
    while bin_data.len() % 4 != 0 {
        bin_data.push(0);
    }
    let has_bin = !bin_data.is_empty();
    if has_bin {
        root.push(gltf_json::Buffer {
            byte_length: USize64::from(bin_data.len()),
            uri: None,
            name: None,
            extensions: Default::default(),
            extras: Default::default(),
        });
    }

    let json_string = gltf_json::serialize::to_string(&root)
        .map_err(|e| DecimateError::Output(format!("glTF serialization: {e}")))?;
    let mut json_bytes = json_string.into_bytes();
    // Pad JSON to 4-byte alignment with spaces (per GLB spec)
    while json_bytes.len() % 4 != 0 {
        json_bytes.push(b' ');
    }

    let bin_len = if has_bin { 8 + bin_data.len() } else { 0 };
    let glb = Glb {
        header: gltf::binary::Header {
            magic: *b"glTF",
            version: 2,
            length: (12 + 8 + json_bytes.len() + bin_len) as u32,
        },
        json: Cow::Owned(json_bytes),
        bin: has_bin.then_some(Cow::Owned(bin_data)),
    };

    glb.to_vec()
        .map_err(|e| DecimateError::Output(format!("GLB serialization: {e}")))
}

/// Write the scene GLB to `path`.
pub fn write_scene_glb(scene: &Scene, path: &Path) -> Result<()> {
    let bytes = encode_scene_glb(scene)?;
    vtk::write_atomic(path, &bytes)?;
    info!(
        path = %path.display(),
        assemblies = scene.assemblies.len(),
        triangles = scene.triangle_count(),
        bytes = bytes.len(),
        "Wrote scene"
    );
    Ok(())
}

/// Push an actor's node (with mesh and material unless it has no triangles).
fn push_actor(
    root: &mut gltf_json::Root,
    bin_data: &mut Vec<u8>,
    buffer_idx: Index<gltf_json::Buffer>,
    actor: &Actor,
) -> Index<gltf_json::Node> {
    let mesh = &actor.mesh;
    if mesh.triangle_count() == 0 {
        return root.push(gltf_json::Node {
            name: Some(actor.name.clone()),
            ..Default::default()
        });
    }

    let mut attributes = BTreeMap::new();

    // --- Positions ---
    let (pos_min, pos_max) = mesh
        .bounds()
        .unwrap_or(([0.0; 3], [0.0; 3]));
    let pos_view = push_view(
        root,
        bin_data,
        buffer_idx,
        bytemuck::cast_slice(&mesh.positions),
        Target::ArrayBuffer,
    );
    let pos_accessor = root.push(gltf_json::Accessor {
        buffer_view: Some(pos_view),
        byte_offset: Some(USize64(0)),
        count: USize64::from(mesh.vertex_count()),
        component_type: Checked::Valid(GenericComponentType(ComponentType::F32)),
        type_: Checked::Valid(AccessorType::Vec3),
        min: Some(serde_json::json!(pos_min)),
        max: Some(serde_json::json!(pos_max)),
        name: None,
        normalized: false,
        sparse: None,
        extensions: Default::default(),
        extras: Default::default(),
    });
    attributes.insert(Checked::Valid(Semantic::Positions), pos_accessor);

    // --- Colors (u8 normalized, RGBA for 4-byte element alignment) ---
    let color_rgba: Vec<u8> = actor
        .colors
        .iter()
        .flat_map(|&[r, g, b]| [r, g, b, 255])
        .collect();
    let color_view = push_view(root, bin_data, buffer_idx, &color_rgba, Target::ArrayBuffer);
    let color_accessor = root.push(gltf_json::Accessor {
        buffer_view: Some(color_view),
        byte_offset: Some(USize64(0)),
        count: USize64::from(actor.colors.len()),
        component_type: Checked::Valid(GenericComponentType(ComponentType::U8)),
        type_: Checked::Valid(AccessorType::Vec4),
        min: None,
        max: None,
        name: None,
        normalized: true,
        sparse: None,
        extensions: Default::default(),
        extras: Default::default(),
    });
    attributes.insert(Checked::Valid(Semantic::Colors(0)), color_accessor);

    // --- Indices ---
    let idx_view = push_view(
        root,
        bin_data,
        buffer_idx,
        bytemuck::cast_slice(&mesh.indices),
        Target::ElementArrayBuffer,
    );
    let idx_accessor = root.push(gltf_json::Accessor {
        buffer_view: Some(idx_view),
        byte_offset: Some(USize64(0)),
        count: USize64::from(mesh.indices.len()),
        component_type: Checked::Valid(GenericComponentType(ComponentType::U32)),
        type_: Checked::Valid(AccessorType::Scalar),
        min: None,
        max: None,
        name: None,
        normalized: false,
        sparse: None,
        extensions: Default::default(),
        extras: Default::default(),
    });

    let material = push_material(root, &actor.name, actor.opacity);

    let mesh_idx = root.push(gltf_json::Mesh {
        primitives: vec![Primitive {
            attributes,
            indices: Some(idx_accessor),
            material: Some(material),
            mode: Checked::Valid(Mode::Triangles),
            targets: None,
            extensions: Default::default(),
            extras: Default::default(),
        }],
        weights: None,
        name: Some(actor.name.clone()),
        extensions: Default::default(),
        extras: Default::default(),
    });

    root.push(gltf_json::Node {
        name: Some(actor.name.clone()),
        mesh: Some(mesh_idx),
        ..Default::default()
    })
}

fn push_view(
    root: &mut gltf_json::Root,
    bin_data: &mut Vec<u8>,
    buffer_idx: Index<gltf_json::Buffer>,
    bytes: &[u8],
    target: Target,
) -> Index<gltf_json::buffer::View> {
    // Pad to 4-byte alignment
    while bin_data.len() % 4 != 0 {
        bin_data.push(0);
    }
    let byte_offset = bin_data.len();
    bin_data.extend_from_slice(bytes);

    root.push(gltf_json::buffer::View {
        buffer: buffer_idx,
        byte_length: USize64::from(bytes.len()),
        byte_offset: Some(USize64::from(byte_offset)),
        byte_stride: None,
        name: None,
        target: Some(Checked::Valid(target)),
        extensions: Default::default(),
        extras: Default::default(),
    })
}

/// White base color scaled by vertex colors; alpha carries the opacity.
fn push_material(root: &mut gltf_json::Root, name: &str, opacity: f32) -> Index<gltf_json::Material> {
    let alpha_mode = if opacity < 1.0 {
        AlphaMode::Blend
    } else {
        AlphaMode::Opaque
    };

    let pbr = gltf_json::material::PbrMetallicRoughness {
        base_color_factor: gltf_json::material::PbrBaseColorFactor([1.0, 1.0, 1.0, opacity]),
        metallic_factor: gltf_json::material::StrengthFactor(0.0),
        roughness_factor: gltf_json::material::StrengthFactor(0.8),
        base_color_texture: None,
        metallic_roughness_texture: None,
        extensions: Default::default(),
        extras: Default::default(),
    };

    root.push(gltf_json::Material {
        pbr_metallic_roughness: pbr,
        alpha_mode: Checked::Valid(alpha_mode),
        alpha_cutoff: None,
        double_sided: true,
        normal_texture: None,
        occlusion_texture: None,
        emissive_texture: None,
        emissive_factor: gltf_json::material::EmissiveFactor([0.0, 0.0, 0.0]),
        name: Some(name.to_owned()),
        extensions: Default::default(),
        extras: Default::default(),
    })
}
