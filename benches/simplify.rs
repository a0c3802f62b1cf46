use criterion::{Criterion, criterion_group, criterion_main};
use plant_decimate::simplify::{MeshSimplifier, MeshoptSimplifier};
use plant_decimate::types::PolyMesh;
use plant_decimate::vtk::{VtkEncoding, encode_vtk, parse_vtk};

/// Wavy `n x n` quad grid (2 triangles each) with per-vertex colors.
fn make_grid(n: usize) -> PolyMesh {
    let side = n + 1;
    let mut positions = Vec::with_capacity(side * side * 3);
    let mut colors = Vec::with_capacity(side * side);

    for y in 0..side {
        for x in 0..side {
            let fx = x as f32 / n as f32;
            let fy = y as f32 / n as f32;
            positions.extend_from_slice(&[fx, fy, 0.05 * (fx * 12.0).sin() * (fy * 9.0).cos()]);
            colors.push([(fx * 255.0) as u8, (fy * 255.0) as u8, 64]);
        }
    }

    let mut indices = Vec::with_capacity(n * n * 6);
    for y in 0..n {
        for x in 0..n {
            let tl = (y * side + x) as u32;
            let tr = tl + 1;
            let bl = tl + side as u32;
            let br = bl + 1;
            indices.extend_from_slice(&[tl, bl, tr, tr, bl, br]);
        }
    }

    PolyMesh {
        positions,
        indices,
        colors: Some(colors),
    }
}

fn bench_simplify(c: &mut Criterion) {
    // 224x224 grid = 50176 quads = 100352 triangles
    let mesh = make_grid(224);
    let simplifier = MeshoptSimplifier::default();

    c.bench_function("meshopt_50pct_100k", |b| {
        b.iter(|| simplifier.simplify(&mesh, 0.5));
    });

    c.bench_function("meshopt_90pct_100k", |b| {
        b.iter(|| simplifier.simplify(&mesh, 0.9));
    });
}

fn bench_vtk(c: &mut Criterion) {
    let mesh = make_grid(128);
    let ascii = encode_vtk(&mesh, VtkEncoding::Ascii).unwrap();
    let binary = encode_vtk(&mesh, VtkEncoding::Binary).unwrap();

    c.bench_function("vtk_encode_ascii_32k", |b| {
        b.iter(|| encode_vtk(&mesh, VtkEncoding::Ascii));
    });
    c.bench_function("vtk_parse_ascii_32k", |b| b.iter(|| parse_vtk(&ascii)));
    c.bench_function("vtk_parse_binary_32k", |b| b.iter(|| parse_vtk(&binary)));
}

criterion_group!(benches, bench_simplify, bench_vtk);
criterion_main!(benches);
