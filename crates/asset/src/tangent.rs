//! Per-triangle tangent synthesis from position and texcoord buffers.

use glam::{Vec2, Vec3};

/// Generate one tangent per triangle vertex, aligned 1:1 with the
/// triangles walked. Triangles come from `indices` when given, otherwise
/// from sequential triples over the position buffer.
///
/// The tangent points along increasing texture-U, derived from the
/// inverse of the 2x2 UV Jacobian. A triangle whose UV mapping is
/// degenerate (zero determinant, e.g. all three texcoords identical)
/// falls back to (1, 0, 0). The tangent is flat per face: all three
/// vertices of a triangle share it, with no averaging across faces.
pub fn generate_tangents(positions: &[f32], texcoords: &[f32], indices: Option<&[u32]>) -> Vec<f32> {
    let emitted = match indices {
        Some(indices) => indices.len(),
        None => positions.len() / 3,
    };
    let face_count = emitted / 3;
    let vertex_at = |i: usize| match indices {
        Some(indices) => indices[i] as usize,
        None => i,
    };

    let mut tangents = Vec::with_capacity(face_count * 9);
    for face in 0..face_count {
        let n1 = vertex_at(face * 3);
        let n2 = vertex_at(face * 3 + 1);
        let n3 = vertex_at(face * 3 + 2);

        let p1 = position_at(positions, n1);
        let p2 = position_at(positions, n2);
        let p3 = position_at(positions, n3);

        let uv1 = texcoord_at(texcoords, n1);
        let uv2 = texcoord_at(texcoords, n2);
        let uv3 = texcoord_at(texcoords, n3);

        let dp12 = p2 - p1;
        let dp13 = p3 - p1;
        let duv12 = uv2 - uv1;
        let duv13 = uv3 - uv1;

        let f = 1.0 / (duv12.x * duv13.y - duv13.x * duv12.y);
        let tangent = if f.is_finite() {
            ((dp12 * duv13.y - dp13 * duv12.y) * f).normalize_or_zero()
        } else {
            Vec3::X
        };
        for _ in 0..3 {
            tangents.extend_from_slice(&tangent.to_array());
        }
    }
    tangents
}

/// Read a position triple, treating anything past the end as zero rather
/// than faulting on short buffers.
fn position_at(buffer: &[f32], vertex: usize) -> Vec3 {
    let base = vertex * 3;
    let at = |offset: usize| buffer.get(base + offset).copied().unwrap_or(0.0);
    Vec3::new(at(0), at(1), at(2))
}

fn texcoord_at(buffer: &[f32], vertex: usize) -> Vec2 {
    let base = vertex * 2;
    let at = |offset: usize| buffer.get(base + offset).copied().unwrap_or(0.0);
    Vec2::new(at(0), at(1))
}
