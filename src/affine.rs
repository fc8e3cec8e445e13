//! Affine transform helpers, from voxel indices to world (scanner)
//! coordinates.
use nalgebra::{Matrix3, Matrix4, Point3, Quaternion, Vector3};

/// 3x3 linear part of a voxel-to-world transform.
pub type Affine3 = Matrix3<f64>;
/// Homogeneous 4x4 voxel-to-world transform.
pub type Affine4 = Matrix4<f64>;

const QUATERNION_THRESHOLD: f64 = -::std::f64::EPSILON * 3.0;

/// Separate a 4x4 affine into its 3x3 affine and translation components.
pub fn get_affine_and_translation(affine: &Affine4) -> (Affine3, Vector3<f64>) {
    let translation = Vector3::new(affine[(0, 3)], affine[(1, 3)], affine[(2, 3)]);
    let linear = affine.fixed_view::<3, 3>(0, 0).into_owned();
    (linear, translation)
}

/// Recombine a 3x3 affine and a translation into a homogeneous transform.
pub fn from_affine_and_translation(linear: &Affine3, translation: &Vector3<f64>) -> Affine4 {
    let mut out = Affine4::identity();
    out.fixed_view_mut::<3, 3>(0, 0).copy_from(linear);
    out.fixed_view_mut::<3, 1>(0, 3).copy_from(translation);
    out
}

/// Voxel spacing implied by a transform: the norm of each of its first three
/// columns.
pub fn spacing_of(affine: &Affine4) -> [f64; 3] {
    let (linear, _) = get_affine_and_translation(affine);
    [
        linear.column(0).norm(),
        linear.column(1).norm(),
        linear.column(2).norm(),
    ]
}

/// Map voxel coordinates to world coordinates.
pub fn voxel_to_world(affine: &Affine4, voxel: &Vector3<f64>) -> Vector3<f64> {
    affine.transform_point(&Point3::from(*voxel)).coords
}

/// Get affine implied by given shape and zooms.
///
/// We get the translations from the center of the image (implied by `shape`).
pub fn shape_zoom_affine(shape: &[usize], spacing: &[f64]) -> Affine4 {
    let origin = Vector3::new(
        (shape[0] as f64 - 1.0) / 2.0,
        (shape[1] as f64 - 1.0) / 2.0,
        (shape[2] as f64 - 1.0) / 2.0,
    );
    let spacing = [-spacing[0], spacing[1], spacing[2]];
    #[rustfmt::skip]
    let affine = Affine4::new(
        spacing[0], 0.0, 0.0, -origin[0] * spacing[0],
        0.0, spacing[1], 0.0, -origin[1] * spacing[1],
        0.0, 0.0, spacing[2], -origin[2] * spacing[2],
        0.0, 0.0, 0.0, 1.0,
    );
    affine
}

/// Diagonal transform with the given spacing and no translation.
pub fn scaling(spacing: [f64; 3]) -> Affine4 {
    Affine4::new_nonuniform_scaling(&Vector3::new(spacing[0], spacing[1], spacing[2]))
}

/// Compute unit quaternion from last 3 values.
///
/// If w, x, y, z are the values in the full quaternion, assumes w is positive.
/// w = 0.0 corresponds to a 180 degree rotation. Slightly negative `w*w`
/// estimates from rounding are clamped to zero; `None` is returned if `w*w`
/// is clearly negative.
pub fn fill_positive(xyz: Vector3<f64>) -> Option<Quaternion<f64>> {
    let w2 = 1.0 - xyz.dot(&xyz);
    let w = if w2 < 0.0 {
        if w2 < QUATERNION_THRESHOLD {
            return None;
        }
        0.0
    } else {
        w2.sqrt()
    };
    Some(Quaternion::new(w, xyz.x, xyz.y, xyz.z))
}

/// Calculate rotation matrix corresponding to quaternion.
///
/// Rotation matrix applies to column vectors, and is applied to the left of coordinate vectors.
/// The algorithm here allows non-unit quaternions.
///
/// Algorithm from https://en.wikipedia.org/wiki/Rotation_matrix#Quaternion
pub fn quaternion_to_affine(q: Quaternion<f64>) -> Affine3 {
    let nq = q.w * q.w + q.i * q.i + q.j * q.j + q.k * q.k;
    if nq < ::std::f64::EPSILON {
        return Affine3::identity();
    }
    let s = 2.0 / nq;
    let x = q.i * s;
    let y = q.j * s;
    let z = q.k * s;
    let wx = q.w * x;
    let wy = q.w * y;
    let wz = q.w * z;
    let xx = q.i * x;
    let xy = q.i * y;
    let xz = q.i * z;
    let yy = q.j * y;
    let yz = q.j * z;
    let zz = q.k * z;
    Affine3::new(
        1.0 - (yy + zz), xy - wz, xz + wy,
        xy + wz, 1.0 - (xx + zz), yz - wx,
        xz - wy, yz + wx, 1.0 - (xx + yy),
    )
}
