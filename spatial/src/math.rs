//! Small vector helpers for 3D spatialization.
//!
//! Pure functions over `[f32; 3]`; no vector type is worth the ceremony
//! for the handful of operations the spatializer needs.

/// Dot product.
pub fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Cross product of `a` and `b`.
pub fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Normalize to unit length. A zero-length vector is returned unchanged
/// so degenerate directions never produce NaN.
pub fn normalize(v: [f32; 3]) -> [f32; 3] {
    let length = dot(v, v).sqrt();
    if length != 0.0 {
        let inv = 1.0 / length;
        [v[0] * inv, v[1] * inv, v[2] * inv]
    } else {
        v
    }
}

/// Transform a row vector by a 3x3 matrix.
pub fn transform(v: [f32; 3], m: [[f32; 3]; 3]) -> [f32; 3] {
    [
        v[0] * m[0][0] + v[1] * m[1][0] + v[2] * m[2][0],
        v[0] * m[0][1] + v[1] * m[1][1] + v[2] * m[2][1],
        v[0] * m[0][2] + v[1] * m[1][2] + v[2] * m[2][2],
    ]
}
