//! Rotation about the Y axis, shared by the CPU evaluator and generated WGSL.

use glam::{Mat3, Vec3};

/// WGSL definition of [`rotation3d_y`], emitted into every compiled program
/// that rotates vertices.
pub const ROTATION3D_Y_WGSL: &str = "fn rotation3d_y(angle: f32) -> mat3x3f {
    let s = sin(angle);
    let c = cos(angle);
    return mat3x3f(
        vec3f(c, 0.0, s),
        vec3f(0.0, 1.0, 0.0),
        vec3f(-s, 0.0, c),
    );
}
";

/// Builds a 3x3 rotation about the Y axis for column vectors (`v' = M * v`).
///
/// Row-major the matrix reads `[cos, 0, -sin; 0, 1, 0; sin, 0, cos]`. Any real
/// angle is accepted.
pub fn rotation3d_y(angle: f32) -> Mat3 {
    let (s, c) = angle.sin_cos();
    Mat3::from_cols(
        Vec3::new(c, 0.0, s),
        Vec3::Y,
        Vec3::new(-s, 0.0, c),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: Mat3, b: Mat3) -> bool {
        a.to_cols_array()
            .iter()
            .zip(b.to_cols_array().iter())
            .all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn zero_angle_is_identity() {
        assert_eq!(rotation3d_y(0.0), Mat3::IDENTITY);
    }

    #[test]
    fn inverse_angle_round_trips() {
        for theta in [-7.0f32, -3.1, -0.5, 0.25, 1.0, 2.5, 12.0] {
            let product = rotation3d_y(theta) * rotation3d_y(-theta);
            assert!(approx_eq(product, Mat3::IDENTITY), "theta = {theta}");
        }
    }

    #[test]
    fn rows_match_documented_layout() {
        let theta = 0.7f32;
        let (s, c) = theta.sin_cos();
        let m = rotation3d_y(theta);
        assert!((m.row(0) - Vec3::new(c, 0.0, -s)).length() < 1e-6);
        assert_eq!(m.row(1), Vec3::Y);
        assert!((m.row(2) - Vec3::new(s, 0.0, c)).length() < 1e-6);
    }

    #[test]
    fn matches_glam_with_opposite_handedness() {
        let theta = 1.3f32;
        assert!(approx_eq(rotation3d_y(theta), Mat3::from_rotation_y(-theta)));
    }

    #[test]
    fn quarter_turn_moves_x_onto_z() {
        let v = rotation3d_y(std::f32::consts::FRAC_PI_2) * Vec3::X;
        assert!((v - Vec3::Z).length() < 1e-6);
    }
}
