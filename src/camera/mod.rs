/// Frustum planes and camera position handed to the culling engine
use glam::{DVec3, Mat4, Vec4};

pub const PLANE_NX: usize = 0;
pub const PLANE_NY: usize = 1;
pub const PLANE_NZ: usize = 2;
pub const PLANE_PX: usize = 3;
pub const PLANE_PY: usize = 4;
pub const PLANE_PZ: usize = 5;

/// View frustum represented as 6 planes
/// Planes are stored in Hessian normal form: ax + by + cz + d = 0
/// where (a,b,c) is the inward-facing normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// 6 planes in order -X, -Y, -Z, +X, +Y, +Z
    pub planes: [Vec4; 6],
}

impl Frustum {
    pub fn new(planes: [Vec4; 6]) -> Self {
        Self { planes }
    }

    /// Extract frustum planes from a view-projection matrix
    /// Using Gribb-Hartmann method (fast extraction from MVP)
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let row0 = vp.row(0);
        let row1 = vp.row(1);
        let row2 = vp.row(2);
        let row3 = vp.row(3);

        let mut planes = [Vec4::ZERO; 6];

        // Left, bottom, near
        planes[PLANE_NX] = Self::normalize_plane(row3 + row0);
        planes[PLANE_NY] = Self::normalize_plane(row3 + row1);
        planes[PLANE_NZ] = Self::normalize_plane(row3 + row2);
        // Right, top, far
        planes[PLANE_PX] = Self::normalize_plane(row3 - row0);
        planes[PLANE_PY] = Self::normalize_plane(row3 - row1);
        planes[PLANE_PZ] = Self::normalize_plane(row3 - row2);

        Self { planes }
    }

    #[inline]
    fn normalize_plane(plane: Vec4) -> Vec4 {
        let normal_length = plane.truncate().length();
        if normal_length > 0.0001 {
            plane / normal_length
        } else {
            plane
        }
    }

    /// Planes as plain arrays, in the same order
    pub fn to_arrays(&self) -> [[f32; 4]; 6] {
        self.planes.map(|plane| plane.to_array())
    }
}

/// Camera position in world block coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraTransform {
    pub position: DVec3,
}

impl CameraTransform {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: DVec3::new(x, y, z),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn looking_down_neg_z() -> Frustum {
        let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        let projection = Mat4::perspective_rh(70.0f32.to_radians(), 16.0 / 9.0, 0.1, 1000.0);
        Frustum::from_view_projection(&(projection * view))
    }

    #[test]
    fn plane_normals_follow_axis_order() {
        let frustum = looking_down_neg_z();

        // Left plane faces +X, right plane faces -X
        assert!(frustum.planes[PLANE_NX].x > 0.0);
        assert!(frustum.planes[PLANE_PX].x < 0.0);
        assert!(frustum.planes[PLANE_NY].y > 0.0);
        assert!(frustum.planes[PLANE_PY].y < 0.0);
        // Near plane faces into the view direction
        assert!(frustum.planes[PLANE_NZ].z < 0.0);
        assert!(frustum.planes[PLANE_PZ].z > 0.0);
    }
}
