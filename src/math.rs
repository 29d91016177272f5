/// Perspective camera looking down the negative Z axis from `(0, 0, distance)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Vertical field of view in degrees
    pub fov_y: f64,
    pub distance: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Camera {
            fov_y: 40.0,
            distance: 100.0,
        }
    }
}

impl Camera {
    /// Screen pixels covered by one world unit at depth `z`
    pub fn pixels_per_unit(&self, z: f64, viewport: [f64; 2]) -> f64 {
        let depth = (self.distance - z).max(f64::EPSILON);
        let half_height = depth * (self.fov_y.to_radians() / 2.0).tan();
        (viewport[1] / 2.0) / half_height
    }

    /// Projects a world point to screen coordinates (origin top-left, Y down)
    pub fn project(&self, point: [f64; 3], viewport: [f64; 2]) -> [f64; 2] {
        let scale = self.pixels_per_unit(point[2], viewport);
        [
            viewport[0] / 2.0 + point[0] * scale,
            viewport[1] / 2.0 - point[1] * scale,
        ]
    }

    /// Screen rectangle `[x0, y0, x1, y1]` of a plane of `size` world units
    /// centered on `center`
    pub fn plane_rect(&self, center: [f64; 3], size: [f64; 2], viewport: [f64; 2]) -> [f64; 4] {
        let [cx, cy] = self.project(center, viewport);
        let scale = self.pixels_per_unit(center[2], viewport);
        let half_w = size[0] * scale / 2.0;
        let half_h = size[1] * scale / 2.0;
        [cx - half_w, cy - half_h, cx + half_w, cy + half_h]
    }
}

/// Checks if a point lies inside an `[x0, y0, x1, y1]` rectangle
pub fn point_in_rect(p: [f64; 2], rect: [f64; 4]) -> bool {
    p[0] >= rect[0] && p[0] <= rect[2] && p[1] >= rect[1] && p[1] <= rect[3]
}

/// Fraction of the way from `start` to `end` that `x` lies, clamped to [0, 1]
pub fn track_fraction(x: f64, start: f64, end: f64) -> f64 {
    let span = end - start;
    if span == 0.0 {
        return 1.0;
    }
    ((x - start) / span).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: [f64; 2] = [850.0, 450.0];

    #[test]
    fn origin_projects_to_center() {
        let camera = Camera::default();
        assert_eq!(camera.project([0.0, 0.0, 0.0], VIEWPORT), [425.0, 225.0]);
    }

    #[test]
    fn visible_height_matches_field_of_view() {
        let camera = Camera::default();
        let half_height = 100.0 * 20f64.to_radians().tan();
        let top = camera.project([0.0, half_height, 0.0], VIEWPORT);
        assert!(top[1].abs() < 1e-9);
    }

    #[test]
    fn farther_planes_shrink() {
        let camera = Camera::default();
        let near = camera.pixels_per_unit(0.0, VIEWPORT);
        let far = camera.pixels_per_unit(-5.0, VIEWPORT);
        assert!(far < near);
    }

    #[test]
    fn plane_rect_is_centered() {
        let camera = Camera::default();
        let rect = camera.plane_rect([0.0, 0.0, 0.0], [10.0, 4.0], VIEWPORT);
        assert!(((rect[0] + rect[2]) / 2.0 - 425.0).abs() < 1e-9);
        assert!(((rect[1] + rect[3]) / 2.0 - 225.0).abs() < 1e-9);
        assert!(point_in_rect([425.0, 225.0], rect));
        assert!(!point_in_rect([0.0, 0.0], rect));
    }

    #[test]
    fn fraction_is_clamped() {
        assert_eq!(track_fraction(-33.0, -33.0, -9.0), 0.0);
        assert_eq!(track_fraction(-21.0, -33.0, -9.0), 0.5);
        assert_eq!(track_fraction(100.0, -33.0, -9.0), 1.0);
        assert_eq!(track_fraction(5.0, 10.0, 0.0), 0.5);
        assert_eq!(track_fraction(3.0, 3.0, 3.0), 1.0);
    }
}
