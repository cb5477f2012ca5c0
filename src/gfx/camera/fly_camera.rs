use cgmath::*;

/// Directions the camera can be moved in, relative to its orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraMovement {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

pub const DEFAULT_YAW: f32 = -90.0;
pub const DEFAULT_PITCH: f32 = 0.0;
pub const DEFAULT_SPEED: f32 = 2.5;
pub const DEFAULT_ZOOM: f32 = 45.0;

pub const PITCH_LIMIT: f32 = 89.0;
pub const MIN_ZOOM: f32 = 1.0;
pub const MAX_ZOOM: f32 = 45.0;

/// First-person fly camera driven by Euler angles in degrees.
///
/// `front`, `right` and `up` are derived from `yaw`/`pitch` and always form
/// an orthonormal basis.
#[derive(Debug, Clone, Copy)]
pub struct FlyCamera {
    pub position: Point3<f32>,
    front: Vector3<f32>,
    up: Vector3<f32>,
    right: Vector3<f32>,
    world_up: Vector3<f32>,
    yaw: f32,
    pitch: f32,
    pub movement_speed: f32,
    zoom: f32,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::new(
            Point3::new(0.0, 1.2, 4.0),
            Vector3::unit_y(),
            DEFAULT_YAW,
            DEFAULT_PITCH,
        )
    }
}

impl FlyCamera {
    pub fn new(position: Point3<f32>, world_up: Vector3<f32>, yaw: f32, pitch: f32) -> Self {
        let mut camera = Self {
            position,
            front: -Vector3::unit_z(),
            up: world_up,
            right: Vector3::unit_x(),
            world_up,
            yaw,
            pitch: pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            movement_speed: DEFAULT_SPEED,
            zoom: DEFAULT_ZOOM,
        };
        camera.update_vectors();
        camera
    }

    /// Moves the camera by `movement_speed * delta_time` along one of its axes
    pub fn process_movement(&mut self, direction: CameraMovement, delta_time: f32) {
        let velocity = self.movement_speed * delta_time;
        let offset = match direction {
            CameraMovement::Forward => self.front,
            CameraMovement::Backward => -self.front,
            CameraMovement::Left => -self.right,
            CameraMovement::Right => self.right,
            CameraMovement::Up => self.up,
            CameraMovement::Down => -self.up,
        };
        self.position += offset * velocity;
    }

    /// Turns the camera; pitch is clamped so the view never flips
    pub fn process_look(&mut self, xoffset: f32, yoffset: f32) {
        self.yaw += xoffset;
        self.pitch = (self.pitch + yoffset).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_vectors();
    }

    /// Narrows or widens the field of view, in degrees
    pub fn process_zoom(&mut self, yoffset: f32) {
        self.zoom = (self.zoom - yoffset).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    pub fn front(&self) -> Vector3<f32> {
        self.front
    }

    pub fn right(&self) -> Vector3<f32> {
        self.right
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (Deg(self.yaw), Deg(self.pitch));
        self.front = Vector3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn assert_close(a: Vector3<f32>, b: Vector3<f32>) {
        assert!((a - b).magnitude() < 1e-5, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_default_camera_looks_down_negative_z() {
        let camera = FlyCamera::default();
        assert_close(camera.front(), Vector3::new(0.0, 0.0, -1.0));
        assert_close(camera.right(), Vector3::new(1.0, 0.0, 0.0));
        assert_close(camera.up(), Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(camera.zoom(), 45.0);
    }

    #[test]
    fn test_front_is_unit_length_for_random_angles() {
        let mut rng = rand::rng();
        let mut camera = FlyCamera::default();

        for _ in 0..1000 {
            let x: f32 = rng.random_range(-720.0..720.0);
            let y: f32 = rng.random_range(-200.0..200.0);
            camera.process_look(x, y);

            assert!((camera.front().magnitude() - 1.0).abs() < 1e-5);
            assert!(camera.pitch().abs() <= PITCH_LIMIT);
            assert!(camera.front().dot(camera.right()).abs() < 1e-5);
        }
    }

    #[test]
    fn test_pitch_clamps_at_limit() {
        let mut camera = FlyCamera::default();
        camera.process_look(0.0, 500.0);
        assert_eq!(camera.pitch(), 89.0);
        camera.process_look(0.0, -1000.0);
        assert_eq!(camera.pitch(), -89.0);
    }

    #[test]
    fn test_zoom_clamps_to_range() {
        let mut camera = FlyCamera::default();
        for _ in 0..100 {
            camera.process_zoom(1.0);
        }
        assert_eq!(camera.zoom(), MIN_ZOOM);

        for _ in 0..100 {
            camera.process_zoom(-1.0);
        }
        assert_eq!(camera.zoom(), MAX_ZOOM);
    }

    #[test]
    fn test_movement_scales_with_speed_and_time() {
        let mut camera = FlyCamera::default();
        camera.process_movement(CameraMovement::Forward, 2.0);
        assert_close(camera.position.to_vec(), Vector3::new(0.0, 1.2, -1.0));

        camera.process_movement(CameraMovement::Right, 0.4);
        assert_close(camera.position.to_vec(), Vector3::new(1.0, 1.2, -1.0));

        camera.process_movement(CameraMovement::Down, 0.2);
        assert_close(camera.position.to_vec(), Vector3::new(1.0, 0.7, -1.0));
    }

    #[test]
    fn test_view_matrix_maps_position_to_origin() {
        let mut camera = FlyCamera::default();
        camera.process_look(33.0, -12.0);

        let eye = camera.view_matrix() * camera.position.to_homogeneous();
        assert_close(eye.truncate(), Vector3::zero());

        let ahead = camera.view_matrix() * (camera.position + camera.front()).to_homogeneous();
        assert_close(ahead.truncate(), Vector3::new(0.0, 0.0, -1.0));
    }
}
