use cgmath::*;
use winit::event::WindowEvent;

use super::{camera_controller::CameraController, fly_camera::FlyCamera};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Right-handed perspective projection mapped to wgpu's 0..1 depth range
pub fn projection_matrix(fovy_degrees: f32, aspect: f32, znear: f32, zfar: f32) -> Matrix4<f32> {
    OPENGL_TO_WGPU_MATRIX * perspective(Deg(fovy_degrees), aspect, znear, zfar)
}

pub struct CameraManager {
    pub camera: FlyCamera,
    pub controller: CameraController,
}

impl CameraManager {
    pub fn new(camera: FlyCamera, controller: CameraController) -> Self {
        Self { camera, controller }
    }

    /// Feeds window input to the controller.
    ///
    /// `mouse_captured` is set when the overlay wants the mouse this frame.
    pub fn process_window_event(&mut self, event: &WindowEvent, mouse_captured: bool) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                self.controller.process_keyboard(event);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.controller
                    .process_cursor((position.x, position.y), &mut self.camera, mouse_captured);
            }
            WindowEvent::MouseWheel { delta, .. } if !mouse_captured => {
                self.controller.process_scroll(delta, &mut self.camera);
            }
            _ => (),
        }
    }

    /// Applies held-key movement for this frame
    pub fn update(&mut self, delta_time: f32) {
        self.controller.update(&mut self.camera, delta_time);
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.camera.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_maps_near_and_far_to_wgpu_depth() {
        let proj = projection_matrix(45.0, 16.0 / 9.0, 0.1, 100.0);

        let near = proj * Vector4::new(0.0, 0.0, -0.1, 1.0);
        let far = proj * Vector4::new(0.0, 0.0, -100.0, 1.0);

        assert!((near.z / near.w).abs() < 1e-5);
        assert!((far.z / far.w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_depth_correction_leaves_w_untouched() {
        let proj = projection_matrix(45.0, 16.0 / 9.0, 0.1, 100.0);

        let close = proj * Vector4::new(0.0, 0.0, -0.15, 1.0);
        assert!((close.w - 0.15).abs() < 1e-6);

        let depth = close.z / close.w;
        assert!(depth > 0.0 && depth < 1.0, "depth {} outside 0..1", depth);
    }
}
