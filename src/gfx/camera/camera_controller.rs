use std::collections::HashSet;

use winit::{
    event::{ElementState, KeyEvent, MouseScrollDelta},
    keyboard::{KeyCode, PhysicalKey},
};

use super::fly_camera::{CameraMovement, FlyCamera};

/// Pixels per scroll line when the platform reports pixel deltas
const PIXELS_PER_LINE: f32 = 20.0;

/// Turns window input into fly camera movement, look and zoom
pub struct CameraController {
    pub sensitivity: f32,
    held: HashSet<KeyCode>,
    look_suspended: bool,
    last_cursor: Option<(f64, f64)>,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl CameraController {
    pub fn new(sensitivity: f32) -> Self {
        Self {
            sensitivity,
            held: HashSet::new(),
            look_suspended: false,
            last_cursor: None,
        }
    }

    pub fn process_keyboard(&mut self, event: &KeyEvent) {
        if let PhysicalKey::Code(code) = event.physical_key {
            self.process_key(code, event.state);
        }
    }

    pub fn process_key(&mut self, code: KeyCode, state: ElementState) {
        let pressed = state == ElementState::Pressed;
        if code == KeyCode::KeyZ {
            self.look_suspended = pressed;
            return;
        }

        if Self::movement_for(code).is_some() {
            if pressed {
                self.held.insert(code);
            } else {
                self.held.remove(&code);
            }
        }
    }

    /// Applies a cursor position; `captured` is set while the overlay owns the mouse
    pub fn process_cursor(&mut self, position: (f64, f64), camera: &mut FlyCamera, captured: bool) {
        let Some((last_x, last_y)) = self.last_cursor.replace(position) else {
            return;
        };

        if self.look_suspended || captured {
            return;
        }

        // y grows downwards in window coordinates
        let xoffset = (position.0 - last_x) as f32 * self.sensitivity;
        let yoffset = (last_y - position.1) as f32 * self.sensitivity;
        camera.process_look(xoffset, yoffset);
    }

    pub fn process_scroll(&mut self, delta: &MouseScrollDelta, camera: &mut FlyCamera) {
        let lines = match delta {
            MouseScrollDelta::LineDelta(_, y) => *y,
            MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_LINE,
        };
        camera.process_zoom(lines);
    }

    /// Moves the camera for every held key
    pub fn update(&self, camera: &mut FlyCamera, delta_time: f32) {
        for code in &self.held {
            if let Some(direction) = Self::movement_for(*code) {
                camera.process_movement(direction, delta_time);
            }
        }
    }

    pub fn is_look_suspended(&self) -> bool {
        self.look_suspended
    }

    fn movement_for(code: KeyCode) -> Option<CameraMovement> {
        match code {
            KeyCode::KeyW => Some(CameraMovement::Forward),
            KeyCode::KeyS => Some(CameraMovement::Backward),
            KeyCode::KeyA => Some(CameraMovement::Left),
            KeyCode::KeyD => Some(CameraMovement::Right),
            KeyCode::KeyE => Some(CameraMovement::Up),
            KeyCode::KeyQ => Some(CameraMovement::Down),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn test_first_cursor_event_does_not_turn() {
        let mut controller = CameraController::default();
        let mut camera = FlyCamera::default();

        controller.process_cursor((400.0, 300.0), &mut camera, false);
        assert_eq!(camera.yaw(), -90.0);

        controller.process_cursor((410.0, 290.0), &mut camera, false);
        assert!((camera.yaw() - -89.0).abs() < 1e-5);
        assert!((camera.pitch() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_suspended_look_tracks_cursor_without_jump() {
        let mut controller = CameraController::default();
        let mut camera = FlyCamera::default();
        controller.process_cursor((0.0, 0.0), &mut camera, false);

        controller.process_key(KeyCode::KeyZ, ElementState::Pressed);
        controller.process_cursor((500.0, 0.0), &mut camera, false);
        assert_eq!(camera.yaw(), -90.0);

        controller.process_key(KeyCode::KeyZ, ElementState::Released);
        controller.process_cursor((510.0, 0.0), &mut camera, false);
        assert!((camera.yaw() - -89.0).abs() < 1e-5);
    }

    #[test]
    fn test_captured_mouse_does_not_turn() {
        let mut controller = CameraController::default();
        let mut camera = FlyCamera::default();
        controller.process_cursor((0.0, 0.0), &mut camera, true);
        controller.process_cursor((100.0, 100.0), &mut camera, true);
        assert_eq!(camera.yaw(), -90.0);
        assert_eq!(camera.pitch(), 0.0);
    }

    #[test]
    fn test_held_keys_move_until_released() {
        let mut controller = CameraController::default();
        let mut camera = FlyCamera::default();

        controller.process_key(KeyCode::KeyW, ElementState::Pressed);
        controller.update(&mut camera, 0.4);
        assert!((camera.position.z - 3.0).abs() < 1e-5);

        controller.process_key(KeyCode::KeyW, ElementState::Released);
        controller.update(&mut camera, 0.4);
        assert!((camera.position.z - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_scroll_feeds_zoom() {
        let mut controller = CameraController::default();
        let mut camera = FlyCamera::default();

        controller.process_scroll(&MouseScrollDelta::LineDelta(0.0, 5.0), &mut camera);
        assert_eq!(camera.zoom(), 40.0);

        controller.process_scroll(
            &MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 40.0)),
            &mut camera,
        );
        assert_eq!(camera.zoom(), 38.0);
    }
}
