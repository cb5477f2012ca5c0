//! Per-frame state shared by the update and render phases

use std::time::{Duration, Instant};

use crate::gfx::camera::CameraManager;
use crate::gfx::scene::{LightProperties, MaterialSettings, ModelStats, ShaderVariantState};

/// Frame-to-frame clock
#[derive(Debug, Clone, Copy)]
pub struct FrameTiming {
    last_frame: Instant,
    delta: Duration,
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self::starting_at(Instant::now())
    }
}

impl FrameTiming {
    pub fn starting_at(now: Instant) -> Self {
        Self {
            last_frame: now,
            delta: Duration::ZERO,
        }
    }

    /// Advances to `now` and returns the elapsed seconds
    pub fn tick(&mut self, now: Instant) -> f32 {
        self.delta = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        self.delta.as_secs_f32()
    }

    pub fn delta(&self) -> Duration {
        self.delta
    }
}

/// Everything a frame reads and the settings panel edits
pub struct FrameContext {
    pub camera: CameraManager,
    pub light: LightProperties,
    pub material: MaterialSettings,
    pub shader: ShaderVariantState,
    pub timing: FrameTiming,
    pub model_stats: ModelStats,
}

impl FrameContext {
    pub fn new(camera: CameraManager, model_stats: ModelStats) -> Self {
        Self {
            camera,
            light: LightProperties::default(),
            material: MaterialSettings::default(),
            shader: ShaderVariantState::default(),
            timing: FrameTiming::default(),
            model_stats,
        }
    }

    /// Update phase: advance the clock and apply held-key movement
    pub fn update(&mut self, now: Instant) {
        let delta_time = self.timing.tick(now);
        self.camera.update(delta_time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::{CameraController, FlyCamera};
    use winit::event::ElementState;
    use winit::keyboard::KeyCode;

    #[test]
    fn test_tick_measures_elapsed_time() {
        let start = Instant::now();
        let mut timing = FrameTiming::starting_at(start);

        let dt = timing.tick(start + Duration::from_millis(250));
        assert!((dt - 0.25).abs() < 1e-6);

        let dt = timing.tick(start + Duration::from_millis(300));
        assert!((dt - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_update_moves_camera_by_frame_delta() {
        let camera = CameraManager::new(FlyCamera::default(), CameraController::default());
        let mut context = FrameContext::new(camera, ModelStats::default());
        let start = Instant::now();
        context.timing = FrameTiming::starting_at(start);

        context
            .camera
            .controller
            .process_key(KeyCode::KeyS, ElementState::Pressed);
        context.update(start + Duration::from_millis(400));

        assert!((context.camera.camera.position.z - 5.0).abs() < 1e-5);
    }
}
