// src/ui/manager.rs
//! ImGui overlay manager for the viewer
//!
//! Handles ImGui integration with wgpu and winit: frame preparation, input
//! forwarding and drawing the overlay on top of the rendered scene.

use imgui::{Context, FontConfig, FontSource, MouseCursor};
use imgui_wgpu::{Renderer, RendererConfig};
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use std::time::Instant;
use wgpu::{CommandEncoder, Device, Queue, TextureFormat, TextureView};
use winit::{
    event::{Event, WindowEvent},
    window::{Window, WindowId},
};

const FONT_SIZE: f32 = 20.0;

/// ImGui overlay manager
///
/// Owns the ImGui context together with its winit platform glue and wgpu
/// renderer. DPI is locked at 1.0 so panel sizes are in physical pixels.
pub struct UiManager {
    pub context: Context,
    platform: WinitPlatform,
    renderer: Renderer,
    last_frame: Instant,
    last_cursor: Option<MouseCursor>,
    frame_pending: bool,
}

impl UiManager {
    /// Creates the overlay for `window`, rendering into `output_color_format`
    pub fn new(
        device: &Device,
        queue: &Queue,
        output_color_format: TextureFormat,
        window: &Window,
    ) -> Self {
        let mut context = Context::create();
        context.set_ini_filename(None);

        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(context.io_mut(), window, HiDpiMode::Locked(1.0));

        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: FONT_SIZE,
                ..Default::default()
            }),
        }]);

        let renderer_config = RendererConfig {
            texture_format: output_color_format,
            ..Default::default()
        };
        let renderer = Renderer::new(&mut context, device, queue, renderer_config);

        Self {
            context,
            platform,
            renderer,
            last_frame: Instant::now(),
            last_cursor: None,
            frame_pending: false,
        }
    }

    /// Updates ImGui's display size after the surface is resized
    pub fn update_display_size(&mut self, width: u32, height: u32) {
        self.context.io_mut().display_size = [width as f32, height as f32];
    }

    /// Forwards a window event to ImGui.
    ///
    /// Returns true if the overlay wants the mouse or keyboard after the event.
    pub fn handle_window_event(
        &mut self,
        window: &Window,
        window_id: WindowId,
        event: &WindowEvent,
    ) -> bool {
        match event {
            WindowEvent::CursorMoved { .. }
            | WindowEvent::MouseInput { .. }
            | WindowEvent::MouseWheel { .. }
            | WindowEvent::KeyboardInput { .. }
            | WindowEvent::ModifiersChanged(_)
            | WindowEvent::Focused(_) => {
                let ui_event: Event<()> = Event::WindowEvent {
                    window_id,
                    event: event.clone(),
                };
                self.platform
                    .handle_event(self.context.io_mut(), window, &ui_event);

                let io = self.context.io();
                io.want_capture_mouse || io.want_capture_keyboard
            }
            _ => false,
        }
    }

    /// Whether the overlay currently owns the mouse (cursor over a panel)
    pub fn wants_mouse(&self) -> bool {
        self.context.io().want_capture_mouse
    }

    /// Prepares a new ImGui frame and builds it with `run_ui`.
    ///
    /// Returns false if the platform could not prepare the frame; nothing is
    /// built in that case. A previous frame that was never rendered is ended
    /// first, since ImGui aborts on two unfinished frames in a row.
    pub fn update_logic<F>(&mut self, window: &Window, run_ui: F) -> bool
    where
        F: FnOnce(&imgui::Ui),
    {
        end_pending_frame(&mut self.context, &mut self.frame_pending);

        let now = Instant::now();
        self.context
            .io_mut()
            .update_delta_time(now - self.last_frame);
        self.last_frame = now;

        if let Err(e) = self.platform.prepare_frame(self.context.io_mut(), window) {
            log::error!("Failed to prepare UI frame: {:?}", e);
            return false;
        }

        let ui = self.context.frame();
        run_ui(ui);

        if self.last_cursor != ui.mouse_cursor() {
            self.last_cursor = ui.mouse_cursor();
            self.platform.prepare_render(ui, window);
        }

        self.frame_pending = true;
        true
    }

    /// Renders the frame built by the last `update_logic` onto `color_attachment`.
    ///
    /// Loads the existing attachment contents so the scene stays underneath.
    pub fn render_display_only(
        &mut self,
        device: &Device,
        queue: &Queue,
        encoder: &mut CommandEncoder,
        color_attachment: &TextureView,
    ) {
        self.frame_pending = false;
        let draw_data = self.context.render();

        if draw_data.display_size[0] <= 0.0 || draw_data.display_size[1] <= 0.0 {
            return;
        }

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("imgui_render_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_attachment,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if let Err(e) = self
            .renderer
            .render(draw_data, queue, device, &mut render_pass)
        {
            log::error!("Failed to render UI: {:?}", e);
        }
    }

    /// Ends the frame built by `update_logic` without drawing it.
    ///
    /// Used when the surface had no texture to draw onto this frame.
    pub fn discard_frame(&mut self) {
        end_pending_frame(&mut self.context, &mut self.frame_pending);
    }
}

fn end_pending_frame(context: &mut Context, pending: &mut bool) {
    if std::mem::take(pending) {
        context.render();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::{CameraController, CameraManager, FlyCamera};
    use crate::gfx::rendering::FrameContext;
    use crate::gfx::scene::ModelStats;
    use crate::ui::settings_panel;

    fn headless_context() -> Context {
        let mut context = Context::create();
        context.set_ini_filename(None);
        context.io_mut().display_size = [1600.0, 900.0];
        context.fonts().build_rgba32_texture();
        context
    }

    fn frame_context() -> FrameContext {
        let camera = CameraManager::new(FlyCamera::default(), CameraController::default());
        FrameContext::new(camera, ModelStats::default())
    }

    #[test]
    fn test_skipped_frame_is_ended_before_the_next_one() {
        let mut context = headless_context();
        let mut viewer = frame_context();

        // Frame built, then the surface had nothing to draw onto
        settings_panel(context.frame(), &mut viewer);
        let mut pending = true;
        end_pending_frame(&mut context, &mut pending);
        assert!(!pending);

        settings_panel(context.frame(), &mut viewer);
        let draw_data = context.render();
        assert!(draw_data.draw_lists_count() > 0);
    }

    #[test]
    fn test_end_pending_frame_without_frame_is_noop() {
        let mut context = headless_context();
        let mut pending = false;

        end_pending_frame(&mut context, &mut pending);
        assert!(!pending);

        let _ = context.frame();
        context.render();
    }
}
