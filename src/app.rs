use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::config::ViewerConfig;
use crate::gfx::{
    camera::{CameraController, CameraManager, FlyCamera},
    rendering::{FrameContext, RenderEngine},
    scene::{Model, ModelStats},
};
use crate::ui::{settings_panel, UiManager};

/// The viewer application: owns the event loop and everything it drives
pub struct ViewerApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    config: ViewerConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    model: Model,
    context: FrameContext,
}

impl ViewerApp {
    pub fn new(config: ViewerConfig) -> anyhow::Result<Self> {
        let event_loop = EventLoop::new().context("Failed to create event loop")?;

        let controller = CameraController::new(config.look_sensitivity);
        let camera_manager = CameraManager::new(FlyCamera::default(), controller);
        let context = FrameContext::new(camera_manager, ModelStats::default());
        let model = Model::empty(config.asset_path.parent().unwrap_or(&config.asset_path));

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                config,
                window: None,
                render_engine: None,
                ui_manager: None,
                model,
                context,
            },
        })
    }

    /// Runs the event loop until Escape or the window is closed
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = self
            .event_loop
            .take()
            .context("Event loop already consumed")?;
        event_loop.set_control_flow(ControlFlow::Poll);

        event_loop
            .run_app(&mut self.app_state)
            .context("Failed to run event loop")
    }
}

impl AppState {
    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let attributes = WindowAttributes::default()
            .with_title(self.config.title.clone())
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .context("Failed to create window")?,
        );

        let (width, height) = window.inner_size().into();
        let render_engine = pollster::block_on(RenderEngine::new(
            window.clone(),
            width,
            height,
            &self.config,
        ))?;

        self.model = Model::load(
            &self.config.asset_path,
            render_engine.device(),
            render_engine.queue(),
        );
        self.context.model_stats = self.model.stats();
        log::info!(
            "Loaded {:?}: {:?}",
            self.config.asset_path,
            self.context.model_stats
        );

        let ui_manager = UiManager::new(
            render_engine.device(),
            render_engine.queue(),
            render_engine.surface_format(),
            &window,
        );

        self.window = Some(window);
        self.render_engine = Some(render_engine);
        self.ui_manager = Some(ui_manager);
        Ok(())
    }

    fn redraw(&mut self) {
        let (Some(render_engine), Some(window)) = (self.render_engine.as_mut(), self.window.as_ref())
        else {
            return;
        };

        self.context.update(Instant::now());

        // The panel is built before recording so its edits land in this frame
        let ui_ready = match self.ui_manager.as_mut() {
            Some(ui_manager) => {
                let context = &mut self.context;
                ui_manager.update_logic(window, |ui| settings_panel(ui, context))
            }
            None => false,
        };

        let fovy = self
            .config
            .field_of_view(self.context.camera.camera.zoom());
        let ui_manager = self.ui_manager.as_mut();
        let presented = render_engine.render_frame(
            &mut self.context,
            &self.model,
            fovy,
            |device, queue, encoder, view| {
                if let (true, Some(ui_manager)) = (ui_ready, ui_manager) {
                    ui_manager.render_display_only(device, queue, encoder, view);
                }
            },
        );

        // A skipped surface frame never ran the overlay callback
        if !presented {
            if let Some(ui_manager) = self.ui_manager.as_mut() {
                ui_manager.discard_frame();
            }
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.init_graphics(event_loop) {
            log::error!("Failed to initialise graphics: {:#}", e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.as_ref() else {
            return;
        };

        // The overlay sees input first
        let mouse_captured = match self.ui_manager.as_mut() {
            Some(ui_manager) => {
                ui_manager.handle_window_event(window, window_id, &event);
                ui_manager.wants_mouse()
            }
            None => false,
        };
        self.context
            .camera
            .process_window_event(&event, mouse_captured);

        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            }
            | WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
                if let Some(ui_manager) = self.ui_manager.as_mut() {
                    ui_manager.update_display_size(width, height);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
