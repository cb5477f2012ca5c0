// src/ui/panel.rs
//! Settings panel shown over the rendered model

use crate::gfx::rendering::FrameContext;
use crate::gfx::scene::{LightProperties, MaterialSettings, ModelStats, ShaderVariantState};

const LIGHT_POSITION_RANGE: (f32, f32) = (-10.0, 10.0);

/// Builds the "Settings" window editing `context` in place.
///
/// The panel is built before the frame is recorded, so edits apply to the
/// same frame. A shader toggle is picked up by the renderer's rebuild check
/// later in that frame.
pub fn settings_panel(ui: &imgui::Ui, context: &mut FrameContext) {
    ui.window("Settings")
        .size([420.0, 460.0], imgui::Condition::FirstUseEver)
        .position([20.0, 20.0], imgui::Condition::FirstUseEver)
        .resizable(true)
        .collapsible(true)
        .build(|| {
            render_lighting_controls(ui, &mut context.light);
            render_material_controls(ui, &mut context.material);

            let framerate = ui.io().framerate;
            ui.text(format!(
                "Application average {:.3} ms/frame ({:.1} FPS)",
                1000.0 / framerate.max(f32::EPSILON),
                framerate
            ));

            render_shader_controls(ui, &mut context.shader);
            render_model_info(ui, &context.model_stats);
        });
}

fn render_lighting_controls(ui: &imgui::Ui, light: &mut LightProperties) {
    if ui.collapsing_header("Lighting Controls", imgui::TreeNodeFlags::DEFAULT_OPEN) {
        ui.slider_config(
            "Light Position",
            LIGHT_POSITION_RANGE.0,
            LIGHT_POSITION_RANGE.1,
        )
        .build_array(&mut light.position);
        ui.color_edit3("Ambient", &mut light.ambient);
        ui.color_edit3("Diffuse", &mut light.diffuse);
        ui.color_edit3("Specular", &mut light.specular);
    }
}

fn render_material_controls(ui: &imgui::Ui, material: &mut MaterialSettings) {
    if ui.collapsing_header("Material Controls", imgui::TreeNodeFlags::DEFAULT_OPEN) {
        let (min, max) = MaterialSettings::SHININESS_RANGE;
        ui.slider("Material shininess", min, max, &mut material.shininess);
    }
}

fn render_shader_controls(ui: &imgui::Ui, shader: &mut ShaderVariantState) {
    if ui.collapsing_header(
        "Shader Controls (Default: Phong)",
        imgui::TreeNodeFlags::DEFAULT_OPEN,
    ) {
        if ui.button("Toggle Cool To Warm Shading") {
            shader.toggle();
        }
        ui.same_line();
        ui.text(format!("Active: {}", shader.variant().name()));
    }
}

fn render_model_info(ui: &imgui::Ui, stats: &ModelStats) {
    if ui.collapsing_header("Model", imgui::TreeNodeFlags::empty()) {
        ui.text(format!("Meshes: {}", stats.meshes));
        ui.text(format!("Vertices: {}", stats.vertices));
        ui.text(format!("Triangles: {}", stats.triangles));
        ui.text(format!("Textures: {}", stats.textures));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::{CameraController, CameraManager, FlyCamera};
    use crate::gfx::scene::ShaderVariant;

    fn headless_context() -> imgui::Context {
        let mut context = imgui::Context::create();
        context.set_ini_filename(None);
        context.io_mut().display_size = [1600.0, 900.0];
        context.fonts().build_rgba32_texture();
        context
    }

    #[test]
    fn test_panel_keeps_pending_toggle_for_the_same_frame() {
        let mut imgui = headless_context();
        let camera = CameraManager::new(FlyCamera::default(), CameraController::default());
        let mut context = FrameContext::new(camera, ModelStats::default());
        let light = context.light;

        context.shader.toggle();
        settings_panel(imgui.frame(), &mut context);
        imgui.render();

        assert_eq!(context.light, light);
        assert_eq!(context.shader.take_change(), Some(ShaderVariant::CoolToWarm));
    }
}
