//! Editable lighting, material and shading state

use cgmath::Vector3;

/// The single point light, in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightProperties {
    pub position: [f32; 3],
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
}

impl Default for LightProperties {
    fn default() -> Self {
        Self {
            position: [0.3, 3.0, 1.5],
            ambient: [0.1, 0.1, 0.1],
            diffuse: [0.5, 0.5, 0.5],
            specular: [1.0, 1.0, 1.0],
        }
    }
}

impl LightProperties {
    pub fn position_vector(&self) -> Vector3<f32> {
        Vector3::from(self.position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialSettings {
    pub shininess: f32,
}

impl MaterialSettings {
    pub const SHININESS_RANGE: (f32, f32) = (0.0, 256.0);
}

impl Default for MaterialSettings {
    fn default() -> Self {
        Self { shininess: 32.0 }
    }
}

/// Fragment shading model applied to the loaded model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShaderVariant {
    #[default]
    Phong,
    CoolToWarm,
}

impl ShaderVariant {
    pub fn toggled(self) -> Self {
        match self {
            ShaderVariant::Phong => ShaderVariant::CoolToWarm,
            ShaderVariant::CoolToWarm => ShaderVariant::Phong,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShaderVariant::Phong => "Phong",
            ShaderVariant::CoolToWarm => "Cool To Warm",
        }
    }
}

/// Current variant plus a pending-rebuild flag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShaderVariantState {
    variant: ShaderVariant,
    changed: bool,
}

impl ShaderVariantState {
    pub fn variant(&self) -> ShaderVariant {
        self.variant
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Switches variant and marks the program for rebuilding
    pub fn toggle(&mut self) {
        self.variant = self.variant.toggled();
        self.changed = true;
    }

    /// Returns the variant to rebuild with, clearing the flag
    pub fn take_change(&mut self) -> Option<ShaderVariant> {
        std::mem::take(&mut self.changed).then_some(self.variant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_flags_change_once() {
        let mut state = ShaderVariantState::default();
        assert_eq!(state.take_change(), None);

        state.toggle();
        assert!(state.is_changed());
        assert_eq!(state.take_change(), Some(ShaderVariant::CoolToWarm));
        assert_eq!(state.take_change(), None);

        state.toggle();
        assert_eq!(state.take_change(), Some(ShaderVariant::Phong));
    }

    #[test]
    fn test_double_toggle_before_frame_still_rebuilds() {
        let mut state = ShaderVariantState::default();
        state.toggle();
        state.toggle();
        assert_eq!(state.take_change(), Some(ShaderVariant::Phong));
    }

    #[test]
    fn test_light_defaults() {
        let light = LightProperties::default();
        assert_eq!(light.position, [0.3, 3.0, 1.5]);
        assert_eq!(light.specular, [1.0, 1.0, 1.0]);
    }
}
