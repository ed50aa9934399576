use model::FeatureStyle;
use render::Paint;

pub const DEFAULT_COLOR: &str = "#4F46E5";

/// Paint values used when a feature's style leaves an option out.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PaintDefaults {
    pub color: &'static str,
    pub point_radius: f64,
    pub point_opacity: f64,
    pub line_width: f64,
    pub line_opacity: f64,
    pub fill_opacity: f64,
    pub outline_width: f64,
}

impl PaintDefaults {
    pub const fn new() -> Self {
        Self {
            color: DEFAULT_COLOR,
            point_radius: 8.0,
            point_opacity: 0.8,
            line_width: 2.0,
            line_opacity: 1.0,
            fill_opacity: 0.3,
            outline_width: 2.0,
        }
    }

    pub fn circle(&self, style: &FeatureStyle) -> Paint {
        Paint::Circle {
            radius: style.radius.unwrap_or(self.point_radius),
            color: style.color.as_deref().unwrap_or(self.color).to_string(),
            opacity: style.opacity.unwrap_or(self.point_opacity),
        }
    }

    pub fn line(&self, style: &FeatureStyle) -> Paint {
        Paint::Line {
            color: style.stroke().unwrap_or(self.color).to_string(),
            width: style.stroke_weight().unwrap_or(self.line_width),
            opacity: style.opacity.unwrap_or(self.line_opacity),
        }
    }

    pub fn fill(&self, style: &FeatureStyle) -> Paint {
        Paint::Fill {
            color: style.fill_color.as_deref().unwrap_or(self.color).to_string(),
            opacity: style.fill_opacity.unwrap_or(self.fill_opacity),
        }
    }

    pub fn outline(&self, style: &FeatureStyle) -> Paint {
        Paint::Line {
            color: style.stroke().unwrap_or(self.color).to_string(),
            width: style.stroke_weight().unwrap_or(self.outline_width),
            opacity: style.opacity.unwrap_or(self.line_opacity),
        }
    }
}

impl Default for PaintDefaults {
    fn default() -> Self {
        Self::new()
    }
}
