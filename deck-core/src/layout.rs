//! Named slide layouts.
//!
//! A layout maps roles (`title`, `content`, `image`, ...) to placement
//! templates. Roles keep their declaration order, which becomes stacking
//! order when a slide is instantiated from the layout.

use serde::{Deserialize, Serialize};

use crate::layer::{LayerTemplate, TextAlign};

/// A named set of role placements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutTemplate {
    /// Layout name.
    pub name: String,
    roles: Vec<(String, LayerTemplate)>,
}

impl LayoutTemplate {
    /// Create an empty layout.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roles: Vec::new(),
        }
    }

    /// Add a role placement.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>, template: LayerTemplate) -> Self {
        self.roles.push((role.into(), template));
        self
    }

    /// Roles in declaration order.
    pub fn roles(&self) -> impl Iterator<Item = (&str, &LayerTemplate)> {
        self.roles.iter().map(|(role, t)| (role.as_str(), t))
    }

    /// Look up a role's placement.
    #[must_use]
    pub fn role(&self, role: &str) -> Option<&LayerTemplate> {
        self.roles.iter().find(|(r, _)| r == role).map(|(_, t)| t)
    }
}

/// Names of the built-in layouts.
pub const BUILTIN_LAYOUTS: [&str; 5] = [
    "title_slide",
    "title_and_content",
    "image_right_text_left",
    "image_left_text_right",
    "image_top_text_bottom",
];

fn text(x: f32, y: f32, width: f32, height: f32, font_size: f32, align: TextAlign) -> LayerTemplate {
    LayerTemplate {
        font_size: Some(font_size),
        text_align: Some(align),
        ..LayerTemplate::at(x, y, width, height)
    }
}

/// Look up a built-in layout by name.
#[must_use]
pub fn builtin(name: &str) -> Option<LayoutTemplate> {
    let layout = LayoutTemplate::new(name);
    let layout = match name {
        "title_slide" => layout
            .with_role("title", text(10.0, 30.0, 80.0, 20.0, 72.0, TextAlign::Center))
            .with_role("subtitle", text(10.0, 55.0, 80.0, 15.0, 36.0, TextAlign::Center)),
        "title_and_content" => layout
            .with_role("title", text(5.0, 5.0, 90.0, 15.0, 48.0, TextAlign::Left))
            .with_role("content", text(5.0, 25.0, 90.0, 70.0, 24.0, TextAlign::Left)),
        "image_right_text_left" => layout
            .with_role("text", text(5.0, 15.0, 40.0, 70.0, 24.0, TextAlign::Left))
            .with_role("image", LayerTemplate::at(50.0, 10.0, 45.0, 80.0)),
        "image_left_text_right" => layout
            .with_role("image", LayerTemplate::at(5.0, 10.0, 45.0, 80.0))
            .with_role("text", text(55.0, 15.0, 40.0, 70.0, 24.0, TextAlign::Left)),
        "image_top_text_bottom" => layout
            .with_role("image", LayerTemplate::at(10.0, 5.0, 80.0, 55.0))
            .with_role("text", text(10.0, 65.0, 80.0, 30.0, 24.0, TextAlign::Left)),
        _ => return None,
    };
    Some(layout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_builtins_resolve() {
        for name in BUILTIN_LAYOUTS {
            let layout = builtin(name).expect("builtin");
            assert_eq!(layout.name, name);
            assert_eq!(layout.roles().count(), 2);
        }
        assert!(builtin("nope").is_none());
    }

    #[test]
    fn test_title_slide_placements() {
        let layout = builtin("title_slide").expect("builtin");
        let title = layout.role("title").expect("title role");
        assert_eq!(title.font_size, Some(72.0));
        assert_eq!(title.text_align, Some(TextAlign::Center));
        assert_eq!(title.y, Some(30.0));
    }
}
