use std::{collections::BTreeMap, sync::Arc};

use serde::Serialize;

use crate::domain::word::WordItem;

/// Bare element produced by the construction hook before layout styles are applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementShell {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub classes: Vec<String>,
}

impl ElementShell {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            classes: Vec::new(),
        }
    }
}

pub type ElementFactory = Arc<dyn Fn(&WordItem) -> ElementShell + Send + Sync>;

pub fn default_element_factory() -> ElementFactory {
    Arc::new(|_item: &WordItem| ElementShell::new("a"))
}

/// Absolutely positioned text element appended to a container.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyledElement {
    #[serde(flatten)]
    pub shell: ElementShell,
    pub text: String,
    pub font: String,
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    pub line_height: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl StyledElement {
    pub fn css_text(&self) -> String {
        let transform = self
            .scale
            .map(|s| format!(" scale({s})"))
            .unwrap_or_default();
        let mut css = format!(
            "font: {}; left: {}px; top: {}px; width: {}px; height: {}px; line-height: {}px; transform: {transform}; -webkit-transform: {transform}; -ms-transform: {transform};",
            self.font, self.left, self.top, self.width, self.height, self.line_height
        );
        if let Some(color) = &self.color {
            css.push_str(&format!(" color: {color};"));
        }
        css
    }
}

/// Non-raster target: collects styled elements in append order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ElementContainer {
    pub width: u32,
    pub height: u32,
    pub position: Option<String>,
    pub elements: Vec<StyledElement>,
}

impl ElementContainer {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            position: None,
            elements: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.elements.clear();
        self.position = Some("relative".to_string());
    }

    pub fn append(&mut self, element: StyledElement) {
        self.elements.push(element);
    }

    /// Pretty JSON of the container, each element carrying its inline `style`.
    pub fn to_json(&self) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct Styled<'a> {
            #[serde(flatten)]
            element: &'a StyledElement,
            style: String,
        }

        #[derive(Serialize)]
        struct Document<'a> {
            width: u32,
            height: u32,
            position: Option<&'a str>,
            elements: Vec<Styled<'a>>,
        }

        serde_json::to_string_pretty(&Document {
            width: self.width,
            height: self.height,
            position: self.position.as_deref(),
            elements: self
                .elements
                .iter()
                .map(|element| Styled {
                    element,
                    style: element.css_text(),
                })
                .collect(),
        })
    }
}
