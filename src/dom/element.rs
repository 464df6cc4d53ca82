use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Value data of a DOM element node.
///
/// Topology (parent/children) lives in the [`Document`](crate::dom::Document)
/// arena; an `ElementNode` only carries what the pipeline reads and writes:
/// tag name, text content, attributes and layout geometry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementNode {
    /// HTML tag name (e.g., "h1", "p", "div")
    pub tag_name: String,

    /// Element attributes (e.g., id, class)
    #[serde(default)]
    pub attributes: HashMap<String, String>,

    /// Text content of the element
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,

    /// Layout geometry in document coordinates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

/// Bounding box coordinates for an element, in document coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementNode {
    /// Create a new ElementNode
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            attributes: HashMap::new(),
            text_content: None,
            bounding_box: None,
        }
    }

    /// Builder method: set text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    /// Builder method: set the class attribute
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.attributes.insert("class".to_string(), class.into());
        self
    }

    /// Builder method: set bounding box
    pub fn with_bounding_box(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.bounding_box = Some(BoundingBox {
            x,
            y,
            width,
            height,
        });
        self
    }

    /// Add a single attribute
    pub fn add_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Get attribute value by key
    pub fn get_attribute(&self, key: &str) -> Option<&String> {
        self.attributes.get(key)
    }

    /// Check if element has a specific class
    pub fn has_class(&self, class_name: &str) -> bool {
        if let Some(classes) = self.attributes.get("class") {
            classes.split_whitespace().any(|c| c == class_name)
        } else {
            false
        }
    }

    /// Add a class to the class attribute (no-op if already present)
    pub fn add_class(&mut self, class_name: &str) {
        if self.has_class(class_name) {
            return;
        }
        let classes = self.attributes.entry("class".to_string()).or_default();
        if classes.is_empty() {
            classes.push_str(class_name);
        } else {
            classes.push(' ');
            classes.push_str(class_name);
        }
    }

    /// Remove a class from the class attribute
    pub fn remove_class(&mut self, class_name: &str) {
        if let Some(classes) = self.attributes.get_mut("class") {
            *classes = classes
                .split_whitespace()
                .filter(|c| *c != class_name)
                .collect::<Vec<_>>()
                .join(" ");
        }
    }

    /// Check if element is a specific tag (case-insensitive, as in HTML)
    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag)
    }

    /// Trimmed text content, `None` when empty or absent
    pub fn trimmed_text(&self) -> Option<&str> {
        self.text_content
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

impl BoundingBox {
    /// Create a new BoundingBox
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Calculate the area of the bounding box
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Expand the box by `margin` on every side
    pub fn expanded(&self, margin: f64) -> BoundingBox {
        BoundingBox {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + margin * 2.0,
            height: self.height + margin * 2.0,
        }
    }

    /// Shift the box by the given offset
    pub fn translated(&self, dx: f64, dy: f64) -> BoundingBox {
        BoundingBox {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Overlapping region with another box, if any
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        if x2 > x1 && y2 > y1 {
            Some(BoundingBox::new(x1, y1, x2 - x1, y2 - y1))
        } else {
            None
        }
    }

    /// Fraction of this box's area that lies inside `within` (0.0..=1.0).
    /// Zero-area boxes report 0.0.
    pub fn visible_fraction(&self, within: &BoundingBox) -> f64 {
        let area = self.area();
        if area <= 0.0 {
            return 0.0;
        }
        self.intersection(within)
            .map(|i| i.area() / area)
            .unwrap_or(0.0)
    }
}
