use std::collections::BTreeMap;

use crate::blend::mode::BlendMode;
use crate::foundation::core::{LayerId, Point, Vec2};
use crate::raster::buffer::PixelBuffer;

/// Free-form provenance data carried by layers and documents. Opaque to compositing.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// A single image element placed on a document canvas.
///
/// `Layer` is a value: builders and [`crate::update_layer`] return new layers, and pixel data is
/// shared between copies until one of them is written.
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    layer_id: LayerId,
    name: String,
    image: Option<PixelBuffer>,
    position: Point,
    anchor: Vec2,
    opacity: f32,
    visible: bool,
    blend_mode: BlendMode,
    metadata: Metadata,
}

impl Layer {
    /// Create an unassigned, fully opaque, visible, top-left anchored layer at the origin.
    ///
    /// RGB images gain an opaque alpha channel.
    pub fn new(name: impl Into<String>, image: PixelBuffer) -> Self {
        Self::with_image_slot(name.into(), Some(image.to_rgba()))
    }

    /// Create a layer whose pixel data is not available.
    ///
    /// Such layers stay in the document but are skipped by the compositor.
    pub fn without_image(name: impl Into<String>) -> Self {
        Self::with_image_slot(name.into(), None)
    }

    fn with_image_slot(name: String, image: Option<PixelBuffer>) -> Self {
        Self {
            layer_id: LayerId::UNASSIGNED,
            name,
            image,
            position: Point::ZERO,
            anchor: Vec2::ZERO,
            opacity: 1.0,
            visible: true,
            blend_mode: BlendMode::Normal,
            metadata: Metadata::new(),
        }
    }

    /// Rename the layer.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Replace the pixel data. RGB images gain an opaque alpha channel.
    pub fn with_image(mut self, image: PixelBuffer) -> Self {
        self.image = Some(image.to_rgba());
        self
    }

    /// Set the layer ID. `Document::add_layer` replaces it with the ID it assigns.
    pub fn with_id(mut self, id: LayerId) -> Self {
        self.layer_id = id;
        self
    }

    /// Set the position of the anchor point, in canvas pixels.
    pub fn with_position(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    /// Set the anchor as a fraction of the image size; `(0, 0)` is top-left.
    pub fn with_anchor(mut self, anchor: Vec2) -> Self {
        self.anchor = anchor;
        self
    }

    /// Set opacity. Values outside `[0, 1]` are kept as given and clamped when compositing.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    /// Show or hide the layer.
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Set the blend mode.
    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    /// Replace the whole metadata bag.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Insert one metadata entry.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Layer ID; [`LayerId::UNASSIGNED`] until a document assigns one.
    pub fn layer_id(&self) -> LayerId {
        self.layer_id
    }

    /// Layer name. Names need not be unique.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// RGBA pixel data, or `None` when the image is missing.
    pub fn image(&self) -> Option<&PixelBuffer> {
        self.image.as_ref()
    }

    /// Anchor point position in canvas pixels.
    pub fn position(&self) -> Point {
        self.position
    }

    /// Anchor as a fraction of the image size.
    pub fn anchor(&self) -> Vec2 {
        self.anchor
    }

    /// Opacity as stored; compositing clamps it to `[0, 1]`.
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Whether the layer is drawn.
    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Blend mode used when compositing.
    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    /// Free-form layer metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// `(width, height)` of the image; `(0, 0)` when the image is missing.
    pub fn size(&self) -> (u32, u32) {
        self.image.as_ref().map_or((0, 0), PixelBuffer::dimensions)
    }

    /// Top-left paste origin in canvas coordinates, before rounding.
    pub fn origin(&self) -> Point {
        let (w, h) = self.size();
        Point::new(
            self.position.x - f64::from(w) * self.anchor.x,
            self.position.y - f64::from(h) * self.anchor.y,
        )
    }

    /// Summary suitable for listings.
    pub fn info(&self) -> LayerInfo {
        let (width, height) = self.size();
        LayerInfo {
            layer_id: self.layer_id,
            name: self.name.clone(),
            x: self.position.x,
            y: self.position.y,
            width,
            height,
            anchor: [self.anchor.x, self.anchor.y],
            opacity: self.opacity,
            visible: self.visible,
            blend_mode: self.blend_mode,
            has_image: self.image.is_some(),
        }
    }
}

/// Flat, serializable description of a layer without its pixels.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct LayerInfo {
    /// Layer ID.
    pub layer_id: LayerId,
    /// Layer name.
    pub name: String,
    /// Anchor point x in canvas pixels.
    pub x: f64,
    /// Anchor point y in canvas pixels.
    pub y: f64,
    /// Image width, `0` without an image.
    pub width: u32,
    /// Image height, `0` without an image.
    pub height: u32,
    /// Anchor as `[x, y]` fractions of the image size.
    pub anchor: [f64; 2],
    /// Stored opacity.
    pub opacity: f32,
    /// Visibility flag.
    pub visible: bool,
    /// Blend mode.
    pub blend_mode: BlendMode,
    /// Whether the layer carries pixel data.
    pub has_image: bool,
}

#[cfg(test)]
#[path = "../../tests/unit/document/layer.rs"]
mod tests;
