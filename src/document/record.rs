//! JSON-facing document and layer records.
//!
//! Records are the one place that knows about older field layouts. Geometry is resolved once,
//! on ingestion, in this order:
//!
//! 1. `position` (with optional `size`)
//! 2. `bbox` as `[left, top, right, bottom]`
//! 3. flat `x` / `y` / `width` / `height`
//!
//! `anchor` defaults to `(0, 0)` when absent.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::assets::store::{LayerImageStore, normalize_rel_path};
use crate::blend::mode::BlendMode;
use crate::document::doc::{Diagnostic, Document, Severity};
use crate::document::layer::{Layer, Metadata};
use crate::foundation::core::{Canvas, LayerId, Point, Vec2};
use crate::foundation::error::{StrataError, StrataResult};
use crate::raster::buffer::{Channels, sample_len};

/// Version string written into new manifests.
pub const RECORD_VERSION: &str = "1.0";

/// File name used by [`Document::write_manifest`].
pub const MANIFEST_FILE: &str = "document.json";

/// `[x, y]` or `{ "x": .., "y": .. }`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct XyDef {
    /// Horizontal component.
    pub x: f64,
    /// Vertical component.
    pub y: f64,
}

impl Serialize for XyDef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        [self.x, self.y].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for XyDef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Arr([f64; 2]),
            Obj { x: f64, y: f64 },
        }

        match Repr::deserialize(deserializer)? {
            Repr::Arr([x, y]) => Ok(Self { x, y }),
            Repr::Obj { x, y } => Ok(Self { x, y }),
        }
    }
}

/// `[width, height]` or `{ "width": .., "height": .. }`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SizeDef {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl SizeDef {
    fn to_pixels(self, what: &str) -> StrataResult<(u32, u32)> {
        let dim = |v: f64, axis: &str| -> StrataResult<u32> {
            if !v.is_finite() || v < 0.0 || v > f64::from(u32::MAX) {
                return Err(StrataError::invalid_geometry(format!(
                    "{what} {axis} {v} is not a valid pixel count"
                )));
            }
            Ok(v.round() as u32)
        };
        Ok((dim(self.width, "width")?, dim(self.height, "height")?))
    }
}

impl Serialize for SizeDef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        [self.width, self.height].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SizeDef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Arr([f64; 2]),
            Obj { width: f64, height: f64 },
        }

        match Repr::deserialize(deserializer)? {
            Repr::Arr([width, height]) => Ok(Self { width, height }),
            Repr::Obj { width, height } => Ok(Self { width, height }),
        }
    }
}

fn default_version() -> String {
    RECORD_VERSION.to_string()
}

fn default_opacity() -> f32 {
    1.0
}

fn default_visible() -> bool {
    true
}

fn default_blend_mode() -> String {
    BlendMode::Normal.as_str().to_string()
}

/// Serialized document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// A fresh ID is generated on load when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    /// Manifest format version.
    #[serde(default = "default_version")]
    pub version: String,
    /// Canvas size; must be non-negative and finite.
    pub canvas_size: SizeDef,
    /// Layer records in file order.
    #[serde(default)]
    pub layers: Vec<LayerRecord>,
    /// Free-form document metadata.
    #[serde(default)]
    pub metadata: Metadata,
}

/// Serialized layer, accepting current and legacy geometry fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRecord {
    /// Layer ID; negative or absent means "assign on load".
    #[serde(default)]
    pub layer_id: LayerId,
    /// Layer name.
    #[serde(default)]
    pub name: String,
    /// Image file relative to the manifest directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,

    /// Anchor point position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<XyDef>,
    /// Declared image size, advisory only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<SizeDef>,
    /// Anchor fractions; `(0, 0)` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<XyDef>,

    /// Legacy `[left, top, right, bottom]` placement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,
    /// Legacy left edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// Legacy top edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// Legacy width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Legacy height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,

    /// Opacity, `1.0` when absent.
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    /// Visibility, `true` when absent.
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Any spelling accepted by [`BlendMode::parse_lenient`]; unknown names load as normal.
    #[serde(default = "default_blend_mode")]
    pub blend_mode: String,
    /// Free-form layer metadata.
    #[serde(default)]
    pub metadata: Metadata,
}

/// Placement resolved from whichever geometry fields a record carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedGeometry {
    /// Anchor point position.
    pub position: Point,
    /// Declared size, if the record states one.
    pub size: Option<(u32, u32)>,
    /// Anchor fractions.
    pub anchor: Vec2,
}

impl LayerRecord {
    /// Resolve placement with the fixed legacy priority.
    ///
    /// Fails with [`StrataError::InvalidGeometry`] when the declared size is negative or not
    /// finite, as an inverted `bbox` is.
    pub fn resolve_geometry(&self) -> StrataResult<ResolvedGeometry> {
        let (position, size, anchor) = self.placement();
        let size = size
            .map(|s| s.to_pixels(&format!("layer '{}' size", self.name)))
            .transpose()?;
        Ok(ResolvedGeometry {
            position,
            size,
            anchor,
        })
    }

    fn placement(&self) -> (Point, Option<SizeDef>, Vec2) {
        let anchor = self
            .anchor
            .map_or(Vec2::ZERO, |a| Vec2::new(a.x, a.y));

        let (position, size) = if let Some(p) = self.position {
            (Point::new(p.x, p.y), self.size)
        } else if let Some([l, t, r, b]) = self.bbox {
            (
                Point::new(l, t),
                Some(SizeDef {
                    width: r - l,
                    height: b - t,
                }),
            )
        } else if self.x.is_some() || self.y.is_some() {
            let size = match (self.width, self.height) {
                (None, None) => None,
                (w, h) => Some(SizeDef {
                    width: w.unwrap_or(0.0),
                    height: h.unwrap_or(0.0),
                }),
            };
            (
                Point::new(self.x.unwrap_or(0.0), self.y.unwrap_or(0.0)),
                size,
            )
        } else {
            (Point::ZERO, self.size)
        };
        (position, size, anchor)
    }

    /// Build the in-memory layer, loading pixels through `store`.
    ///
    /// One bad record never fails a document load. A declared size is advisory, so an invalid
    /// one is dropped with a warning. An image path that is unsafe, unreadable or undecodable
    /// leaves the layer without pixels; the compositor then skips it and
    /// [`DocumentRecord::diagnose`] / [`Document::diagnose`] report it.
    pub fn to_layer(&self, store: &LayerImageStore) -> Layer {
        let declared = match self.resolve_geometry() {
            Ok(g) => g.size,
            Err(error) => {
                tracing::warn!(name = %self.name, %error, "ignoring invalid declared layer size");
                None
            }
        };
        let (position, _, anchor) = self.placement();

        let layer = match &self.image_path {
            None => Layer::without_image(self.name.clone()),
            Some(rel) => match normalize_rel_path(rel).and_then(|rel| store.load(&rel)) {
                Ok(img) => {
                    if let Some(declared) = declared
                        && declared != img.dimensions()
                    {
                        tracing::warn!(
                            name = %self.name,
                            declared = ?declared,
                            actual = ?img.dimensions(),
                            "declared layer size differs from image; using image size"
                        );
                    }
                    Layer::new(self.name.clone(), img)
                }
                Err(error) => {
                    tracing::warn!(name = %self.name, %error, "layer image unavailable");
                    Layer::without_image(self.name.clone())
                }
            },
        };

        layer
            .with_id(self.layer_id)
            .with_position(position)
            .with_anchor(anchor)
            .with_opacity(self.opacity)
            .with_visible(self.visible)
            .with_blend_mode(BlendMode::parse_or_normal(&self.blend_mode))
            .with_metadata(self.metadata.clone())
    }

    /// Record for `layer` in the current field layout.
    pub fn from_layer(layer: &Layer, image_path: Option<String>) -> Self {
        let (w, h) = layer.size();
        let p = layer.position();
        let a = layer.anchor();
        Self {
            layer_id: layer.layer_id(),
            name: layer.name().to_string(),
            image_path,
            position: Some(XyDef { x: p.x, y: p.y }),
            size: Some(SizeDef {
                width: f64::from(w),
                height: f64::from(h),
            }),
            anchor: Some(XyDef { x: a.x, y: a.y }),
            bbox: None,
            x: None,
            y: None,
            width: None,
            height: None,
            opacity: layer.opacity(),
            visible: layer.visible(),
            blend_mode: layer.blend_mode().as_str().to_string(),
            metadata: layer.metadata().clone(),
        }
    }
}

impl DocumentRecord {
    /// Parse a record from JSON.
    pub fn from_reader<R: std::io::Read>(r: R) -> StrataResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| StrataError::serde(format!("parse document JSON: {e}")))
    }

    /// Open and parse a JSON manifest.
    pub fn from_path(path: impl AsRef<Path>) -> StrataResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            StrataError::validation(format!("open document JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Pretty-printed JSON.
    pub fn to_json_pretty(&self) -> StrataResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| StrataError::serde(format!("serialize document JSON: {e}")))
    }

    /// Structural findings on raw record data, before any conversion.
    pub fn diagnose(&self) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        let (w, h) = (self.canvas_size.width, self.canvas_size.height);
        if !(w.is_finite() && h.is_finite()) || w < 0.0 || h < 0.0 {
            out.push(Diagnostic::document(
                Severity::Error,
                format!("canvas size {w}x{h} is invalid"),
            ));
        } else if w < 1.0 || h < 1.0 {
            out.push(Diagnostic::document(
                Severity::Warning,
                format!("canvas is {w}x{h}; renders will be empty"),
            ));
        }

        let mut seen = BTreeSet::new();
        for layer in &self.layers {
            let id = layer.layer_id;
            if !id.is_assigned() {
                out.push(Diagnostic::document(
                    Severity::Info,
                    format!("layer '{}' has no id and will be assigned one", layer.name),
                ));
            } else if !seen.insert(id) {
                out.push(Diagnostic::layer(Severity::Error, id, "duplicate layer id"));
            }
            match &layer.image_path {
                None => out.push(Diagnostic::layer(Severity::Error, id, "image_path missing")),
                Some(rel) => {
                    if let Err(e) = normalize_rel_path(rel) {
                        out.push(Diagnostic::layer(Severity::Error, id, e.to_string()));
                    }
                }
            }
            if !(0.0..=1.0).contains(&layer.opacity) {
                out.push(Diagnostic::layer(
                    Severity::Warning,
                    id,
                    format!("opacity {} outside [0, 1]", layer.opacity),
                ));
            }
            if BlendMode::parse_lenient(&layer.blend_mode).is_none() {
                out.push(Diagnostic::layer(
                    Severity::Warning,
                    id,
                    format!("unsupported blend mode '{}' loads as normal", layer.blend_mode),
                ));
            }
            match layer.resolve_geometry() {
                Ok(g) => {
                    if !(0.0..=1.0).contains(&g.anchor.x) || !(0.0..=1.0).contains(&g.anchor.y) {
                        out.push(Diagnostic::layer(
                            Severity::Warning,
                            id,
                            format!("anchor ({}, {}) outside [0, 1]", g.anchor.x, g.anchor.y),
                        ));
                    }
                    if !g.position.x.is_finite() || !g.position.y.is_finite() {
                        out.push(Diagnostic::layer(
                            Severity::Error,
                            id,
                            "position is not finite",
                        ));
                    }
                }
                Err(e) => out.push(Diagnostic::layer(Severity::Error, id, e.to_string())),
            }
        }
        out
    }
}

impl Document {
    /// Build a document from a record, loading layer images from `store`.
    ///
    /// Only document-level problems fail the load: an invalid or oversized canvas, or two
    /// layers with the same assigned ID. Per-layer problems are handled by
    /// [`LayerRecord::to_layer`].
    #[tracing::instrument(skip(record, store), fields(layers = record.layers.len()))]
    pub fn from_record(record: &DocumentRecord, store: &LayerImageStore) -> StrataResult<Self> {
        let (w, h) = record.canvas_size.to_pixels("canvas")?;
        sample_len(w, h, Channels::Rgba)?;
        let layers = record.layers.iter().map(|l| l.to_layer(store)).collect();
        let id = record
            .document_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Document::from_parts(id, Canvas::new(w, h), layers, record.metadata.clone())
    }

    /// Record for this document. Each layer with pixels references `{image_dir}/{layer_id}.png`.
    pub fn to_record(&self, image_dir: &str) -> DocumentRecord {
        let dir = image_dir.trim_end_matches('/');
        DocumentRecord {
            document_id: Some(self.document_id().to_string()),
            version: RECORD_VERSION.to_string(),
            canvas_size: SizeDef {
                width: f64::from(self.canvas().width),
                height: f64::from(self.canvas().height),
            },
            layers: self
                .layers()
                .iter()
                .map(|l| {
                    let path = l.image().map(|_| image_file_name(dir, l.layer_id()));
                    LayerRecord::from_layer(l, path)
                })
                .collect(),
            metadata: self.metadata().clone(),
        }
    }

    /// Write `document.json` plus one PNG per layer image into `dir`.
    ///
    /// Returns the manifest path.
    pub fn write_manifest(&self, dir: impl AsRef<Path>) -> StrataResult<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create manifest directory '{}'", dir.display()))?;
        let store = LayerImageStore::new(dir);
        let record = self.to_record("layers");

        let images: BTreeMap<LayerId, _> = self
            .layers()
            .iter()
            .filter_map(|l| l.image().map(|img| (l.layer_id(), img)))
            .collect();
        for rec in &record.layers {
            if let (Some(rel), Some(img)) = (&rec.image_path, images.get(&rec.layer_id)) {
                store.save(rel, img)?;
            }
        }

        let path = dir.join(MANIFEST_FILE);
        std::fs::write(&path, record.to_json_pretty()?)
            .with_context(|| format!("write manifest '{}'", path.display()))?;
        tracing::info!(path = %path.display(), layers = record.layers.len(), "wrote manifest");
        Ok(path)
    }

    /// Load a manifest written by [`Document::write_manifest`] or any compatible producer.
    ///
    /// Image paths resolve relative to the manifest's directory.
    pub fn from_manifest(path: impl AsRef<Path>) -> StrataResult<Self> {
        let path = path.as_ref();
        let record = DocumentRecord::from_path(path)?;
        let root = path.parent().unwrap_or_else(|| Path::new("."));
        Document::from_record(&record, &LayerImageStore::new(root))
    }
}

fn image_file_name(dir: &str, id: LayerId) -> String {
    if dir.is_empty() {
        format!("{id}.png")
    } else {
        format!("{dir}/{id}.png")
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/record.rs"]
mod tests;
