use std::collections::BTreeSet;

use crate::document::layer::{Layer, LayerInfo, Metadata};
use crate::document::patch::{LayerPatch, update_layer};
use crate::foundation::core::{Canvas, LayerId};
use crate::foundation::error::{StrataError, StrataResult};

/// An ordered collection of layers sharing one canvas.
///
/// Collection order is storage order only; z-order is ascending [`LayerId`]. Every mutating
/// operation takes `&self` and returns a new document, so a document handed to another thread
/// or caller never changes underneath it.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    document_id: String,
    canvas: Canvas,
    layers: Vec<Layer>,
    metadata: Metadata,
}

/// Layer lookup key. The ID is tried first, then the name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayerQuery {
    /// Layer ID to try first.
    pub id: Option<LayerId>,
    /// Layer name to try when the ID is absent or unmatched.
    pub name: Option<String>,
}

impl LayerQuery {
    /// Query matching only an ID.
    pub fn by_id(id: LayerId) -> Self {
        Self {
            id: Some(id),
            name: None,
        }
    }

    /// Query matching only a name.
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
        }
    }
}

impl std::fmt::Display for LayerQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.id, &self.name) {
            (Some(id), Some(name)) => write!(f, "layer id {id} or name '{name}'"),
            (Some(id), None) => write!(f, "layer id {id}"),
            (None, Some(name)) => write!(f, "layer name '{name}'"),
            (None, None) => f.write_str("empty layer query"),
        }
    }
}

impl Document {
    /// Empty document with a fresh random ID. Zero-sized canvases are allowed.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            document_id: uuid::Uuid::new_v4().to_string(),
            canvas: Canvas::new(width, height),
            layers: Vec::new(),
            metadata: Metadata::new(),
        }
    }

    /// Assemble a document from existing parts.
    ///
    /// Layers keep their assigned IDs; unassigned layers receive first-gap IDs in collection
    /// order. Two layers with the same assigned ID are a validation error.
    pub fn from_parts(
        document_id: impl Into<String>,
        canvas: Canvas,
        layers: Vec<Layer>,
        metadata: Metadata,
    ) -> StrataResult<Self> {
        let mut used = BTreeSet::new();
        for layer in layers.iter().filter(|l| l.layer_id().is_assigned()) {
            if !used.insert(layer.layer_id()) {
                return Err(StrataError::validation(format!(
                    "duplicate layer id {} ('{}')",
                    layer.layer_id(),
                    layer.name()
                )));
            }
        }

        let mut out = Vec::with_capacity(layers.len());
        for layer in layers {
            if layer.layer_id().is_assigned() {
                out.push(layer);
                continue;
            }
            let id = first_gap(&used);
            used.insert(id);
            tracing::debug!(layer_id = id.0, name = layer.name(), "assigned layer id");
            out.push(layer.with_id(id));
        }

        Ok(Self {
            document_id: document_id.into(),
            canvas,
            layers: out,
            metadata,
        })
    }

    /// Replace the document metadata.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Set one metadata entry.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Stable document identifier.
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Canvas size in pixels.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Layers in collection order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Free-form document metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Layers sorted bottom to top. The sort is stable.
    pub fn layers_in_z_order(&self) -> Vec<&Layer> {
        let mut out: Vec<&Layer> = self.layers.iter().collect();
        out.sort_by_key(|l| l.layer_id());
        out
    }

    /// Smallest non-negative ID not used by any layer.
    pub fn next_free_id(&self) -> LayerId {
        first_gap(&self.used_ids())
    }

    /// Return a document with `layer` added, plus the ID it received.
    ///
    /// `target` is honored when it is non-negative and unused; otherwise the first free ID is
    /// taken. Surviving layers are never renumbered.
    pub fn add_layer(&self, layer: Layer, target: Option<LayerId>) -> (Document, LayerId) {
        let used = self.used_ids();
        let id = match target {
            Some(t) if t.is_assigned() && !used.contains(&t) => t,
            _ => first_gap(&used),
        };
        tracing::debug!(layer_id = id.0, name = layer.name(), "adding layer");

        let mut out = self.clone();
        out.layers.push(layer.with_id(id));
        (out, id)
    }

    /// Return a document without any layer carrying `id`, plus the number removed.
    ///
    /// Removing nothing is not an error.
    pub fn remove_layer(&self, id: LayerId) -> (Document, usize) {
        let mut out = self.clone();
        out.layers.retain(|l| l.layer_id() != id);
        let removed = self.layers.len() - out.layers.len();
        tracing::info!(layer_id = id.0, removed, "removed layers");
        (out, removed)
    }

    /// Return a document where the layer with `id` has `patch` applied.
    pub fn update_layer(&self, id: LayerId, patch: LayerPatch) -> StrataResult<Document> {
        let idx = self
            .layers
            .iter()
            .position(|l| l.layer_id() == id)
            .ok_or_else(|| StrataError::not_found(format!("layer id {id}")))?;
        let mut out = self.clone();
        out.layers[idx] = update_layer(&self.layers[idx], patch);
        Ok(out)
    }

    /// Look up a layer, trying the ID before the name.
    pub fn get_layer(&self, query: &LayerQuery) -> Option<&Layer> {
        query
            .id
            .and_then(|id| self.layer_by_id(id))
            .or_else(|| query.name.as_deref().and_then(|n| self.layer_by_name(n)))
    }

    /// Like [`Document::get_layer`], reporting a miss as [`StrataError::NotFound`].
    pub fn require_layer(&self, query: &LayerQuery) -> StrataResult<&Layer> {
        self.get_layer(query)
            .ok_or_else(|| StrataError::not_found(query.to_string()))
    }

    /// Layer carrying `id`, if any.
    pub fn layer_by_id(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.layer_id() == id)
    }

    /// First layer with this name in collection order. Names are not unique.
    pub fn layer_by_name(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name() == name)
    }

    /// Summary of the document without layer pixels.
    pub fn info(&self) -> DocumentInfo {
        DocumentInfo {
            document_id: self.document_id.clone(),
            width: self.canvas.width,
            height: self.canvas.height,
            layer_count: self.layers.len(),
            metadata: self.metadata.clone(),
        }
    }

    /// Per-layer summaries in collection order.
    pub fn layer_list(&self) -> Vec<LayerInfo> {
        self.layers.iter().map(Layer::info).collect()
    }

    /// Report structural problems that rendering would tolerate silently.
    pub fn diagnose(&self) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        if self.canvas.is_empty() {
            out.push(Diagnostic::document(
                Severity::Warning,
                format!(
                    "canvas is {}x{}; renders will be empty",
                    self.canvas.width, self.canvas.height
                ),
            ));
        }

        for layer in self.layers_in_z_order() {
            let id = layer.layer_id();
            if layer.image().is_none() {
                out.push(Diagnostic::layer(Severity::Error, id, "image data missing"));
            }
            let op = layer.opacity();
            if !(0.0..=1.0).contains(&op) {
                out.push(Diagnostic::layer(
                    Severity::Warning,
                    id,
                    format!("opacity {op} outside [0, 1]"),
                ));
            }
            let a = layer.anchor();
            if !(0.0..=1.0).contains(&a.x) || !(0.0..=1.0).contains(&a.y) {
                out.push(Diagnostic::layer(
                    Severity::Warning,
                    id,
                    format!("anchor ({}, {}) outside [0, 1]", a.x, a.y),
                ));
            }
            let p = layer.position();
            if !p.x.is_finite() || !p.y.is_finite() {
                out.push(Diagnostic::layer(
                    Severity::Error,
                    id,
                    format!("position ({}, {}) is not finite", p.x, p.y),
                ));
            } else if layer.image().is_some() && !overlaps_canvas(layer, self.canvas) {
                out.push(Diagnostic::layer(
                    Severity::Info,
                    id,
                    "layer does not overlap the canvas",
                ));
            }
        }
        out
    }

    fn used_ids(&self) -> BTreeSet<LayerId> {
        self.layers
            .iter()
            .map(Layer::layer_id)
            .filter(|id| id.is_assigned())
            .collect()
    }
}

/// Document summary without layer pixels.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct DocumentInfo {
    /// Stable document identifier.
    pub document_id: String,
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Number of layers.
    pub layer_count: usize,
    /// Free-form document metadata.
    pub metadata: Metadata,
}

/// How serious a [`Diagnostic`] is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Worth knowing; rendering is unaffected.
    Info,
    /// Rendering works but probably not as intended.
    Warning,
    /// Part of the document cannot render.
    Error,
}

/// One finding from [`Document::diagnose`] or record diagnostics.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Diagnostic {
    /// How serious the finding is.
    pub severity: Severity,
    /// `None` for document-level findings.
    pub layer_id: Option<LayerId>,
    /// Human-readable description.
    pub message: String,
}

impl Diagnostic {
    pub(crate) fn document(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            layer_id: None,
            message: message.into(),
        }
    }

    pub(crate) fn layer(severity: Severity, id: LayerId, message: impl Into<String>) -> Self {
        Self {
            severity,
            layer_id: Some(id),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sev = match self.severity {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        match self.layer_id {
            Some(id) => write!(f, "{sev}: layer {id}: {}", self.message),
            None => write!(f, "{sev}: {}", self.message),
        }
    }
}

fn first_gap(used: &BTreeSet<LayerId>) -> LayerId {
    let mut next = 0i64;
    for id in used.iter().filter(|id| id.is_assigned()) {
        if id.0 != next {
            break;
        }
        next += 1;
    }
    LayerId(next)
}

fn overlaps_canvas(layer: &Layer, canvas: Canvas) -> bool {
    let (w, h) = layer.size();
    let o = layer.origin();
    o.x < f64::from(canvas.width)
        && o.y < f64::from(canvas.height)
        && o.x + f64::from(w) > 0.0
        && o.y + f64::from(h) > 0.0
}

#[cfg(test)]
#[path = "../../tests/unit/document/doc.rs"]
mod tests;
