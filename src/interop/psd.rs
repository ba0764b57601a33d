//! PSD layer boundary.
//!
//! Decoding and encoding PSD files is left to a codec; this module only converts between the
//! codec's per-layer view and [`Document`]. PSD layers are natively top-left anchored, so
//! imported layers get `anchor = (0, 0)` and exported offsets resolve the anchor back out.

use std::collections::BTreeMap;

use crate::blend::mode::BlendMode;
use crate::document::doc::Document;
use crate::document::layer::{Layer, Metadata};
use crate::foundation::core::{Canvas, LayerId, Point, clamp_unit};
use crate::raster::buffer::PixelBuffer;

const CREATED_BY: &str = "psd_import";

/// One decoded PSD pixel layer, as a codec hands it over.
#[derive(Clone, Debug, PartialEq)]
pub struct PsdLayerSource {
    /// Layer name; empty names become `Layer {id}`.
    pub name: String,
    /// Names of enclosing groups, outermost first.
    pub group_path: Vec<String>,
    /// `[left, top, right, bottom]` in canvas pixels.
    pub bbox: [i64; 4],
    /// PSD opacity, `0..=255`.
    pub opacity: u8,
    /// Blend mode as the codec spells it (`"multiply"`, `"BlendMode.SOFT_LIGHT"`, `"mul "`, ...).
    pub blend_mode: String,
    /// Hidden layers are not imported.
    pub visible: bool,
    /// Codec layer kind (`"pixel"`, `"type"`, `"smartobject"`, ...).
    pub kind: String,
    /// Composited layer pixels; `None` when the codec could not produce any.
    pub pixels: Option<PixelBuffer>,
}

/// What an import did.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct ImportSummary {
    /// Number of layers imported.
    pub layer_count: usize,
    /// Imported layers per canonical blend-mode name.
    pub blend_modes: BTreeMap<String, usize>,
    /// Source spellings that were not recognized and imported as normal.
    pub unsupported_blend_modes: Vec<String>,
    /// Hidden layers left out.
    pub skipped_hidden: usize,
    /// Layers without pixels left out.
    pub skipped_empty: usize,
}

/// Build a document from decoded PSD layers, bottom layer first.
///
/// Hidden and pixel-less layers are skipped. Imported layers get sequential IDs from 0 in
/// source order, so source order becomes z-order.
#[tracing::instrument(skip(sources), fields(sources = sources.len()))]
pub fn import_psd_layers(
    canvas: Canvas,
    sources: &[PsdLayerSource],
    source_file: &str,
) -> (Document, ImportSummary) {
    let mut doc = Document::blank(canvas.width, canvas.height)
        .with_meta("created_by", CREATED_BY)
        .with_meta("source_file", source_file)
        .with_meta(
            "original_size",
            serde_json::json!([canvas.width, canvas.height]),
        );
    let mut summary = ImportSummary::default();

    for src in sources {
        if !src.visible {
            summary.skipped_hidden += 1;
            continue;
        }
        let Some(pixels) = &src.pixels else {
            tracing::warn!(name = %src.name, "psd layer has no pixels, skipping");
            summary.skipped_empty += 1;
            continue;
        };

        let id = LayerId(summary.layer_count as i64);
        let name = qualified_name(src, id);
        let blend_mode = match resolve_blend_mode(&src.blend_mode) {
            Some(m) => m,
            None => {
                tracing::warn!(
                    name = %name,
                    blend_mode = %src.blend_mode,
                    "unsupported psd blend mode, using normal"
                );
                summary.unsupported_blend_modes.push(src.blend_mode.clone());
                BlendMode::Normal
            }
        };

        let [left, top, right, bottom] = src.bbox;
        if (right - left, bottom - top) != (i64::from(pixels.width()), i64::from(pixels.height()))
        {
            tracing::debug!(name = %name, bbox = ?src.bbox, "psd bbox differs from pixel size");
        }

        let mut meta = Metadata::new();
        meta.insert("created_by".into(), CREATED_BY.into());
        meta.insert("source_layer".into(), src.name.clone().into());
        meta.insert("original_blend_mode".into(), src.blend_mode.clone().into());
        meta.insert("psd_opacity".into(), src.opacity.into());
        meta.insert("bbox".into(), serde_json::json!(src.bbox));
        meta.insert("layer_kind".into(), src.kind.clone().into());

        let layer = Layer::new(name, pixels.clone())
            .with_position(Point::new(left as f64, top as f64))
            .with_opacity(f32::from(src.opacity) / 255.0)
            .with_blend_mode(blend_mode)
            .with_metadata(meta);
        doc = doc.add_layer(layer, Some(id)).0;

        summary.layer_count += 1;
        *summary
            .blend_modes
            .entry(blend_mode.as_str().to_string())
            .or_default() += 1;
    }

    tracing::info!(
        layers = summary.layer_count,
        hidden = summary.skipped_hidden,
        empty = summary.skipped_empty,
        "psd import finished"
    );
    (doc, summary)
}

fn qualified_name(src: &PsdLayerSource, id: LayerId) -> String {
    let leaf = if src.name.is_empty() {
        format!("Layer {id}")
    } else {
        src.name.clone()
    };
    if src.group_path.is_empty() {
        return leaf;
    }
    let groups: Vec<String> = src
        .group_path
        .iter()
        .enumerate()
        .map(|(i, g)| if g.is_empty() { format!("Group {i}") } else { g.clone() })
        .collect();
    format!("{}/{leaf}", groups.join("/"))
}

fn resolve_blend_mode(raw: &str) -> Option<BlendMode> {
    if raw.trim().is_empty() {
        return Some(BlendMode::Normal);
    }
    BlendMode::parse_lenient(raw).or_else(|| {
        let key: [u8; 4] = raw.as_bytes().try_into().ok()?;
        BlendMode::from_psd_key(key)
    })
}

/// Options for [`export_psd_layers`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PsdExportOptions {
    /// Export hidden layers too, flagged invisible.
    pub include_hidden: bool,
}

/// One layer ready for a PSD encoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PsdExportLayer {
    /// ID of the source layer.
    pub layer_id: LayerId,
    /// Layer name.
    pub name: String,
    /// Left edge in canvas pixels.
    pub left: i64,
    /// Top edge in canvas pixels.
    pub top: i64,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// PSD opacity, `0..=255`.
    pub opacity: u8,
    /// Blend mode.
    pub blend_mode: BlendMode,
    /// PSD 4-byte blend key.
    pub blend_key: [u8; 4],
    /// Visibility flag.
    pub visible: bool,
    /// Straight RGBA8, row-major.
    pub rgba8: Vec<u8>,
}

/// Export records for a PSD encoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PsdExport {
    /// Canvas size of the source document.
    pub canvas: Canvas,
    /// Bottom layer first.
    pub layers: Vec<PsdExportLayer>,
}

/// Read layers back out of a document in z-order.
///
/// Offsets are `trunc(position - size * anchor)`, opacity is `trunc(opacity * 255)`. Layers
/// without pixels or with a non-finite position cannot be placed and are skipped with a warning.
#[tracing::instrument(skip(doc), fields(document_id = doc.document_id()))]
pub fn export_psd_layers(doc: &Document, opts: &PsdExportOptions) -> PsdExport {
    let mut layers = Vec::new();
    for layer in doc.layers_in_z_order() {
        if !layer.visible() && !opts.include_hidden {
            continue;
        }
        let Some(image) = layer.image() else {
            tracing::warn!(layer_id = layer.layer_id().0, name = layer.name(), "no pixels, not exported");
            continue;
        };
        let origin = layer.origin();
        if !origin.x.is_finite() || !origin.y.is_finite() {
            tracing::warn!(
                layer_id = layer.layer_id().0,
                name = layer.name(),
                "non-finite position, not exported"
            );
            continue;
        }

        let (width, height) = image.dimensions();
        let blend_mode = layer.blend_mode();
        layers.push(PsdExportLayer {
            layer_id: layer.layer_id(),
            name: layer.name().to_string(),
            left: origin.x.trunc() as i64,
            top: origin.y.trunc() as i64,
            width,
            height,
            opacity: (clamp_unit(layer.opacity()) * 255.0).trunc() as u8,
            blend_mode,
            blend_key: blend_mode.psd_key(),
            visible: layer.visible(),
            rgba8: image.to_rgba8(),
        });
    }
    tracing::debug!(exported = layers.len(), "psd export prepared");
    PsdExport {
        canvas: doc.canvas(),
        layers,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/interop/psd.rs"]
mod tests;
