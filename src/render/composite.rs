use crate::blend::math::blend_in_place;
use crate::document::doc::Document;
use crate::document::layer::Layer;
use crate::foundation::core::{LayerId, clamp_unit};
use crate::foundation::error::{StrataError, StrataResult};
use crate::raster::buffer::{Channels, PixelBuffer};

/// What [`render_document`] draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    /// Draw every visible layer. When `false`, only `target_layer_id` is drawn.
    pub render_all_layers: bool,
    /// Layer drawn when `render_all_layers` is `false`.
    pub target_layer_id: Option<LayerId>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            render_all_layers: true,
            target_layer_id: None,
        }
    }
}

impl RenderOptions {
    /// Draw only the layer with `id`.
    pub fn single(id: LayerId) -> Self {
        Self {
            render_all_layers: false,
            target_layer_id: Some(id),
        }
    }
}

/// A layer left out of a render because it could not be composited.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedLayer {
    /// ID of the skipped layer.
    pub layer_id: LayerId,
    /// Name of the skipped layer.
    pub name: String,
    /// Error that stopped compositing.
    pub reason: String,
}

/// Flattened straight-alpha RGBA image plus what happened to each layer.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderOutput {
    /// Composited canvas.
    pub image: PixelBuffer,
    /// Number of layers actually composited.
    pub composited: usize,
    /// Layers left out, in drawing order.
    pub skipped: Vec<SkippedLayer>,
}

/// Composite a document onto a transparent canvas of its size.
///
/// Layers are drawn in ascending [`LayerId`] order. A layer that cannot be composited is logged,
/// listed in [`RenderOutput::skipped`], and leaves the canvas as it was; the remaining layers
/// still render. A canvas too large to allocate renders as an empty `0x0` image.
#[tracing::instrument(skip(doc, opts), fields(document_id = doc.document_id()))]
pub fn render_document(doc: &Document, opts: &RenderOptions) -> RenderOutput {
    let c = doc.canvas();
    let image = match PixelBuffer::try_transparent(c.width, c.height) {
        Ok(image) => image,
        Err(error) => {
            tracing::warn!(%error, "canvas cannot be allocated; nothing rendered");
            return RenderOutput {
                image: PixelBuffer::transparent(0, 0),
                composited: 0,
                skipped: Vec::new(),
            };
        }
    };
    let mut out = RenderOutput {
        image,
        composited: 0,
        skipped: Vec::new(),
    };

    if opts.render_all_layers {
        for layer in doc.layers_in_z_order() {
            composite_visible(&mut out, layer);
        }
        return out;
    }

    match opts.target_layer_id.and_then(|id| doc.layer_by_id(id)) {
        Some(layer) => composite_visible(&mut out, layer),
        None => tracing::debug!(
            target_layer_id = ?opts.target_layer_id,
            "target layer not found; canvas left transparent"
        ),
    }
    out
}

fn composite_visible(out: &mut RenderOutput, layer: &Layer) {
    if !layer.visible() {
        tracing::debug!(layer_id = layer.layer_id().0, "skipping hidden layer");
        return;
    }
    match try_render_layer(&out.image, layer) {
        Ok(next) => {
            out.image = next;
            out.composited += 1;
        }
        Err(error) => {
            warn_skipped(layer, &error);
            out.skipped.push(SkippedLayer {
                layer_id: layer.layer_id(),
                name: layer.name().to_string(),
                reason: error.to_string(),
            });
        }
    }
}

/// Composite one layer onto `canvas`, best effort.
///
/// On failure the layer is logged and an unchanged copy of `canvas` is returned.
pub fn render_layer(canvas: &PixelBuffer, layer: &Layer) -> PixelBuffer {
    match try_render_layer(canvas, layer) {
        Ok(next) => next,
        Err(error) => {
            warn_skipped(layer, &error);
            canvas.clone()
        }
    }
}

/// Composite one layer onto `canvas`, reporting failures.
///
/// The layer image is pasted at its anchor-resolved origin into a canvas-sized transparent
/// staging buffer, clipped to the canvas, and blended over the whole canvas with the layer's
/// mode and opacity. The result is RGBA; `canvas` itself is not modified.
pub fn try_render_layer(canvas: &PixelBuffer, layer: &Layer) -> StrataResult<PixelBuffer> {
    let image = layer_image(layer)?;
    let (x, y) = paste_origin(layer)?;

    let mut staging = PixelBuffer::try_transparent(canvas.width(), canvas.height())?;
    paste_clipped(&mut staging, image, x, y);

    let mut out = canvas.to_rgba();
    blend_in_place(layer.blend_mode(), &mut out, &staging, layer.opacity())?;
    tracing::debug!(
        layer_id = layer.layer_id().0,
        x,
        y,
        blend_mode = %layer.blend_mode(),
        "composited layer"
    );
    Ok(out)
}

/// Integer top-left paste position: `round(position - size * anchor)` per axis.
pub fn paste_origin(layer: &Layer) -> StrataResult<(i64, i64)> {
    let o = layer.origin();
    if !o.x.is_finite() || !o.y.is_finite() {
        return Err(StrataError::invalid_geometry(format!(
            "layer '{}' resolves to non-finite origin ({}, {})",
            layer.name(),
            o.x,
            o.y
        )));
    }
    Ok((o.x.round() as i64, o.y.round() as i64))
}

/// Copy `src` into `dst` with its top-left at `(x, y)`, discarding pixels outside `dst`.
///
/// Both buffers are treated as RGBA; covered destination pixels are replaced.
pub fn paste_clipped(dst: &mut PixelBuffer, src: &PixelBuffer, x: i64, y: i64) {
    let src = src.to_rgba();
    let (dw, dh) = (i64::from(dst.width()), i64::from(dst.height()));
    let (sw, sh) = (i64::from(src.width()), i64::from(src.height()));

    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = x.saturating_add(sw).min(dw);
    let y1 = y.saturating_add(sh).min(dh);
    if x0 >= x1 || y0 >= y1 {
        return;
    }
    if dst.channels() != Channels::Rgba {
        *dst = dst.to_rgba();
    }

    let row_len = ((x1 - x0) * 4) as usize;
    let dst_w = dst.width() as usize;
    let src_w = src.width() as usize;
    let src_samples = src.samples();
    let dst_samples = dst.samples_mut();
    for dy in y0..y1 {
        let sy = (dy - y) as usize;
        let sx = (x0 - x) as usize;
        let s = (sy * src_w + sx) * 4;
        let d = ((dy as usize) * dst_w + x0 as usize) * 4;
        dst_samples[d..d + row_len].copy_from_slice(&src_samples[s..s + row_len]);
    }
}

/// Render a layer at its own size, without a backdrop.
///
/// Opacity is folded into alpha and the blend mode is ignored. A hidden layer renders fully
/// transparent.
pub fn render_single_layer(layer: &Layer) -> StrataResult<PixelBuffer> {
    let image = layer_image(layer)?;
    let (w, h) = image.dimensions();
    if !layer.visible() {
        return PixelBuffer::try_transparent(w, h);
    }

    let mut out = image.to_rgba();
    let opacity = clamp_unit(layer.opacity());
    if opacity < 1.0 {
        for px in out.samples_mut().chunks_exact_mut(4) {
            px[3] *= opacity;
        }
    }
    Ok(out)
}

fn layer_image(layer: &Layer) -> StrataResult<&PixelBuffer> {
    layer.image().ok_or_else(|| {
        StrataError::malformed_image(format!("layer '{}' has no image data", layer.name()))
    })
}

fn warn_skipped(layer: &Layer, error: &StrataError) {
    tracing::warn!(
        layer_id = layer.layer_id().0,
        name = layer.name(),
        %error,
        "layer skipped during compositing"
    );
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
