//! Strata is a layered 2D document model with a CPU pixel compositor.
//!
//! A [`Document`] owns a canvas size and a set of [`Layer`]s. Each layer carries RGBA pixels,
//! an anchor-relative position, opacity, visibility and one of twelve [`BlendMode`]s.
//! [`render_document`] flattens a document into a straight-alpha [`PixelBuffer`]:
//!
//! - Build layers from decoded images ([`PixelBuffer::from_dynamic_image`], tensors, bytes)
//! - Assemble a document with [`Document::add_layer`] or load one with
//!   [`Document::from_manifest`]
//! - Render with [`render_document`], then [`flatten_over_white`] for opaque previews
//!
//! Documents and layers are values: every edit returns a new value and pixel storage is shared
//! copy-on-write, so a document can be read from many threads while edits happen elsewhere.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod blend;
mod document;
mod foundation;
mod interop;
mod raster;
mod render;

pub use crate::foundation::core::{Canvas, LayerId, Point, Vec2};
pub use crate::foundation::error::{StrataError, StrataResult};

pub use crate::assets::decode::{decode_image, encode_png};
pub use crate::assets::store::LayerImageStore;
pub use crate::blend::math::{blend, blend_by_name, blend_channel, blend_pixel};
pub use crate::blend::mode::BlendMode;
pub use crate::document::doc::{
    Diagnostic, Document, DocumentInfo, LayerQuery, Severity,
};
pub use crate::document::layer::{Layer, LayerInfo, Metadata};
pub use crate::document::patch::{LayerPatch, update_layer};
pub use crate::document::record::{
    DocumentRecord, LayerRecord, MANIFEST_FILE, RECORD_VERSION, ResolvedGeometry, SizeDef, XyDef,
};
pub use crate::interop::psd::{
    ImportSummary, PsdExport, PsdExportLayer, PsdExportOptions, PsdLayerSource,
    export_psd_layers, import_psd_layers,
};
pub use crate::raster::buffer::{Channels, MAX_SAMPLES, PixelBuffer};
pub use crate::render::batch::{RenderThreading, render_documents};
pub use crate::render::composite::{
    RenderOptions, RenderOutput, SkippedLayer, paste_clipped, paste_origin, render_document,
    render_layer, render_single_layer, try_render_layer,
};
pub use crate::render::flatten::{WHITE, flatten_onto, flatten_over_white};
