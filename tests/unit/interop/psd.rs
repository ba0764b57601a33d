use super::*;

fn source(name: &str, bbox: [i64; 4], blend: &str) -> PsdLayerSource {
    let (w, h) = ((bbox[2] - bbox[0]) as u32, (bbox[3] - bbox[1]) as u32);
    PsdLayerSource {
        name: name.to_string(),
        group_path: Vec::new(),
        bbox,
        opacity: 255,
        blend_mode: blend.to_string(),
        visible: true,
        kind: "pixel".to_string(),
        pixels: Some(PixelBuffer::filled(w, h, [0.2, 0.4, 0.6, 1.0])),
    }
}

#[test]
fn import_builds_top_left_anchored_layers() {
    let mut hidden = source("hidden", [0, 0, 1, 1], "normal");
    hidden.visible = false;
    let mut grouped = source("eyes", [10, 20, 14, 22], "BlendMode.MULTIPLY");
    grouped.group_path = vec!["face".to_string()];
    grouped.opacity = 128;
    let mut empty = source("empty", [0, 0, 1, 1], "normal");
    empty.pixels = None;

    let sources = vec![
        source("bg", [0, 0, 32, 32], "normal"),
        hidden,
        grouped,
        empty,
        source("fx", [1, 1, 2, 2], "linear-burn"),
    ];
    let (doc, summary) = import_psd_layers(Canvas::new(32, 32), &sources, "art.psd");

    assert_eq!(summary.layer_count, 3);
    assert_eq!(summary.skipped_hidden, 1);
    assert_eq!(summary.skipped_empty, 1);
    assert_eq!(summary.unsupported_blend_modes, vec!["linear-burn".to_string()]);
    assert_eq!(summary.blend_modes["normal"], 2);
    assert_eq!(summary.blend_modes["multiply"], 1);

    let ids: Vec<i64> = doc.layers().iter().map(|l| l.layer_id().0).collect();
    assert_eq!(ids, vec![0, 1, 2]);

    let eyes = doc.layer_by_name("face/eyes").unwrap();
    assert_eq!(eyes.position(), Point::new(10.0, 20.0));
    assert_eq!(eyes.anchor(), crate::foundation::core::Vec2::ZERO);
    assert_eq!(eyes.blend_mode(), BlendMode::Multiply);
    assert!((eyes.opacity() - 128.0 / 255.0).abs() < 1e-6);
    assert_eq!(eyes.metadata()["psd_opacity"], serde_json::json!(128));
    assert_eq!(eyes.metadata()["original_blend_mode"], serde_json::json!("BlendMode.MULTIPLY"));
    assert_eq!(doc.metadata()["source_file"], serde_json::json!("art.psd"));
    assert_eq!(doc.metadata()["original_size"], serde_json::json!([32, 32]));
}

#[test]
fn raw_psd_keys_and_unnamed_layers() {
    let mut unnamed = source("", [0, 0, 1, 1], "scrn");
    unnamed.group_path = vec![String::new()];
    let (doc, summary) = import_psd_layers(Canvas::new(4, 4), &[unnamed], "x.psd");
    assert!(summary.unsupported_blend_modes.is_empty());
    let layer = &doc.layers()[0];
    assert_eq!(layer.blend_mode(), BlendMode::Screen);
    assert_eq!(layer.name(), "Group 0/Layer 0");
}

#[test]
fn export_resolves_anchor_and_truncates() {
    let doc = Document::blank(100, 100);
    let (doc, _) = doc.add_layer(
        Layer::new("top", PixelBuffer::filled(10, 10, [1.0, 0.0, 0.0, 1.0]))
            .with_position(Point::new(50.7, 50.0))
            .with_anchor(crate::foundation::core::Vec2::new(0.5, 1.0))
            .with_opacity(0.5)
            .with_blend_mode(BlendMode::SoftLight),
        Some(LayerId(3)),
    );
    let (doc, _) = doc.add_layer(
        Layer::new("hidden", PixelBuffer::transparent(1, 1)).with_visible(false),
        Some(LayerId(1)),
    );
    let (doc, _) = doc.add_layer(Layer::without_image("ghost"), Some(LayerId(0)));

    let out = export_psd_layers(&doc, &PsdExportOptions::default());
    assert_eq!(out.layers.len(), 1);
    let l = &out.layers[0];
    assert_eq!((l.left, l.top), (45, 40));
    assert_eq!(l.opacity, 127);
    assert_eq!(&l.blend_key, b"sLit");
    assert_eq!(l.rgba8.len(), 10 * 10 * 4);

    let all = export_psd_layers(
        &doc,
        &PsdExportOptions {
            include_hidden: true,
        },
    );
    let names: Vec<&str> = all.layers.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["hidden", "top"]);
    assert!(!all.layers[0].visible);
}
