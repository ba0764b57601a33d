use super::*;
use crate::foundation::core::{Point, Vec2};
use crate::raster::buffer::PixelBuffer;

fn layer(name: &str) -> Layer {
    Layer::new(name, PixelBuffer::filled(2, 2, [1.0, 1.0, 1.0, 1.0]))
}

fn with_n_layers(n: usize) -> Document {
    let mut doc = Document::blank(10, 10);
    for i in 0..n {
        doc = doc.add_layer(layer(&format!("l{i}")), None).0;
    }
    doc
}

fn ids(doc: &Document) -> Vec<i64> {
    doc.layers().iter().map(|l| l.layer_id().0).collect()
}

#[test]
fn blank_documents_get_distinct_ids() {
    let a = Document::blank(0, 0);
    let b = Document::blank(0, 0);
    assert_ne!(a.document_id(), b.document_id());
    assert!(a.layers().is_empty());
}

#[test]
fn sequential_adds_fill_from_zero() {
    let doc = with_n_layers(5);
    assert_eq!(ids(&doc), vec![0, 1, 2, 3, 4]);
}

#[test]
fn deleted_id_is_reused_first() {
    let doc = with_n_layers(5);
    let (doc, removed) = doc.remove_layer(LayerId(2));
    assert_eq!(removed, 1);
    let (doc, id) = doc.add_layer(layer("new"), None);
    assert_eq!(id, LayerId(2));
    assert_eq!(ids(&doc), vec![0, 1, 3, 4, 2]);
}

#[test]
fn explicit_target_used_when_free() {
    let doc = with_n_layers(2);
    let (doc, id) = doc.add_layer(layer("top"), Some(LayerId(10)));
    assert_eq!(id, LayerId(10));
    let (doc, id) = doc.add_layer(layer("clash"), Some(LayerId(10)));
    assert_eq!(id, LayerId(2));
    let (_, id) = doc.add_layer(layer("neg"), Some(LayerId(-5)));
    assert_eq!(id, LayerId(3));
}

#[test]
fn add_does_not_touch_the_input() {
    let doc = with_n_layers(1);
    let before = doc.clone();
    let _ = doc.add_layer(layer("x"), None);
    assert_eq!(doc, before);
}

#[test]
fn removing_missing_id_is_a_no_op() {
    let doc = with_n_layers(3);
    let (out, removed) = doc.remove_layer(LayerId(42));
    assert_eq!(removed, 0);
    assert_eq!(out, doc);
}

#[test]
fn from_parts_assigns_gaps_and_rejects_duplicates() {
    let doc = Document::from_parts(
        "d",
        Canvas::new(4, 4),
        vec![
            layer("a").with_id(LayerId(1)),
            layer("b"),
            layer("c"),
        ],
        Metadata::new(),
    )
    .unwrap();
    assert_eq!(ids(&doc), vec![1, 0, 2]);

    let err = Document::from_parts(
        "d",
        Canvas::new(4, 4),
        vec![layer("a").with_id(LayerId(1)), layer("b").with_id(LayerId(1))],
        Metadata::new(),
    )
    .unwrap_err();
    assert!(matches!(err, StrataError::Validation(_)));
}

#[test]
fn z_order_is_ascending_id_regardless_of_storage() {
    let doc = Document::from_parts(
        "d",
        Canvas::new(4, 4),
        vec![
            layer("top").with_id(LayerId(5)),
            layer("bottom").with_id(LayerId(0)),
            layer("mid").with_id(LayerId(3)),
        ],
        Metadata::new(),
    )
    .unwrap();
    let names: Vec<&str> = doc.layers_in_z_order().iter().map(|l| l.name()).collect();
    assert_eq!(names, vec!["bottom", "mid", "top"]);
}

#[test]
fn lookup_prefers_id_then_name() {
    let doc = with_n_layers(3);
    let q = LayerQuery {
        id: Some(LayerId(2)),
        name: Some("l0".to_string()),
    };
    assert_eq!(doc.get_layer(&q).unwrap().name(), "l2");

    let q = LayerQuery {
        id: Some(LayerId(99)),
        name: Some("l0".to_string()),
    };
    assert_eq!(doc.get_layer(&q).unwrap().layer_id(), LayerId(0));

    assert!(doc.get_layer(&LayerQuery::by_name("nope")).is_none());
    assert!(matches!(
        doc.require_layer(&LayerQuery::by_id(LayerId(9))),
        Err(StrataError::NotFound(_))
    ));
}

#[test]
fn update_layer_by_id() {
    let doc = with_n_layers(2);
    let out = doc
        .update_layer(
            LayerId(1),
            LayerPatch {
                name: Some("renamed".to_string()),
                ..LayerPatch::default()
            },
        )
        .unwrap();
    assert_eq!(out.layer_by_id(LayerId(1)).unwrap().name(), "renamed");
    assert_eq!(doc.layer_by_id(LayerId(1)).unwrap().name(), "l1");
    assert!(doc.update_layer(LayerId(7), LayerPatch::default()).is_err());
}

#[test]
fn info_and_listing() {
    let doc = with_n_layers(2).with_meta("source_file", "a.psd");
    let info = doc.info();
    assert_eq!((info.width, info.height, info.layer_count), (10, 10, 2));
    assert_eq!(info.metadata["source_file"], serde_json::json!("a.psd"));
    let list = doc.layer_list();
    assert_eq!(list[1].name, "l1");
}

#[test]
fn diagnose_flags_suspicious_layers() {
    let doc = Document::blank(0, 5);
    let (doc, _) = doc.add_layer(Layer::without_image("ghost"), None);
    let (doc, _) = doc.add_layer(
        layer("odd")
            .with_opacity(1.5)
            .with_anchor(Vec2::new(-0.5, 0.0)),
        None,
    );
    let (doc, _) = doc.add_layer(
        layer("nan").with_position(Point::new(f64::NAN, 0.0)),
        None,
    );
    let report = doc.diagnose();

    assert!(report.iter().any(|d| d.layer_id.is_none() && d.severity == Severity::Warning));
    assert!(report
        .iter()
        .any(|d| d.layer_id == Some(LayerId(0)) && d.severity == Severity::Error));
    assert_eq!(
        report
            .iter()
            .filter(|d| d.layer_id == Some(LayerId(1)))
            .count(),
        3
    );
    assert!(report
        .iter()
        .any(|d| d.layer_id == Some(LayerId(2)) && d.message.contains("not finite")));
}

#[test]
fn clean_document_has_no_findings() {
    let doc = with_n_layers(2);
    assert!(doc.diagnose().is_empty());
}
