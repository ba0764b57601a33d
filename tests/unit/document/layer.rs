use super::*;

fn red(w: u32, h: u32) -> PixelBuffer {
    PixelBuffer::filled(w, h, [1.0, 0.0, 0.0, 1.0])
}

#[test]
fn new_layer_defaults() {
    let layer = Layer::new("bg", red(4, 3));
    assert_eq!(layer.layer_id(), LayerId::UNASSIGNED);
    assert_eq!(layer.size(), (4, 3));
    assert_eq!(layer.opacity(), 1.0);
    assert!(layer.visible());
    assert_eq!(layer.blend_mode(), BlendMode::Normal);
    assert_eq!(layer.anchor(), Vec2::ZERO);
}

#[test]
fn rgb_images_become_rgba() {
    let rgb = PixelBuffer::from_rgb8(1, 1, &[0, 128, 255]).unwrap();
    let layer = Layer::new("rgb", rgb);
    let img = layer.image().unwrap();
    assert_eq!(img.channels(), crate::raster::buffer::Channels::Rgba);
    assert_eq!(img.pixel(0, 0).unwrap()[3], 1.0);
}

#[test]
fn origin_subtracts_anchor_fraction() {
    let layer = Layer::new("c", red(100, 40))
        .with_position(Point::new(50.0, 50.0))
        .with_anchor(Vec2::new(0.5, 0.5));
    assert_eq!(layer.origin(), Point::new(0.0, 30.0));
}

#[test]
fn missing_image_reports_zero_size() {
    let layer = Layer::without_image("ghost");
    assert!(layer.image().is_none());
    assert_eq!(layer.size(), (0, 0));
    assert!(!layer.info().has_image);
}

#[test]
fn info_mirrors_fields() {
    let layer = Layer::new("fx", red(2, 2))
        .with_id(LayerId(7))
        .with_opacity(0.25)
        .with_blend_mode(BlendMode::Screen)
        .with_meta("source", "gen");
    let info = layer.info();
    assert_eq!(info.layer_id, LayerId(7));
    assert_eq!(info.width, 2);
    assert_eq!(info.blend_mode, BlendMode::Screen);
    assert_eq!(layer.metadata()["source"], serde_json::json!("gen"));
}
