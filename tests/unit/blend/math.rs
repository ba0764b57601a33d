use super::*;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}

fn solid_rgba(w: u32, h: u32, px: [f32; 4]) -> PixelBuffer {
    PixelBuffer::filled(w, h, px)
}

#[test]
fn multiply_scenario() {
    let base = solid_rgba(1, 1, [0.8, 0.8, 0.8, 1.0]);
    let overlay = solid_rgba(1, 1, [0.5, 0.5, 0.5, 1.0]);
    let out = blend(BlendMode::Multiply, &base, &overlay, 1.0).unwrap();
    let px = out.pixel(0, 0).unwrap();
    for c in &px[..3] {
        assert!(approx(*c, 0.4), "{px:?}");
    }
    assert!(approx(px[3], 1.0));
}

#[test]
fn zero_opacity_leaves_base_unchanged_for_every_mode() {
    let base = PixelBuffer::new(
        2,
        1,
        Channels::Rgba,
        vec![0.1, 0.6, 0.9, 0.5, 0.3, 0.3, 0.7, 1.0],
    )
    .unwrap();
    let overlay = solid_rgba(2, 1, [0.7, 0.2, 0.4, 1.0]);
    for mode in BlendMode::ALL {
        let out = blend(mode, &base, &overlay, 0.0).unwrap();
        for (a, b) in out.samples().iter().zip(base.samples()) {
            assert!(approx(*a, *b), "{mode}");
        }
    }
}

#[test]
fn full_opacity_opaque_overlay_is_the_formula_value() {
    let (b, o) = (0.3f32, 0.6f32);
    let base = solid_rgba(1, 1, [b, b, b, 1.0]);
    let overlay = solid_rgba(1, 1, [o, o, o, 1.0]);
    for mode in BlendMode::ALL {
        let out = blend(mode, &base, &overlay, 1.0).unwrap();
        let px = out.pixel(0, 0).unwrap();
        assert!(approx(px[0], blend_channel(mode, b, o)), "{mode}: {px:?}");
    }
}

#[test]
fn channel_formulas() {
    assert!(approx(blend_channel(BlendMode::Screen, 0.5, 0.5), 0.75));
    assert!(approx(blend_channel(BlendMode::Overlay, 0.25, 0.5), 0.25));
    assert!(approx(blend_channel(BlendMode::Overlay, 0.75, 0.5), 0.75));
    assert!(approx(blend_channel(BlendMode::HardLight, 0.5, 0.25), 0.25));
    assert!(approx(blend_channel(BlendMode::SoftLight, 0.25, 1.0), 0.5));
    assert!(approx(blend_channel(BlendMode::SoftLight, 0.5, 0.0), 0.25));
    assert!(approx(blend_channel(BlendMode::Darken, 0.2, 0.7), 0.2));
    assert!(approx(blend_channel(BlendMode::Lighten, 0.2, 0.7), 0.7));
    assert!(approx(blend_channel(BlendMode::Difference, 0.2, 0.7), 0.5));
    assert!(approx(blend_channel(BlendMode::Exclusion, 0.5, 0.5), 0.5));
}

#[test]
fn dodge_and_burn_edges() {
    assert_eq!(blend_channel(BlendMode::ColorDodge, 0.7, 0.0), 0.0);
    assert_eq!(blend_channel(BlendMode::ColorDodge, 0.1, 1.0), 1.0);
    assert!(approx(blend_channel(BlendMode::ColorDodge, 0.25, 0.5), 0.5));
    assert_eq!(blend_channel(BlendMode::ColorDodge, 0.8, 0.5), 1.0);

    assert_eq!(blend_channel(BlendMode::ColorBurn, 0.7, 0.0), 0.0);
    assert!(approx(blend_channel(BlendMode::ColorBurn, 0.3, 1.0), 0.3));
    assert!(approx(blend_channel(BlendMode::ColorBurn, 0.75, 0.5), 0.5));
    assert_eq!(blend_channel(BlendMode::ColorBurn, 0.2, 0.5), 0.0);
}

#[test]
fn half_opacity_normal_over_red() {
    let base = solid_rgba(1, 1, [1.0, 0.0, 0.0, 1.0]);
    let overlay = solid_rgba(1, 1, [0.0, 0.0, 1.0, 1.0]);
    let px = blend(BlendMode::Normal, &base, &overlay, 0.5)
        .unwrap()
        .pixel(0, 0)
        .unwrap();
    assert!(approx(px[0], 0.5));
    assert!(approx(px[2], 0.5));
    assert!(approx(px[3], 1.0));
}

#[test]
fn overlay_alpha_scales_coverage_and_accumulates_alpha() {
    let base = PixelBuffer::transparent(1, 1);
    let overlay = solid_rgba(1, 1, [1.0, 1.0, 1.0, 0.5]);
    let px = blend(BlendMode::Normal, &base, &overlay, 0.5)
        .unwrap()
        .pixel(0, 0)
        .unwrap();
    assert!(approx(px[3], 0.25));
    assert!(approx(px[0], 1.0));
}

#[test]
fn translucent_normal_keeps_its_color_over_empty_backdrop() {
    let base = PixelBuffer::transparent(1, 1);
    let overlay = solid_rgba(1, 1, [1.0, 0.0, 0.0, 1.0]);
    let px = blend(BlendMode::Normal, &base, &overlay, 0.5)
        .unwrap()
        .pixel(0, 0)
        .unwrap();
    assert!(approx(px[0], 1.0), "{px:?}");
    assert!(approx(px[1], 0.0));
    assert!(approx(px[3], 0.5));
}

#[test]
fn normal_over_translucent_backdrop_weights_by_alpha() {
    // Backdrop red at alpha 0.5, overlay blue at coverage 0.5:
    // out_a = 0.5 + 0.5 * 0.5 = 0.75, blue = 0.5 / 0.75, red = 0.25 / 0.75.
    let px = blend_pixel(
        BlendMode::Normal,
        [1.0, 0.0, 0.0, 0.5],
        [0.0, 0.0, 1.0, 1.0],
        0.5,
    );
    assert!(approx(px[3], 0.75));
    assert!(approx(px[0], 1.0 / 3.0), "{px:?}");
    assert!(approx(px[2], 2.0 / 3.0), "{px:?}");

    assert_eq!(
        blend_pixel(BlendMode::Normal, [0.0; 4], [0.3, 0.3, 0.3, 0.0], 1.0),
        [0.0; 4]
    );
}

#[test]
fn rgb_inputs_stay_rgb_mixed_inputs_become_rgba() {
    let rgb = PixelBuffer::new(1, 1, Channels::Rgb, vec![0.8, 0.8, 0.8]).unwrap();
    let rgb2 = PixelBuffer::new(1, 1, Channels::Rgb, vec![0.5, 0.5, 0.5]).unwrap();
    let out = blend(BlendMode::Multiply, &rgb, &rgb2, 1.0).unwrap();
    assert_eq!(out.channels(), Channels::Rgb);
    assert!(approx(out.samples()[0], 0.4));

    let rgba = solid_rgba(1, 1, [0.5, 0.5, 0.5, 1.0]);
    let mixed = blend(BlendMode::Multiply, &rgb, &rgba, 1.0).unwrap();
    assert_eq!(mixed.channels(), Channels::Rgba);
    assert!(approx(mixed.pixel(0, 0).unwrap()[0], 0.4));
}

#[test]
fn inputs_are_not_modified() {
    let base = solid_rgba(2, 2, [0.2, 0.2, 0.2, 1.0]);
    let keep = base.clone();
    let overlay = solid_rgba(2, 2, [0.9, 0.9, 0.9, 1.0]);
    let _ = blend(BlendMode::Screen, &base, &overlay, 1.0).unwrap();
    assert_eq!(base, keep);
}

#[test]
fn size_mismatch_is_rejected() {
    let base = PixelBuffer::transparent(2, 2);
    let overlay = PixelBuffer::transparent(1, 2);
    assert!(matches!(
        blend(BlendMode::Normal, &base, &overlay, 1.0),
        Err(crate::foundation::error::StrataError::InvalidGeometry(_))
    ));
}

#[test]
fn unknown_name_blends_as_normal() {
    let base = solid_rgba(1, 1, [0.8, 0.8, 0.8, 1.0]);
    let overlay = solid_rgba(1, 1, [0.5, 0.5, 0.5, 1.0]);
    let out = blend_by_name("not-a-mode", &base, &overlay, 1.0).unwrap();
    assert!(approx(out.pixel(0, 0).unwrap()[0], 0.5));
    let out = blend_by_name("multiply", &base, &overlay, 1.0).unwrap();
    assert!(approx(out.pixel(0, 0).unwrap()[0], 0.4));
}
