use super::*;

#[test]
fn transparent_becomes_background() {
    let out = flatten_over_white(&PixelBuffer::transparent(2, 1));
    assert_eq!(out.channels(), Channels::Rgb);
    assert_eq!(out.samples(), &[1.0; 6]);
}

#[test]
fn partial_alpha_mixes_with_background() {
    let img = PixelBuffer::filled(1, 1, [1.0, 0.0, 0.0, 0.5]);
    let out = flatten_onto(&img, [0.0, 0.0, 1.0]);
    assert_eq!(out.samples(), &[0.5, 0.0, 0.5]);
}

#[test]
fn rgb_passes_through() {
    let rgb = PixelBuffer::new(1, 1, Channels::Rgb, vec![0.2, 0.3, 0.4]).unwrap();
    assert_eq!(flatten_over_white(&rgb), rgb);
}
