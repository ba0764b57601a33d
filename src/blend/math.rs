use crate::blend::mode::BlendMode;
use crate::foundation::core::clamp_unit;
use crate::foundation::error::StrataResult;
use crate::raster::buffer::{Channels, PixelBuffer};

/// Apply `mode` to one color channel. `b` is the base sample, `o` the overlay sample.
pub fn blend_channel(mode: BlendMode, b: f32, o: f32) -> f32 {
    let v = match mode {
        BlendMode::Normal => o,
        BlendMode::Multiply => b * o,
        BlendMode::Screen => 1.0 - (1.0 - b) * (1.0 - o),
        BlendMode::Overlay => {
            if b < 0.5 {
                2.0 * b * o
            } else {
                1.0 - 2.0 * (1.0 - b) * (1.0 - o)
            }
        }
        BlendMode::SoftLight => {
            if o < 0.5 {
                b - (1.0 - 2.0 * o) * b * (1.0 - b)
            } else {
                b + (2.0 * o - 1.0) * (b.sqrt() - b)
            }
        }
        BlendMode::HardLight => {
            if o < 0.5 {
                2.0 * b * o
            } else {
                1.0 - 2.0 * (1.0 - b) * (1.0 - o)
            }
        }
        BlendMode::ColorDodge => {
            if o <= 0.0 {
                0.0
            } else if o >= 1.0 {
                1.0
            } else {
                (b / (1.0 - o)).min(1.0)
            }
        }
        BlendMode::ColorBurn => {
            if o <= 0.0 {
                0.0
            } else if o >= 1.0 {
                b
            } else {
                (1.0 - (1.0 - b) / o).max(0.0)
            }
        }
        BlendMode::Darken => b.min(o),
        BlendMode::Lighten => b.max(o),
        BlendMode::Difference => (b - o).abs(),
        BlendMode::Exclusion => b + o - 2.0 * b * o,
    };
    clamp_unit(v)
}

/// Blend one straight-alpha RGBA pixel onto another.
///
/// `overlay[3] * opacity` is the coverage. Normal mode is plain source-over, so a translucent
/// pixel keeps its color over an empty backdrop. Every other mode computes the blended color
/// with its formula and mixes it into `base` by coverage.
pub fn blend_pixel(mode: BlendMode, base: [f32; 4], overlay: [f32; 4], opacity: f32) -> [f32; 4] {
    let fa = clamp_unit(overlay[3] * clamp_unit(opacity));
    if fa <= 0.0 {
        return base;
    }
    if mode == BlendMode::Normal {
        return source_over(base, overlay, fa);
    }
    let inv = 1.0 - fa;
    let mut out = [0.0f32; 4];
    for i in 0..3 {
        let blended = blend_channel(mode, base[i], overlay[i]);
        out[i] = clamp_unit(base[i] * inv + blended * fa);
    }
    out[3] = clamp_unit(base[3] + fa * (1.0 - base[3]));
    out
}

/// Straight-alpha source-over with coverage `fa`.
fn source_over(base: [f32; 4], overlay: [f32; 4], fa: f32) -> [f32; 4] {
    let back = base[3] * (1.0 - fa);
    let out_a = fa + back;
    if out_a <= 0.0 {
        return [0.0; 4];
    }
    let mut out = [0.0f32; 4];
    for i in 0..3 {
        out[i] = clamp_unit((overlay[i] * fa + base[i] * back) / out_a);
    }
    out[3] = clamp_unit(out_a);
    out
}

/// Blend `overlay` onto `base` over the whole buffer, returning a new buffer.
///
/// Both buffers must have the same dimensions. Two RGB inputs produce an RGB result; any RGBA
/// input makes the result RGBA, with RGB inputs treated as opaque. Inputs are never modified.
pub fn blend(
    mode: BlendMode,
    base: &PixelBuffer,
    overlay: &PixelBuffer,
    opacity: f32,
) -> StrataResult<PixelBuffer> {
    base.require_same_size(overlay, "blend")?;

    if base.channels() == Channels::Rgb && overlay.channels() == Channels::Rgb {
        let mut out = base.clone();
        let fa = clamp_unit(opacity);
        if fa > 0.0 {
            for (d, &o) in out.samples_mut().iter_mut().zip(overlay.samples()) {
                *d = clamp_unit(*d * (1.0 - fa) + blend_channel(mode, *d, o) * fa);
            }
        }
        return Ok(out);
    }

    let mut out = base.to_rgba();
    blend_in_place(mode, &mut out, &overlay.to_rgba(), opacity)?;
    Ok(out)
}

/// [`blend`] with the mode given by name. Unknown names fall back to normal and are logged.
pub fn blend_by_name(
    name: &str,
    base: &PixelBuffer,
    overlay: &PixelBuffer,
    opacity: f32,
) -> StrataResult<PixelBuffer> {
    blend(BlendMode::parse_or_normal(name), base, overlay, opacity)
}

/// Blend an RGBA `overlay` into an RGBA `dst`, writing through copy-on-write.
pub(crate) fn blend_in_place(
    mode: BlendMode,
    dst: &mut PixelBuffer,
    overlay: &PixelBuffer,
    opacity: f32,
) -> StrataResult<()> {
    dst.require_same_size(overlay, "blend_in_place")?;
    debug_assert_eq!(dst.channels(), Channels::Rgba);
    debug_assert_eq!(overlay.channels(), Channels::Rgba);

    let opacity = clamp_unit(opacity);
    if opacity <= 0.0 {
        return Ok(());
    }
    for (d, s) in dst
        .samples_mut()
        .chunks_exact_mut(4)
        .zip(overlay.samples().chunks_exact(4))
    {
        if s[3] <= 0.0 {
            continue;
        }
        let out = blend_pixel(mode, [d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/blend/math.rs"]
mod tests;
