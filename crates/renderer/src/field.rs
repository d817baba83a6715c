//! CPU reference of the flow-field fragment program.
//!
//! These functions mirror the GLSL in [`crate::compile`] operation for
//! operation, so they double as the executable definition of what a pixel
//! should look like. The still-frame exporter renders with them directly.

use std::ops::{Add, Mul};

use crate::types::{Palette, Rgb};

/// Number of octaves summed by [`fbm`].
pub const FBM_OCTAVES: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub const fn splat(value: f32) -> Self {
        Self { x: value, y: value }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    fn floor(self) -> Self {
        Self::new(self.x.floor(), self.y.floor())
    }

    fn fract(self) -> Self {
        Self::new(self.x - self.x.floor(), self.y - self.y.floor())
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Add<f32> for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x + rhs, self.y + rhs)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Mul<Vec2> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x * rhs.x, self.y * rhs.y)
    }
}

/// GLSL `mix`.
#[inline]
pub fn mix(x: f32, y: f32, a: f32) -> f32 {
    x * (1.0 - a) + y * a
}

/// GLSL `smoothstep`.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn mix_rgb(x: Rgb, y: Rgb, a: f32) -> Rgb {
    [mix(x[0], y[0], a), mix(x[1], y[1], a), mix(x[2], y[2], a)]
}

/// Pseudo-random value in `[0, 1)` derived from a 2D coordinate.
#[inline]
pub fn hash(p: Vec2) -> f32 {
    let s = (p.x * 12.9898 + p.y * 78.233).sin() * 43758.547;
    let value = s - s.floor();
    // x - floor(x) rounds up to 1.0 for tiny negative x.
    if value >= 1.0 {
        0.0
    } else {
        value
    }
}

/// Value noise: hashes at the four surrounding lattice corners, blended with
/// a cubic smoothstep.
pub fn noise(p: Vec2) -> f32 {
    let i = p.floor();
    let f = p.fract();

    let a = hash(i);
    let b = hash(i + Vec2::new(1.0, 0.0));
    let c = hash(i + Vec2::new(0.0, 1.0));
    let d = hash(i + Vec2::new(1.0, 1.0));

    let u = f * f * (Vec2::splat(3.0) + f * -2.0);

    mix(a, b, u.x) + (c - a) * u.y * (1.0 - u.x) + (d - b) * u.x * u.y
}

/// Three octaves of [`noise`]: frequency doubles and amplitude halves per
/// octave, starting at amplitude 0.5.
pub fn fbm(p: Vec2) -> f32 {
    let mut st = p;
    let mut value = 0.0;
    let mut amplitude = 0.5;
    for _ in 0..FBM_OCTAVES {
        value += amplitude * noise(st);
        st = st * 2.0;
        amplitude *= 0.5;
    }
    value
}

/// The two domain-warp vectors `q` and `r` for an aspect-corrected point.
pub fn warp(st: Vec2, time: f32) -> (Vec2, Vec2) {
    let q = Vec2::new(fbm(st + 0.1 * time), fbm(st + Vec2::new(1.0, 0.0)));
    let r = Vec2::new(
        fbm(st + q + Vec2::new(1.7, 9.2) + 0.15 * time),
        fbm(st + q + Vec2::new(8.3, 2.8) + 0.126 * time),
    );
    (q, r)
}

/// Palette blend driven by the field value and both warp vectors.
///
/// The last stop is weighted by `|r.x|`, not `|r|`.
pub fn blend_colors(palette: &Palette, f: f32, q: Vec2, r: Vec2) -> Rgb {
    let color = mix_rgb(
        palette.background,
        palette.mid,
        (f * f * 4.0).clamp(0.0, 1.0),
    );
    let color = mix_rgb(color, palette.accent1, q.length().clamp(0.0, 1.0));
    mix_rgb(color, palette.accent2, r.x.abs().clamp(0.0, 1.0))
}

/// Dithering grain added equally to every channel.
pub fn grain(st: Vec2, time: f32) -> f32 {
    hash(st * time) * 0.15
}

/// Edge darkening factor for an unwarped UV in `[0,1]²`.
pub fn vignette(uv: Vec2) -> f32 {
    1.0 - smoothstep(0.5, 1.5, (uv + -0.5).length())
}

/// Everything one pixel evaluation reads.
#[derive(Clone, Copy, Debug)]
pub struct ShadeInput<'a> {
    /// Pixel centre in device pixels, origin bottom-left.
    pub frag_coord: Vec2,
    pub resolution: Vec2,
    pub time: f32,
    pub palette: &'a Palette,
    /// Container opacity; 1.0 once the entrance has finished.
    pub reveal: f32,
}

/// Evaluates the full fragment program for one pixel.
pub fn shade(input: ShadeInput<'_>) -> Rgb {
    let uv = Vec2::new(
        input.frag_coord.x / input.resolution.x,
        input.frag_coord.y / input.resolution.y,
    );
    let st = Vec2::new(uv.x * (input.resolution.x / input.resolution.y), uv.y);

    let (q, r) = warp(st, input.time);
    let f = fbm(st + r);

    let grain = grain(st, input.time);
    let vignette = vignette(uv);
    let color = blend_colors(input.palette, f, q, r);
    color.map(|channel| (channel + grain) * vignette * input.reveal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_points() -> Vec<Vec2> {
        let mut points = Vec::new();
        for ix in -6..=6 {
            for iy in -6..=6 {
                points.push(Vec2::new(ix as f32 * 1.37 + 0.11, iy as f32 * 2.21 - 0.07));
            }
        }
        points.extend([
            Vec2::new(0.0, 0.0),
            Vec2::new(-1e-7, 3e-8),
            Vec2::new(1920.0, 1080.0),
            Vec2::new(-512.25, 77.5),
        ]);
        points
    }

    #[test]
    fn hash_is_deterministic_and_in_unit_range() {
        for p in sample_points() {
            let first = hash(p);
            let second = hash(p);
            assert_eq!(first.to_bits(), second.to_bits());
            assert!((0.0..1.0).contains(&first), "hash({p:?}) = {first}");
        }
    }

    #[test]
    fn noise_matches_hash_on_lattice_corners() {
        for n in -4..=4 {
            for m in -4..=4 {
                let corner = Vec2::new(n as f32, m as f32);
                assert_eq!(noise(corner), hash(corner), "corner {corner:?}");
            }
        }
    }

    #[test]
    fn noise_stays_within_corner_range() {
        for p in sample_points() {
            let value = noise(p);
            assert!((-1e-6..=1.0 + 1e-6).contains(&value), "noise({p:?}) = {value}");
        }
    }

    #[test]
    fn fbm_follows_amplitude_frequency_law() {
        for p in sample_points() {
            let expected = 0.5 * noise(p) + 0.25 * noise(p * 2.0) + 0.125 * noise(p * 4.0);
            assert_eq!(fbm(p), expected, "fbm({p:?})");
        }
    }

    #[test]
    fn blend_is_background_when_weights_are_zero() {
        let palette = Palette::default();
        let color = blend_colors(&palette, 0.0, Vec2::default(), Vec2::default());
        assert_eq!(color, palette.background);
    }

    #[test]
    fn mid_weight_grows_with_field_and_saturates() {
        let palette = Palette {
            background: [0.0, 0.0, 0.0],
            mid: [1.0, 1.0, 1.0],
            accent1: [0.0, 0.0, 0.0],
            accent2: [0.0, 0.0, 0.0],
        };
        let zero = Vec2::default();
        let mut last = -1.0;
        for step in 0..=10 {
            let f = step as f32 / 10.0;
            let weight = blend_colors(&palette, f, zero, zero)[0];
            assert!(weight >= last);
            if f * f * 4.0 >= 1.0 {
                assert_eq!(weight, 1.0, "f = {f}");
            }
            last = weight;
        }
    }

    #[test]
    fn accent2_uses_only_the_x_component_of_r() {
        let palette = Palette {
            background: [0.0, 0.0, 0.0],
            mid: [0.0, 0.0, 0.0],
            accent1: [0.0, 0.0, 0.0],
            accent2: [1.0, 1.0, 1.0],
        };
        let zero = Vec2::default();
        let color = blend_colors(&palette, 0.0, zero, Vec2::new(0.0, 0.9));
        assert_eq!(color, [0.0, 0.0, 0.0]);
        let color = blend_colors(&palette, 0.0, zero, Vec2::new(-0.25, 0.0));
        assert_eq!(color, [0.25, 0.25, 0.25]);
    }

    #[test]
    fn vignette_is_clear_at_centre_and_partial_in_corner() {
        assert_eq!(vignette(Vec2::new(0.5, 0.5)), 1.0);
        let corner = vignette(Vec2::new(0.0, 0.0));
        assert!(corner > 0.0 && corner < 1.0, "corner = {corner}");
    }

    #[test]
    fn shade_is_deterministic_and_respects_reveal() {
        let palette = Palette::default();
        let input = ShadeInput {
            frag_coord: Vec2::new(320.5, 180.5),
            resolution: Vec2::new(640.0, 360.0),
            time: 3.25,
            palette: &palette,
            reveal: 1.0,
        };
        let color = shade(input);
        assert_eq!(color, shade(input));
        assert!(color.iter().all(|channel| channel.is_finite() && *channel >= 0.0));

        let hidden = shade(ShadeInput {
            reveal: 0.0,
            ..input
        });
        assert_eq!(hidden, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn grain_vanishes_at_time_zero() {
        assert_eq!(grain(Vec2::new(0.3, 0.7), 0.0), 0.0);
    }
}
