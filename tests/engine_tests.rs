//! # Engine Tests
//!
//! Properties of the font size search and of painting through a real
//! raster canvas, using a deterministic block-glyph rasterizer.

mod common;

use common::{BlockGlyphs, NoGlyphs, WHITE, blank};
use image::Rgba;
use nametag::canvas::{Canvas, GlyphRasterizer, RasterCanvas};
use nametag::document::Rect;
use nametag::render::{self, MIN_FONT_SIZE, RenderError, fit_font_size, font_for};
use nametag::style::{TextDecoration, TextStyle};
use pretty_assertions::assert_eq;

const SAMPLES: &[&str] = &["Alice", "Mary-Anne O'Connor", "W", "iiiiiiii", "Bartholomew"];

fn fit(text: &str, width: f32, height: f32, style: &TextStyle) -> u32 {
    let mut canvas = RasterCanvas::new(blank(1, 1), &BlockGlyphs);
    fit_font_size(&mut canvas, text, width, height, style).unwrap()
}

fn paint(text: &str, rect: Rect, style: &TextStyle) -> image::RgbaImage {
    let mut canvas = RasterCanvas::new(blank(300, 120), &BlockGlyphs);
    render::render(&mut canvas, text, &rect, style, 1.0, 1.0).unwrap();
    canvas.into_image()
}

// ============================================================================
// FIT SEARCH
// ============================================================================

#[test]
fn test_fit_is_deterministic() {
    let style = TextStyle {
        letter_spacing: 3.0,
        ..Default::default()
    };
    for text in SAMPLES {
        let first = fit(text, 240.0, 70.0, &style);
        for _ in 0..5 {
            assert_eq!(fit(text, 240.0, 70.0, &style), first, "text {:?}", text);
        }
    }
}

#[test]
fn test_fit_is_monotonic_in_width() {
    let style = TextStyle::default();
    for text in SAMPLES {
        let mut previous = 0;
        for width in (10..600).step_by(7) {
            let size = fit(text, width as f32, 80.0, &style);
            assert!(
                size >= previous,
                "{:?}: width {} gave {} after {}",
                text,
                width,
                size,
                previous
            );
            previous = size;
        }
    }
}

#[test]
fn test_fit_is_monotonic_in_height() {
    let style = TextStyle::default();
    let mut previous = u32::MAX;
    for height in (10..300).rev().step_by(5) {
        let size = fit("Alice", 400.0, height as f32, &style);
        assert!(size <= previous, "height {} gave {} after {}", height, size, previous);
        previous = size;
    }
}

#[test]
fn test_fit_respects_bounds() {
    let styles = [
        TextStyle::default(),
        TextStyle {
            letter_spacing: 5.0,
            line_height: 1.5,
            ..Default::default()
        },
        TextStyle {
            letter_spacing: -1.5,
            line_height: 0.9,
            ..Default::default()
        },
    ];
    for style in &styles {
        for text in SAMPLES {
            for (width, height) in [(300.0, 80.0), (120.0, 200.0), (64.0, 30.0), (900.0, 45.0)] {
                let size = fit(text, width, height, style);
                if size == MIN_FONT_SIZE {
                    continue;
                }
                let measured = BlockGlyphs
                    .measure(&font_for(style, size as f32), text)
                    .unwrap();
                let gaps = (text.chars().count() - 1) as f32;
                assert!(measured + style.letter_spacing * gaps <= width - 4.0);
                assert!(size as f32 * style.line_height <= height - 4.0);

                // The next size up must not fit, or the search stopped early
                let bigger = size as f32 + 1.0;
                let measured = BlockGlyphs.measure(&font_for(style, bigger), text).unwrap();
                let overflows = measured + style.letter_spacing * gaps > width - 4.0
                    || bigger * style.line_height > height - 4.0
                    || bigger > width.max(height);
                assert!(overflows, "{:?} in {}x{} stopped at {}", text, width, height, size);
            }
        }
    }
}

#[test]
fn test_degenerate_box_gets_floor_size() {
    let style = TextStyle::default();
    assert_eq!(fit("A very long name indeed", 20.0, 20.0, &style), MIN_FONT_SIZE);
    assert_eq!(fit("Alice", 2.0, 2.0, &style), MIN_FONT_SIZE);
    assert_eq!(fit("Alice", 0.0, 0.0, &style), MIN_FONT_SIZE);
}

// ============================================================================
// PAINTING
// ============================================================================

#[test]
fn test_paints_centered_inside_rect() {
    let rect = Rect::new(50.0, 20.0, 200.0, 80.0);
    let image = paint("Alice", rect, &TextStyle::default());

    let painted: Vec<(u32, u32)> = image
        .enumerate_pixels()
        .filter(|(_, _, p)| **p != WHITE)
        .map(|(x, y, _)| (x, y))
        .collect();
    assert!(!painted.is_empty());
    for (x, y) in &painted {
        assert!((50..250).contains(x) && (20..100).contains(y), "pixel {},{} outside", x, y);
    }

    let min_x = painted.iter().map(|p| p.0).min().unwrap() as i32;
    let max_x = painted.iter().map(|p| p.0).max().unwrap() as i32;
    assert!(((min_x + max_x) / 2 - 150).abs() <= 1);
}

#[test]
fn test_invalid_shadow_renders_like_none() {
    let rect = Rect::new(20.0, 20.0, 260.0, 80.0);
    let plain = paint("Bob", rect, &TextStyle::default());
    let invalid = paint(
        "Bob",
        rect,
        &TextStyle {
            text_shadow: "invalid".to_string(),
            ..Default::default()
        },
    );
    assert!(plain == invalid);
}

#[test]
fn test_shadow_paints_offset_copy() {
    let rect = Rect::new(20.0, 20.0, 260.0, 80.0);
    let plain = paint("Bob", rect, &TextStyle::default());
    let shadowed = paint(
        "Bob",
        rect,
        &TextStyle {
            color: "#ffffff".to_string(),
            text_shadow: "6px 6px 0px #ff0000".to_string(),
            ..Default::default()
        },
    );
    assert!(plain != shadowed);
    assert!(shadowed.pixels().any(|p| *p == Rgba([255, 0, 0, 255])));
}

#[test]
fn test_huge_shadow_blur_still_paints() {
    let rect = Rect::new(20.0, 20.0, 260.0, 80.0);
    let plain = paint("Bob", rect, &TextStyle::default());
    for shadow in [
        "2px 2px 200000px #000000",
        "2px 2px 4294967295px #ff0000",
        "-100000px 100000px 40px #ff0000",
    ] {
        let style = TextStyle {
            text_shadow: shadow.to_string(),
            ..Default::default()
        };
        let shadowed = paint("Bob", rect, &style);
        // The solid fill sits on top of whatever the shadow left behind
        let fill = plain.enumerate_pixels().filter(|(_, _, p)| **p != WHITE);
        for (x, y, pixel) in fill {
            assert_eq!(shadowed.get_pixel(x, y), pixel, "{} at {},{}", shadow, x, y);
        }
    }
}

#[test]
fn test_zero_blur_shadow_is_sharp() {
    let rect = Rect::new(20.0, 20.0, 260.0, 80.0);
    let style = TextStyle {
        color: "#ffffff".to_string(),
        text_shadow: "0px 0px 0px #ff0000".to_string(),
        ..Default::default()
    };
    // No offset and no blur: the shadow hides exactly under the fill
    let image = paint("Bob", rect, &style);
    assert!(image.pixels().all(|p| *p == WHITE));
}

#[test]
fn test_opacity_blends_with_background() {
    let image = paint(
        "W",
        Rect::new(100.0, 20.0, 100.0, 80.0),
        &TextStyle {
            opacity: 0.5,
            ..Default::default()
        },
    );
    assert_eq!(*image.get_pixel(150, 60), Rgba([128, 128, 128, 255]));
    assert!(image.pixels().all(|p| p[0] >= 127));
}

#[test]
fn test_underline_bridges_letter_gaps() {
    // Size 80 (height bound), so the underline sits at 60 + 80/4 = 80
    let rect = Rect::new(20.0, 10.0, 260.0, 100.0);
    let spaced = TextStyle {
        letter_spacing: 12.0,
        ..Default::default()
    };
    let underlined_style = TextStyle {
        text_decoration: TextDecoration::Underline,
        ..spaced.clone()
    };
    let plain = paint("Ada", rect, &spaced);
    let underlined = paint("Ada", rect, &underlined_style);

    let extra: Vec<u32> = underlined
        .enumerate_pixels()
        .filter(|(x, y, p)| **p != WHITE && *plain.get_pixel(*x, *y) == WHITE)
        .map(|(_, y, _)| y)
        .collect();
    assert!(!extra.is_empty());
    assert!(extra.iter().all(|y| (76..=84).contains(y)), "{:?}", extra);
}

#[test]
fn test_unmeasurable_canvas_refuses() {
    let mut canvas = RasterCanvas::new(blank(100, 50), &NoGlyphs);
    let result = render::render(
        &mut canvas,
        "Alice",
        &Rect::new(0.0, 0.0, 100.0, 50.0),
        &TextStyle::default(),
        1.0,
        1.0,
    );
    assert_eq!(result, Err(RenderError::MeasurementUnavailable));
    assert_eq!(canvas.state_stack().depth(), 0);
    assert!(canvas.image().pixels().all(|p| *p == WHITE));
}

#[test]
fn test_preview_scale_matches_downscaled_rect() {
    let style = TextStyle::default();
    let area = Rect::new(100.0, 40.0, 400.0, 120.0);

    let mut scaled = RasterCanvas::new(blank(300, 120), &BlockGlyphs);
    render::render(&mut scaled, "Alice", &area, &style, 0.5, 0.5).unwrap();

    let direct = paint("Alice", area.scaled(0.5, 0.5), &style);
    assert!(scaled.into_image() == direct);
}
