use image::{Rgba, RgbaImage, imageops::FilterType};

use crate::{engine::seed::background_swatch, render::canvas::Canvas};

/// Stretches `mask` over `canvas` and paints it in two shades of the
/// background: the exact background where the mask is opaque, and the
/// background one alpha step off where it is not. Preserve-mode seeding then
/// sees the second shade as occupied.
pub fn apply_mask(canvas: &mut Canvas, mask: &Canvas, background: Rgba<u8>) {
    let (width, height) = (canvas.width(), canvas.height());
    let scaled = if (mask.width(), mask.height()) == (width, height) {
        mask.image().clone()
    } else {
        image::imageops::resize(mask.image(), width, height, FilterType::Triangle)
    };

    let bg = background_swatch(background);
    let reserved = Rgba([bg[0], bg[1], bg[2], bg[3].saturating_sub(1)]);
    let painted = RgbaImage::from_fn(width, height, |x, y| {
        if scaled.get_pixel(x, y)[3] > 128 {
            bg
        } else {
            reserved
        }
    });
    canvas.draw_canvas(&Canvas::from_image(painted));
}
