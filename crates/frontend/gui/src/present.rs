//! Software presentation path: RGB565 to the window's ARGB buffer.
//!
//! The conversion core stops at packed RGB565; minifb wants 0RGB u32
//! pixels. This applies the display layout (scale factors and pan) with
//! nearest-neighbor sampling while expanding. Pixels outside the scaled
//! source are painted black.

use cadence_core::video::layout::DisplayLayout;

/// Expand a 565 pixel to 0xRRGGBB, replicating the component high bits
/// into the low bits so full intensity maps to 0xFF.
#[inline]
pub fn rgb565_to_argb(pixel: u16) -> u32 {
    let r5 = (pixel >> 11) & 0x1F;
    let g6 = (pixel >> 5) & 0x3F;
    let b5 = pixel & 0x1F;
    let r = ((r5 << 3) | (r5 >> 2)) as u32;
    let g = ((g6 << 2) | (g6 >> 4)) as u32;
    let b = ((b5 << 3) | (b5 >> 2)) as u32;
    (r << 16) | (g << 8) | b
}

/// Render the converted frame into the host buffer per the layout.
pub fn compose(
    frame: &[u16],
    src_width: usize,
    src_height: usize,
    layout: &DisplayLayout,
    host: &mut [u32],
    host_width: usize,
    host_height: usize,
) {
    let inv_sx = 1.0 / layout.scale_x();
    let inv_sy = 1.0 / layout.scale_y();
    let pan_x = layout.pan_x();
    let pan_y = layout.pan_y();

    for y in 0..host_height {
        let sy = ((y as i32 - pan_y) as f32 * inv_sy) as usize;
        let row_valid = sy < src_height;
        let src_row = &frame[if row_valid { sy * src_width } else { 0 }..];

        for x in 0..host_width {
            let sx = ((x as i32 - pan_x) as f32 * inv_sx) as usize;
            host[y * host_width + x] = if row_valid && sx < src_width {
                rgb565_to_argb(src_row[sx])
            } else {
                0
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::video::layout::ScaleMode;
    use cadence_core::video::rgb565;

    #[test]
    fn test_565_expansion_hits_full_scale() {
        assert_eq!(rgb565_to_argb(0xFFFF), 0x00FFFFFF);
        assert_eq!(rgb565_to_argb(0x0000), 0x00000000);
        assert_eq!(rgb565_to_argb(0xF800), 0x00FF0000);
        assert_eq!(rgb565_to_argb(0x07E0), 0x0000FF00);
        assert_eq!(rgb565_to_argb(0x001F), 0x000000FF);
    }

    #[test]
    fn test_compose_unscaled_copies_one_to_one() {
        let src_w = 4;
        let src_h = 2;
        let frame: Vec<u16> = (0..8u8).map(|i| rgb565(i * 30, 0, 0)).collect();
        let layout = DisplayLayout::new(src_w, src_h, src_w, src_h);

        let mut host = vec![0xDEADu32; src_w * src_h];
        compose(&frame, src_w, src_h, &layout, &mut host, src_w, src_h);

        for (i, &px) in host.iter().enumerate() {
            assert_eq!(px, rgb565_to_argb(frame[i]), "pixel {}", i);
        }
    }

    #[test]
    fn test_compose_paints_outside_black() {
        // Host larger than the unscaled source: the overhang is black
        let frame = vec![0xFFFFu16; 4];
        let layout = DisplayLayout::new(4, 4, 2, 2);

        let mut host = vec![0xDEADu32; 16];
        compose(&frame, 2, 2, &layout, &mut host, 4, 4);

        for y in 0..4 {
            for x in 0..4 {
                let expect = if x < 2 && y < 2 { 0x00FFFFFF } else { 0 };
                assert_eq!(host[y * 4 + x], expect, "({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_compose_stretch_fills_host() {
        let frame = vec![rgb565(0, 255, 0); 4];
        let mut layout = DisplayLayout::new(8, 6, 2, 2);
        layout.set_mode(ScaleMode::Stretch);

        let mut host = vec![0u32; 8 * 6];
        compose(&frame, 2, 2, &layout, &mut host, 8, 6);

        assert!(host.iter().all(|&px| px == 0x0000FF00));
    }
}
