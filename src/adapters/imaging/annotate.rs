use image::{Rgb, RgbImage};

use crate::domain::detection::Detection;

const PALETTE: [[u8; 3]; 20] = [
    [0xFF, 0x38, 0x38], [0xFF, 0x9D, 0x97], [0xFF, 0x70, 0x1F], [0xFF, 0xB2, 0x1D],
    [0xCF, 0xD2, 0x31], [0x48, 0xF9, 0x0A], [0x92, 0xCC, 0x17], [0x3D, 0xDB, 0x86],
    [0x1A, 0x93, 0x34], [0x00, 0xD4, 0xBB], [0x2C, 0x99, 0xA8], [0x00, 0xC2, 0xFF],
    [0x34, 0x45, 0x93], [0x64, 0x73, 0xFF], [0x00, 0x18, 0xEC], [0x84, 0x38, 0xFF],
    [0x52, 0x00, 0x85], [0xCB, 0x38, 0xFF], [0xFF, 0x95, 0xC8], [0xFF, 0x37, 0xC7],
];

pub fn class_color(class_id: usize) -> Rgb<u8> {
    Rgb(PALETTE[class_id % PALETTE.len()])
}

/// Line width that scales with the image, never below 2px.
pub fn line_width(width: u32, height: u32) -> u32 {
    ((((width + height) as f32) / 2.0 * 0.003).round() as u32).max(2)
}

/// Copy of `source` with one coloured box per detection and a filled tab
/// above each box whose length grows with the confidence.
pub fn annotate(source: &RgbImage, detections: &[Detection]) -> RgbImage {
    let mut canvas = source.clone();
    let (w, h) = canvas.dimensions();
    if w == 0 || h == 0 {
        return canvas;
    }
    let lw = line_width(w, h);

    for det in detections {
        let Some([x0, y0, x1, y1]) = clamp_box(det, w, h) else { continue };
        let color = class_color(det.class_id);
        draw_rect(&mut canvas, [x0, y0, x1, y1], color, lw);

        let tab_h = (lw * 5).min(h);
        let tab_w = ((x1 - x0) as f32 * det.score.clamp(0.0, 1.0)).max(lw as f32) as u32;
        let ty0 = if y0 >= tab_h { y0 - tab_h } else { y0 };
        fill_rect(&mut canvas, [x0, ty0, (x0 + tab_w).min(w - 1), (ty0 + tab_h).min(h - 1)], color);
    }
    canvas
}

fn clamp_box(det: &Detection, w: u32, h: u32) -> Option<[u32; 4]> {
    let clamp = |v: f32, max: u32| -> u32 { v.max(0.0).min((max - 1) as f32) as u32 };
    let x0 = clamp(det.x1, w);
    let y0 = clamp(det.y1, h);
    let x1 = clamp(det.x2, w);
    let y1 = clamp(det.y2, h);
    if x0 > x1 || y0 > y1 {
        return None;
    }
    Some([x0, y0, x1, y1])
}

fn draw_rect(img: &mut RgbImage, bbox: [u32; 4], color: Rgb<u8>, thickness: u32) {
    let (w, h) = img.dimensions();
    let [x0, y0, x1, y1] = bbox;
    for t in 0..thickness {
        let xx0 = x0.saturating_add(t);
        let yy0 = y0.saturating_add(t);
        let xx1 = x1.saturating_sub(t);
        let yy1 = y1.saturating_sub(t);
        if xx0 >= w || yy0 >= h || xx0 > xx1 || yy0 > yy1 {
            break;
        }
        for x in xx0..=xx1 {
            img.put_pixel(x, yy0, color);
            img.put_pixel(x, yy1, color);
        }
        for y in yy0..=yy1 {
            img.put_pixel(xx0, y, color);
            img.put_pixel(xx1, y, color);
        }
    }
}

fn fill_rect(img: &mut RgbImage, bbox: [u32; 4], color: Rgb<u8>) {
    let [x0, y0, x1, y1] = bbox;
    for y in y0..=y1 {
        for x in x0..=x1 {
            img.put_pixel(x, y, color);
        }
    }
}
