use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbaImage};

/// Zones smaller than this on either axis are not worth running OCR on.
pub const MIN_MASK_EXTENT: u32 = 5;

/// Nearest-neighbour upscale factor applied before OCR.
pub const OCR_SCALE: u32 = 4;

/// Floor for each dimension of the upscaled image.
pub const MIN_OCR_EXTENT: u32 = 20;

const FOREGROUND: u8 = 255;
const BACKGROUND: u8 = 0;

/// Mid-orange to yellow text, e.g. counters drawn in amber.
fn is_mid_orange(r: i16, g: i16, b: i16) -> bool {
    r >= 170 && (80..=220).contains(&g) && b <= 130 && r > b + 50 && r >= g - 50
}

/// Saturated bright orange.
fn is_bright_orange(r: i16, g: i16, b: i16) -> bool {
    r >= 190 && (70..=210).contains(&g) && b <= 110
}

/// Returns true if the colour belongs to the orange/amber text family.
pub fn is_amber(r: u8, g: u8, b: u8) -> bool {
    let (r, g, b) = (r as i16, g as i16, b as i16);
    is_mid_orange(r, g, b) || is_bright_orange(r, g, b)
}

/// Converts a zone capture into a binary mask.
///
/// Amber pixels become white (255), everything else black (0). Alpha is ignored.
/// Returns `None` for captures smaller than `MIN_MASK_EXTENT` on either axis.
pub fn extract_color_mask(img: &RgbaImage) -> Option<GrayImage> {
    let (width, height) = img.dimensions();
    if width < MIN_MASK_EXTENT || height < MIN_MASK_EXTENT {
        return None;
    }

    let mut mask = GrayImage::new(width, height);
    for (x, y, pixel) in img.enumerate_pixels() {
        let value = if is_amber(pixel[0], pixel[1], pixel[2]) {
            FOREGROUND
        } else {
            BACKGROUND
        };
        mask.put_pixel(x, y, Luma([value]));
    }

    Some(mask)
}

/// Prepares a mask for Tesseract: 4x nearest-neighbour upscale (at least
/// `MIN_OCR_EXTENT` per side), then inverted to dark strokes on white.
pub fn prepare_for_ocr(mask: &GrayImage) -> GrayImage {
    let (width, height) = mask.dimensions();
    let new_width = (width * OCR_SCALE).max(MIN_OCR_EXTENT);
    let new_height = (height * OCR_SCALE).max(MIN_OCR_EXTENT);

    let mut scaled = imageops::resize(mask, new_width, new_height, FilterType::Nearest);
    imageops::invert(&mut scaled);
    scaled
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_is_amber_classification() {
        // Pure orange matches both rules
        assert!(is_amber(255, 165, 0));
        // Amber with a bluish tint: only the mid-orange rule
        assert!(is_amber(200, 100, 120));
        // Dark green channel: only the bright-orange rule
        assert!(is_amber(195, 75, 100));

        assert!(!is_amber(255, 255, 255), "White is not amber");
        assert!(!is_amber(0, 0, 0), "Black is not amber");
        assert!(!is_amber(180, 60, 20), "Deep red-brown is not amber");
        assert!(!is_amber(160, 120, 0), "Too dark on the red channel");
        assert!(!is_amber(220, 120, 200), "Pink is not amber");
    }

    #[test]
    fn test_mask_rejects_small_captures() {
        assert!(extract_color_mask(&RgbaImage::new(4, 30)).is_none());
        assert!(extract_color_mask(&RgbaImage::new(30, 4)).is_none());
        assert!(extract_color_mask(&RgbaImage::new(0, 0)).is_none());
        assert!(extract_color_mask(&RgbaImage::new(5, 5)).is_some());
    }

    #[test]
    fn test_mask_marks_amber_pixels() {
        let mut img = RgbaImage::from_pixel(6, 5, Rgba([30, 30, 30, 255]));
        img.put_pixel(1, 1, Rgba([250, 170, 20, 255]));
        img.put_pixel(4, 3, Rgba([210, 140, 60, 0]));

        let mask = extract_color_mask(&img).unwrap();

        assert_eq!(mask.dimensions(), (6, 5));
        assert_eq!(mask.get_pixel(1, 1)[0], 255);
        assert_eq!(mask.get_pixel(4, 3)[0], 255, "Alpha must not matter");
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
        assert_eq!(mask.pixels().filter(|p| p[0] == 255).count(), 2);
    }

    #[test]
    fn test_mask_is_per_pixel() {
        // Same colour at different positions classifies the same way,
        // regardless of neighbours.
        let mut img = RgbaImage::from_pixel(5, 5, Rgba([255, 165, 0, 255]));
        img.put_pixel(2, 2, Rgba([255, 255, 255, 255]));

        let mask = extract_color_mask(&img).unwrap();

        assert_eq!(mask.get_pixel(2, 2)[0], 0);
        assert_eq!(mask.get_pixel(1, 2)[0], 255);
        assert_eq!(mask.get_pixel(4, 4)[0], 255);
    }

    #[test]
    fn test_prepare_for_ocr_scales_and_inverts() {
        let mut mask = GrayImage::new(10, 6);
        mask.put_pixel(0, 0, Luma([255]));

        let prepared = prepare_for_ocr(&mask);

        assert_eq!(prepared.dimensions(), (40, 24));
        // Foreground block becomes a 4x4 dark patch
        assert_eq!(prepared.get_pixel(0, 0)[0], 0);
        assert_eq!(prepared.get_pixel(1, 1)[0], 0);
        assert_eq!(prepared.get_pixel(8, 8)[0], 255);
        assert_eq!(prepared.get_pixel(39, 23)[0], 255);
    }

    #[test]
    fn test_prepare_for_ocr_enforces_floor() {
        let mask = GrayImage::new(3, 2);
        let prepared = prepare_for_ocr(&mask);
        assert_eq!(prepared.dimensions(), (20, 20));
    }
}
