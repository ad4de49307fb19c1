pub mod engine;
pub mod extract;
pub mod preprocess;
pub mod setup;

pub use engine::{OcrEngine, TesseractCli};
pub use setup::ensure_tesseract;

use image::RgbaImage;

use extract::decode_digits;
use preprocess::{extract_color_mask, prepare_for_ocr};

/// High-level function: zone capture → amber counter value.
///
/// Isolates amber pixels, upscales and inverts the mask, then reads digits
/// under every segmentation mode. `None` means no confident read this frame.
pub fn read_amber_value(img: &RgbaImage, engine: &dyn OcrEngine) -> Option<String> {
    let mask = extract_color_mask(img)?;
    let prepared = prepare_for_ocr(&mask);
    decode_digits(engine, &prepared)
}
