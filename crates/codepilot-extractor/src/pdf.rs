//! PDF text-layer reading and embedded page images

use crate::error::ExtractorError;
use flate2::read::ZlibDecoder;
use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::io::Read;
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

/// Page tree depth beyond which `Resources` inheritance stops being followed
const MAX_TREE_DEPTH: usize = 32;

/// Run a PDF step, turning a panic inside lopdf into an error
pub(crate) fn guarded<T>(
    step: impl FnOnce() -> Result<T, ExtractorError>,
    on_panic: fn(String) -> ExtractorError,
) -> Result<T, ExtractorError> {
    match panic::catch_unwind(AssertUnwindSafe(step)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(on_panic(format!("panicked on malformed input: {}", message)))
        }
    }
}

/// Parse a PDF from memory
pub(crate) fn load_document(bytes: &[u8]) -> Result<Document, ExtractorError> {
    guarded(
        || Document::load_mem(bytes).map_err(ExtractorError::from),
        ExtractorError::Pdf,
    )
}

/// Concatenate the text layer of the first `max_pages` pages
///
/// Returns an empty string when the document has pages but no text.
pub(crate) fn read_text_layer(bytes: &[u8], max_pages: usize) -> Result<String, ExtractorError> {
    let doc = load_document(bytes)?;

    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().take(max_pages).collect();
    debug!(pages = page_numbers.len(), "Reading PDF text layer");

    let mut text = String::new();
    for page in page_numbers {
        match doc.extract_text(&[page]) {
            Ok(page_text) => {
                if !text.is_empty() && !page_text.is_empty() {
                    text.push('\n');
                }
                text.push_str(&page_text);
            }
            Err(e) => debug!(page, error = %e, "Page has no extractable text"),
        }
    }

    Ok(text)
}

/// Decode the image XObjects drawn on the first `max_pages` pages
///
/// Streams that cannot be decoded are skipped, not reported.
pub(crate) fn page_images(doc: &Document, max_pages: usize) -> Vec<DynamicImage> {
    let mut images = Vec::new();

    for (page_number, page_id) in doc.get_pages().into_iter().take(max_pages) {
        let Some(xobjects) = page_resources(doc, page_id)
            .and_then(|resources| resources.get(b"XObject").ok())
            .and_then(|xobjects| resolve_dict(doc, xobjects))
        else {
            debug!(page = page_number, "Page has no XObject resources");
            continue;
        };

        for (name, object) in xobjects.iter() {
            let Some(stream) = resolve_stream(doc, object) else {
                continue;
            };
            if name_of(doc, stream.dict.get(b"Subtype").ok()) != Some(b"Image".as_slice()) {
                continue;
            }
            match decode_image(doc, stream) {
                Some(image) => images.push(image),
                None => debug!(
                    page = page_number,
                    xobject = %String::from_utf8_lossy(name),
                    "Skipping undecodable page image"
                ),
            }
        }
    }

    images
}

/// The page's `Resources`, inherited from ancestors in the page tree if absent
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(resources) = node.get(b"Resources") {
            return resolve_dict(doc, resources);
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn resolve_dict<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, object)? {
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn resolve_stream<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Stream> {
    match resolve(doc, object)? {
        Object::Stream(stream) => Some(stream),
        _ => None,
    }
}

fn name_of<'a>(doc: &'a Document, object: Option<&'a Object>) -> Option<&'a [u8]> {
    match resolve(doc, object?)? {
        Object::Name(name) => Some(name.as_slice()),
        _ => None,
    }
}

fn integer(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<i64> {
    match resolve(doc, dict.get(key).ok()?)? {
        Object::Integer(value) => Some(*value),
        _ => None,
    }
}

/// Filter names in application order
fn filters<'a>(doc: &'a Document, dict: &'a Dictionary) -> Option<Vec<&'a [u8]>> {
    let Ok(filter) = dict.get(b"Filter") else {
        return Some(Vec::new());
    };
    match resolve(doc, filter)? {
        Object::Name(name) => Some(vec![name.as_slice()]),
        Object::Array(items) => items.iter().map(|item| name_of(doc, Some(item))).collect(),
        _ => None,
    }
}

/// Sample layout of a raw image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorModel {
    Gray,
    Rgb,
    Cmyk,
}

impl ColorModel {
    fn channels(self) -> usize {
        match self {
            ColorModel::Gray => 1,
            ColorModel::Rgb => 3,
            ColorModel::Cmyk => 4,
        }
    }

    fn from_components(n: i64) -> Option<Self> {
        match n {
            1 => Some(ColorModel::Gray),
            3 => Some(ColorModel::Rgb),
            4 => Some(ColorModel::Cmyk),
            _ => None,
        }
    }
}

fn color_model(doc: &Document, stream: &Stream) -> Option<ColorModel> {
    if let Ok(Object::Boolean(true)) = stream.dict.get(b"ImageMask") {
        return Some(ColorModel::Gray);
    }

    let space = resolve(doc, stream.dict.get(b"ColorSpace").ok()?)?;
    match space {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" | b"G" => Some(ColorModel::Gray),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Some(ColorModel::Rgb),
            b"DeviceCMYK" | b"CMYK" => Some(ColorModel::Cmyk),
            _ => None,
        },
        Object::Array(items) => {
            let family = name_of(doc, items.first())?;
            match family {
                b"ICCBased" => {
                    let profile = resolve_stream(doc, items.get(1)?)?;
                    ColorModel::from_components(integer(doc, &profile.dict, b"N")?)
                }
                b"CalGray" => Some(ColorModel::Gray),
                b"CalRGB" => Some(ColorModel::Rgb),
                _ => None,
            }
        }
        _ => None,
    }
}

fn decode_image(doc: &Document, stream: &Stream) -> Option<DynamicImage> {
    let filters = filters(doc, &stream.dict)?;

    // Self-describing encodings decode without the sample layout
    match filters.as_slice() {
        [b"DCTDecode"] | [b"DCT"] => return image::load_from_memory(&stream.content).ok(),
        [b"FlateDecode", b"DCTDecode"] | [b"Fl", b"DCT"] => {
            return image::load_from_memory(&inflate(&stream.content)?).ok();
        }
        _ => {}
    }

    let samples = match filters.as_slice() {
        [] => stream.content.clone(),
        [b"FlateDecode"] | [b"Fl"] => {
            let inflated = inflate(&stream.content)?;
            unpredict(doc, stream, inflated)?
        }
        _ => return None,
    };

    let width = u32::try_from(integer(doc, &stream.dict, b"Width")?).ok()?;
    let height = u32::try_from(integer(doc, &stream.dict, b"Height")?).ok()?;
    let bits = integer(doc, &stream.dict, b"BitsPerComponent").unwrap_or(8);
    let model = color_model(doc, stream)?;

    raw_to_image(&samples, width, height, bits, model)
}

fn inflate(data: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(data).read_to_end(&mut out).ok()?;
    Some(out)
}

/// Undo PNG row predictors (`Predictor` >= 10) declared in `DecodeParms`
fn unpredict(doc: &Document, stream: &Stream, data: Vec<u8>) -> Option<Vec<u8>> {
    let Some(params) = stream
        .dict
        .get(b"DecodeParms")
        .ok()
        .and_then(|p| resolve_dict(doc, p))
    else {
        return Some(data);
    };

    let predictor = integer(doc, params, b"Predictor").unwrap_or(1);
    if predictor < 10 {
        return Some(data);
    }

    let param = |key: &[u8], default: i64| {
        usize::try_from(integer(doc, params, key).unwrap_or(default).max(1)).ok()
    };
    let colors = param(b"Colors", 1)?;
    let bits = param(b"BitsPerComponent", 8)?;
    let columns = param(b"Columns", 1)?;
    let bpp = colors.checked_mul(bits)?.div_ceil(8).max(1);
    let row_len = columns.checked_mul(colors)?.checked_mul(bits)?.div_ceil(8);
    if row_len > data.len() {
        return None;
    }

    let mut out = Vec::with_capacity(data.len());
    let mut previous = vec![0u8; row_len];
    for chunk in data.chunks(row_len + 1) {
        let (&kind, row) = chunk.split_first()?;
        if row.len() < row_len {
            break;
        }
        let mut current = row.to_vec();
        for i in 0..row_len {
            let left = if i >= bpp { current[i - bpp] } else { 0 };
            let up = previous[i];
            let up_left = if i >= bpp { previous[i - bpp] } else { 0 };
            let predicted = match kind {
                0 => 0,
                1 => left,
                2 => up,
                3 => ((left as u16 + up as u16) / 2) as u8,
                4 => paeth(left, up, up_left),
                _ => return None,
            };
            current[i] = current[i].wrapping_add(predicted);
        }
        out.extend_from_slice(&current);
        previous = current;
    }
    Some(out)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

/// Build an image from uncompressed samples (8-bit any model, or 1-bit gray)
fn raw_to_image(
    samples: &[u8],
    width: u32,
    height: u32,
    bits: i64,
    model: ColorModel,
) -> Option<DynamicImage> {
    let (w, h) = (width as usize, height as usize);
    if w == 0 || h == 0 {
        return None;
    }

    match (bits, model) {
        (8, _) => {
            let channels = model.channels();
            let expected = w.checked_mul(h)?.checked_mul(channels)?;
            let samples = samples.get(..expected)?;
            match model {
                ColorModel::Gray => {
                    GrayImage::from_raw(width, height, samples.to_vec()).map(DynamicImage::ImageLuma8)
                }
                ColorModel::Rgb => {
                    RgbImage::from_raw(width, height, samples.to_vec()).map(DynamicImage::ImageRgb8)
                }
                ColorModel::Cmyk => {
                    let rgb = samples
                        .chunks_exact(4)
                        .flat_map(|px| {
                            let k = 255 - px[3] as u16;
                            [px[0], px[1], px[2]].map(|c| ((255 - c as u16) * k / 255) as u8)
                        })
                        .collect();
                    RgbImage::from_raw(width, height, rgb).map(DynamicImage::ImageRgb8)
                }
            }
        }
        (1, ColorModel::Gray) => {
            let row_len = w.div_ceil(8);
            let samples = samples.get(..row_len.checked_mul(h)?)?;
            let mut luma = Vec::with_capacity(w * h);
            for row in samples.chunks_exact(row_len) {
                for x in 0..w {
                    let bit = (row[x / 8] >> (7 - (x % 8))) & 1;
                    luma.push(if bit == 1 { 255 } else { 0 });
                }
            }
            GrayImage::from_raw(width, height, luma).map(DynamicImage::ImageLuma8)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn test_garbage_is_a_pdf_error() {
        let result = read_text_layer(b"%PDF-1.5 but not really", 5);
        assert!(matches!(result, Err(ExtractorError::Pdf(_))));
    }

    #[test]
    fn test_empty_input_is_a_pdf_error() {
        assert!(read_text_layer(&[], 5).is_err());
    }

    #[test]
    fn test_guard_turns_panic_into_error() {
        let result: Result<(), _> = guarded(|| panic!("index out of bounds"), ExtractorError::Ocr);
        match result {
            Err(ExtractorError::Ocr(message)) => assert!(message.contains("index out of bounds")),
            other => panic!("Expected Ocr error, got {:?}", other),
        }
    }

    #[test]
    fn test_guard_passes_results_through() {
        let result = guarded(|| Ok(7), ExtractorError::Pdf);
        assert_eq!(result.unwrap(), 7);
    }

    #[test]
    fn test_png_up_predictor() {
        // Two rows of two gray pixels; second row uses "Up"
        let rows = [0u8, 10, 20, 2, 5, 5];
        let mut doc = Document::with_version("1.5");
        let stream = Stream::new(
            lopdf::dictionary! {
                "DecodeParms" => lopdf::dictionary! {
                    "Predictor" => 12,
                    "Columns" => 2,
                },
            },
            vec![],
        );
        let id = doc.add_object(stream);
        let stream = doc.get_object(id).unwrap().as_stream().unwrap();

        let out = unpredict(&doc, stream, rows.to_vec()).unwrap();
        assert_eq!(out, vec![10, 20, 15, 25]);
    }

    #[test]
    fn test_one_bit_gray_expands() {
        let image = raw_to_image(&[0b1010_0000], 3, 1, 1, ColorModel::Gray).unwrap();
        let luma = image.to_luma8();
        assert_eq!(luma.as_raw(), &vec![255, 0, 255]);
    }

    #[test]
    fn test_short_sample_buffer_is_skipped() {
        assert!(raw_to_image(&[0; 10], 8, 8, 8, ColorModel::Gray).is_none());
    }
}
