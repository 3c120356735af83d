// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open scanned or photographed PDF documents with `lopdf` and
// pull out the raster behind each page.

use std::path::Path;

use flatscan_core::error::{FlatscanError, Result};
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage, imageops};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, info, instrument, warn};

use crate::image::{ImageProcessor, raster_from_raw};

/// Page-tree inheritance is never deeper than this in practice.
const MAX_TREE_DEPTH: usize = 32;

/// Reads page rasters out of existing PDF files.
///
/// Each page is expected to carry its content as an embedded image, which
/// is what scanners and phone scanning apps produce. Only images painted
/// directly by the page's content stream are found; vector content and
/// images inside form XObjects are not rendered.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
    /// Source path, if opened from a file (useful for diagnostics).
    source_path: Option<String>,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            FlatscanError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self {
            document,
            source_path: Some(path_ref.display().to_string()),
        })
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            FlatscanError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self {
            document,
            source_path: None,
        })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Return the source path if the reader was created via [`PdfReader::open`].
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    // -- Extraction -----------------------------------------------------------

    /// Extract every page as an image sized to the page at `dpi`.
    ///
    /// Pages come back in document order. Any page without a decodable
    /// embedded image fails the whole call.
    #[instrument(skip(self), fields(pages = self.page_count()))]
    pub fn page_images(&self, dpi: u32) -> Result<Vec<DynamicImage>> {
        if dpi == 0 {
            return Err(FlatscanError::InvalidConfig(
                "page resolution must be positive".into(),
            ));
        }

        let pages = self.document.get_pages();
        let mut images = Vec::with_capacity(pages.len());
        for (&page_number, &page_id) in &pages {
            images.push(self.page_image(page_number, page_id, dpi)?);
        }

        info!(pages = images.len(), dpi, "Page images extracted");
        Ok(images)
    }

    /// Decode the largest image drawn on one page and lay it out the way the
    /// page shows it: at its placement inside the MediaBox, then turned by
    /// the page's /Rotate.
    fn page_image(&self, page_number: u32, page_id: ObjectId, dpi: u32) -> Result<DynamicImage> {
        let placed = self.largest_placed_image(page_id)?.ok_or_else(|| {
            FlatscanError::Input(format!(
                "page {} has no embedded page image",
                page_number
            ))
        })?;

        let decoded = self.decode_image(placed.stream).map_err(|err| match err {
            FlatscanError::Input(detail) => {
                FlatscanError::Input(format!("page {}: {}", page_number, detail))
            }
            other => other,
        })?;
        let raster = ImageProcessor::from_dynamic(decoded).flatten_alpha();
        let (native_w, native_h) = (raster.width(), raster.height());

        let laid_out = match self.media_box(page_id) {
            Some(page_box) => lay_out_on_page(raster, placed.transform, page_box, dpi),
            None => {
                warn!(page_number, "Page has no MediaBox; keeping native raster size");
                raster
            }
        };

        let rotation = self.rotation(page_id);
        let page = laid_out.rotate(rotation);
        debug!(
            page_number,
            native_w,
            native_h,
            width = page.width(),
            height = page.height(),
            rotation,
            "Page raster decoded"
        );
        Ok(page.into_dynamic())
    }

    /// The image XObject painted by the page's content stream that covers
    /// the most pixels, with the transform in force when it was painted.
    fn largest_placed_image(&self, page_id: ObjectId) -> Result<Option<PlacedImage<'_>>> {
        let Some(xobjects) = self.page_xobjects(page_id) else {
            return Ok(None);
        };

        let content = self.document.get_page_content(page_id).map_err(|err| {
            FlatscanError::PdfError(format!("failed to read page content: {}", err))
        })?;
        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        let content = Content::decode(&content).map_err(|err| {
            FlatscanError::PdfError(format!("failed to parse page content: {}", err))
        })?;

        let mut placed: Vec<PlacedImage<'_>> = Vec::new();
        let mut saved = Vec::new();
        let mut ctm = Matrix::IDENTITY;
        for operation in &content.operations {
            match operation.operator.as_str() {
                "q" => saved.push(ctm),
                "Q" => ctm = saved.pop().unwrap_or(Matrix::IDENTITY),
                "cm" => match Matrix::from_operands(&operation.operands) {
                    Some(m) => ctm = m.then(ctm),
                    None => debug!("Ignoring malformed cm operator"),
                },
                "Do" => {
                    let Some(Object::Name(key)) = operation.operands.first() else {
                        continue;
                    };
                    let stream = match xobjects.get(key).ok().and_then(|obj| self.resolve(obj)) {
                        Some(Object::Stream(stream)) if is_image(stream) => stream,
                        _ => continue,
                    };
                    placed.push(PlacedImage {
                        stream,
                        transform: ctm,
                    });
                }
                _ => {}
            }
        }

        Ok(placed.into_iter().max_by_key(|image| {
            let width = self.integer(&image.stream.dict, b"Width").unwrap_or(0);
            let height = self.integer(&image.stream.dict, b"Height").unwrap_or(0);
            width.saturating_mul(height)
        }))
    }

    /// The XObject dictionary from the page's (possibly inherited) Resources.
    fn page_xobjects(&self, page_id: ObjectId) -> Option<&Dictionary> {
        let Object::Dictionary(resources) = self.inherited(page_id, b"Resources")? else {
            return None;
        };
        match self.resolve(resources.get(b"XObject").ok()?)? {
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    /// Clockwise page rotation in degrees, inherited through the page tree.
    fn rotation(&self, page_id: ObjectId) -> i64 {
        match self.inherited(page_id, b"Rotate") {
            Some(Object::Integer(degrees)) => degrees.rem_euclid(360),
            _ => 0,
        }
    }

    /// Decode an image XObject into pixels.
    fn decode_image(&self, stream: &Stream) -> Result<DynamicImage> {
        let filters = filter_names(&stream.dict);

        if filters.iter().any(|f| f.as_slice() == b"DCTDecode") {
            if filters.len() > 1 {
                return Err(FlatscanError::Input(
                    "chained filters around JPEG data are not supported".into(),
                ));
            }
            return image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)
                .map_err(|err| FlatscanError::ImageError(format!("failed to decode JPEG page: {}", err)));
        }

        let width = self.dimension(&stream.dict, b"Width")?;
        let height = self.dimension(&stream.dict, b"Height")?;
        let bits = self.integer(&stream.dict, b"BitsPerComponent").unwrap_or(8);
        let channels = self.channel_count(&stream.dict)?;

        let data = match filters.as_slice() {
            [] => stream.content.clone(),
            [single] if single.as_slice() == b"FlateDecode" => {
                stream.decompressed_content().map_err(|err| {
                    FlatscanError::PdfError(format!("failed to inflate page image: {}", err))
                })?
            }
            other => {
                let names: Vec<String> = other
                    .iter()
                    .map(|f| String::from_utf8_lossy(f).into_owned())
                    .collect();
                return Err(FlatscanError::Input(format!(
                    "unsupported image encoding {}",
                    names.join(" + ")
                )));
            }
        };

        match (channels, bits) {
            (1 | 3, 8) => {
                let mut data = data;
                let expected = width as usize * height as usize * channels as usize;
                if data.len() > expected {
                    data.truncate(expected);
                }
                raster_from_raw(width, height, channels, data)
            }
            (1, 1) => {
                let inverted = self.decode_is_inverted(&stream.dict);
                unpack_bilevel(width, height, &data, inverted).map(DynamicImage::ImageLuma8)
            }
            _ => Err(FlatscanError::Input(format!(
                "unsupported image layout ({} channels at {} bits)",
                channels, bits
            ))),
        }
    }

    /// Colour components per sample, from the image's ColorSpace.
    fn channel_count(&self, dict: &Dictionary) -> Result<u8> {
        let space = dict.get(b"ColorSpace").ok().and_then(|obj| self.resolve(obj));
        let channels = match space {
            Some(Object::Name(name)) => match name.as_slice() {
                b"DeviceGray" | b"CalGray" => Some(1),
                b"DeviceRGB" | b"CalRGB" => Some(3),
                _ => None,
            },
            Some(Object::Array(items)) => match items.as_slice() {
                [Object::Name(kind), profile, ..] if kind.as_slice() == b"ICCBased" => {
                    match self.resolve(profile) {
                        Some(Object::Stream(icc)) => match self.integer(&icc.dict, b"N") {
                            Some(1) => Some(1),
                            Some(3) => Some(3),
                            _ => None,
                        },
                        _ => None,
                    }
                }
                [Object::Name(kind), ..] if kind.as_slice() == b"CalGray" => Some(1),
                [Object::Name(kind), ..] if kind.as_slice() == b"CalRGB" => Some(3),
                _ => None,
            },
            // Bilevel image masks carry no colour space.
            None => Some(1),
            _ => None,
        };

        channels.ok_or_else(|| FlatscanError::Input("unsupported image colour space".into()))
    }

    /// True when a /Decode array maps sample 0 to white.
    fn decode_is_inverted(&self, dict: &Dictionary) -> bool {
        match dict.get(b"Decode").ok().and_then(|obj| self.resolve(obj)) {
            Some(Object::Array(range)) => range.first().and_then(number) == Some(1.0),
            _ => false,
        }
    }

    /// The page's MediaBox in points, inherited through the page tree.
    fn media_box(&self, page_id: ObjectId) -> Option<PageBox> {
        let Object::Array(corners) = self.inherited(page_id, b"MediaBox")? else {
            return None;
        };
        let values: Vec<f32> = corners
            .iter()
            .filter_map(|c| self.resolve(c).and_then(number))
            .collect();
        match values.as_slice() {
            &[x0, y0, x1, y1] => {
                let page_box = PageBox {
                    left: x0.min(x1),
                    bottom: y0.min(y1),
                    width: (x1 - x0).abs(),
                    height: (y1 - y0).abs(),
                };
                (page_box.width > 0.0 && page_box.height > 0.0).then_some(page_box)
            }
            _ => None,
        }
    }

    // -- Object helpers -------------------------------------------------------

    /// Look up `key` on a page node, walking up /Parent links until found.
    fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut node = page_id;
        for _ in 0..MAX_TREE_DEPTH {
            let dict = self.document.get_dictionary(node).ok()?;
            if let Ok(value) = dict.get(key) {
                return self.resolve(value);
            }
            match dict.get(b"Parent") {
                Ok(Object::Reference(parent)) => node = *parent,
                _ => return None,
            }
        }
        None
    }

    /// Follow references until a direct object is reached.
    fn resolve<'a>(&'a self, object: &'a Object) -> Option<&'a Object> {
        let mut current = object;
        for _ in 0..MAX_TREE_DEPTH {
            match current {
                Object::Reference(id) => current = self.document.get_object(*id).ok()?,
                direct => return Some(direct),
            }
        }
        None
    }

    fn integer(&self, dict: &Dictionary, key: &[u8]) -> Option<i64> {
        match self.resolve(dict.get(key).ok()?)? {
            Object::Integer(value) => Some(*value),
            _ => None,
        }
    }

    fn dimension(&self, dict: &Dictionary, key: &[u8]) -> Result<u32> {
        self.integer(dict, key)
            .and_then(|v| u32::try_from(v).ok())
            .filter(|&v| v > 0)
            .ok_or_else(|| {
                FlatscanError::Input(format!(
                    "page image has no valid /{}",
                    String::from_utf8_lossy(key)
                ))
            })
    }
}

/// An image XObject together with the transform it was painted under.
struct PlacedImage<'a> {
    stream: &'a Stream,
    transform: Matrix,
}

/// A page's MediaBox in points.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PageBox {
    left: f32,
    bottom: f32,
    width: f32,
    height: f32,
}

impl PageBox {
    fn top(&self) -> f32 {
        self.bottom + self.height
    }
}

/// A PDF transformation matrix `[a b c d e f]`, mapping `(x, y)` to
/// `(a x + c y + e, b x + d y + f)`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f32; 6]);

impl Matrix {
    const IDENTITY: Self = Self([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn from_operands(operands: &[Object]) -> Option<Self> {
        let values: Vec<f32> = operands.iter().filter_map(number).collect();
        <[f32; 6]>::try_from(values).ok().map(Self)
    }

    /// `self` applied first, then `outer`. This is what `cm` does to the
    /// current transform.
    fn then(self, outer: Matrix) -> Matrix {
        let [a, b, c, d, e, f] = self.0;
        let [oa, ob, oc, od, oe, of] = outer.0;
        Self([
            a * oa + b * oc,
            a * ob + b * od,
            c * oa + d * oc,
            c * ob + d * od,
            e * oa + f * oc + oe,
            e * ob + f * od + of,
        ])
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.0;
        (a * x + c * y + e, b * x + d * y + f)
    }

    /// `[min_x, min_y, max_x, max_y]` of the unit square, where images live
    /// in their own space.
    fn unit_square_bounds(&self) -> [f32; 4] {
        [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)]
            .into_iter()
            .map(|(x, y)| self.apply(x, y))
            .fold(
                [f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY],
                |[x0, y0, x1, y1], (x, y)| [x0.min(x), y0.min(y), x1.max(x), y1.max(y)],
            )
    }

    /// True when the image axes stay horizontal and vertical.
    fn is_axis_aligned(&self) -> bool {
        let [a, b, c, d, ..] = self.0;
        b.abs() <= a.abs() * 1e-3 && c.abs() <= d.abs() * 1e-3
    }
}

/// Resample `raster` to the area `transform` paints on the page and draw it
/// on a white page of the MediaBox size. A raster painted over the whole
/// page is returned as the page itself.
fn lay_out_on_page(
    raster: ImageProcessor,
    transform: Matrix,
    page_box: PageBox,
    dpi: u32,
) -> ImageProcessor {
    let page_w = points_to_pixels(page_box.width, dpi);
    let page_h = points_to_pixels(page_box.height, dpi);
    let [min_x, min_y, max_x, max_y] = transform.unit_square_bounds();
    if !(min_x.is_finite() && min_y.is_finite() && max_x > min_x && max_y > min_y) {
        warn!("Page image has a degenerate placement; stretching it over the page");
        return raster.resize_exact(page_w, page_h);
    }

    let width = points_to_pixels(max_x - min_x, dpi);
    let height = points_to_pixels(max_y - min_y, dpi);
    let mut image = raster.resize_exact(width, height).into_dynamic();

    let [a, _, _, d, ..] = transform.0;
    if transform.is_axis_aligned() {
        // Image space has its first row at the top of the unit square.
        if a < 0.0 {
            image = image.fliph();
        }
        if d < 0.0 {
            image = image.flipv();
        }
    } else {
        warn!("Page image is rotated or skewed on the page; drawing its bounding box");
    }

    let x = points_to_offset(min_x - page_box.left, dpi);
    let y = points_to_offset(page_box.top() - max_y, dpi);
    if (x, y, width, height) == (0, 0, page_w, page_h) {
        return ImageProcessor::from_dynamic(image);
    }

    debug!(x, y, width, height, page_w, page_h, "Image covers part of the page");
    let page = if image.color().has_color() {
        let mut canvas = RgbImage::from_pixel(page_w, page_h, Rgb([255, 255, 255]));
        imageops::overlay(&mut canvas, &image.to_rgb8(), x, y);
        DynamicImage::ImageRgb8(canvas)
    } else {
        let mut canvas = GrayImage::from_pixel(page_w, page_h, Luma([255]));
        imageops::overlay(&mut canvas, &image.to_luma8(), x, y);
        DynamicImage::ImageLuma8(canvas)
    };
    ImageProcessor::from_dynamic(page)
}

fn is_image(stream: &Stream) -> bool {
    name_of(&stream.dict, b"Subtype") == Some(b"Image".as_slice())
}

fn name_of<'a>(dict: &'a Dictionary, key: &[u8]) -> Option<&'a [u8]> {
    match dict.get(key).ok()? {
        Object::Name(name) => Some(name.as_slice()),
        _ => None,
    }
}

/// Filter names on a stream, in application order.
fn filter_names(dict: &Dictionary) -> Vec<Vec<u8>> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Object::Name(name) => Some(name.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

fn points_to_pixels(points: f32, dpi: u32) -> u32 {
    ((points / 72.0 * dpi as f32).round() as u32).max(1)
}

fn points_to_offset(points: f32, dpi: u32) -> i64 {
    (points / 72.0 * dpi as f32).round() as i64
}

/// Expand 1-bit samples (rows padded to whole bytes) to 0/255 gray.
fn unpack_bilevel(width: u32, height: u32, data: &[u8], inverted: bool) -> Result<GrayImage> {
    let stride = (width as usize).div_ceil(8);
    if data.len() < stride * height as usize {
        return Err(FlatscanError::Input(format!(
            "bilevel page image holds {} bytes, expected {}",
            data.len(),
            stride * height as usize
        )));
    }

    Ok(GrayImage::from_fn(width, height, |x, y| {
        let byte = data[y as usize * stride + x as usize / 8];
        let bit = (byte >> (7 - (x % 8))) & 1 == 1;
        Luma([if bit != inverted { 255 } else { 0 }])
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;
    use std::io::Cursor;

    fn name(value: &str) -> Object {
        Object::Name(value.as_bytes().to_vec())
    }

    fn media_box(w: i64, h: i64) -> Object {
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(w),
            Object::Integer(h),
        ])
    }

    struct TestPage {
        image: (Dictionary, Vec<u8>),
        /// Content stream; `{}` stands for the image's resource name.
        contents: String,
        rotate: Option<i64>,
    }

    /// Build a PDF whose pages each paint one image XObject. Resources sit
    /// on the page tree root, so every page sees every image and must go by
    /// its content stream to find its own.
    fn build_pdf(pages: Vec<TestPage>, page_size: (i64, i64)) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut xobjects = Dictionary::new();
        let mut kids = Vec::new();
        for (index, page) in pages.into_iter().enumerate() {
            let (mut dict, data) = page.image;
            dict.set("Type", name("XObject"));
            dict.set("Subtype", name("Image"));
            let image_id = doc.add_object(Stream::new(dict, data));
            let key = format!("Im{}", index);
            xobjects.set(key.clone(), Object::Reference(image_id));

            let contents = page.contents.replace("{}", &key);
            let contents_id = doc.add_object(Stream::new(Dictionary::new(), contents.into_bytes()));
            let mut page_dict = dictionary! {
                "Type" => name("Page"),
                "Parent" => Object::Reference(pages_id),
                "Contents" => Object::Reference(contents_id),
            };
            if let Some(degrees) = page.rotate {
                page_dict.set("Rotate", Object::Integer(degrees));
            }
            kids.push(Object::Reference(doc.add_object(page_dict)));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => name("Pages"),
                "Kids" => Object::Array(kids),
                "Count" => Object::Integer(count),
                "MediaBox" => media_box(page_size.0, page_size.1),
                "Resources" => Object::Dictionary(dictionary! {
                    "XObject" => Object::Dictionary(xobjects),
                }),
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => name("Catalog"),
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    /// One full-page image per page.
    fn pdf_with_images(images: Vec<(Dictionary, Vec<u8>)>, page_size: (i64, i64)) -> Vec<u8> {
        let contents = format!("q {} 0 0 {} 0 0 cm /{{}} Do Q", page_size.0, page_size.1);
        let pages = images
            .into_iter()
            .map(|image| TestPage {
                image,
                contents: contents.clone(),
                rotate: None,
            })
            .collect();
        build_pdf(pages, page_size)
    }

    fn raw_dict(width: i64, height: i64, space: &str, bits: i64) -> Dictionary {
        dictionary! {
            "Width" => Object::Integer(width),
            "Height" => Object::Integer(height),
            "ColorSpace" => name(space),
            "BitsPerComponent" => Object::Integer(bits),
        }
    }

    #[test]
    fn gray_page_resampled_to_media_box() {
        let data: Vec<u8> = (0..40 * 20).map(|i| (i % 256) as u8).collect();
        let bytes = pdf_with_images(vec![(raw_dict(40, 20, "DeviceGray", 8), data)], (144, 72));

        let reader = PdfReader::from_bytes(&bytes).unwrap();
        assert_eq!(reader.page_count(), 1);
        let pages = reader.page_images(200).unwrap();
        assert_eq!((pages[0].width(), pages[0].height()), (400, 200));
    }

    #[test]
    fn rgb_page_keeps_colour() {
        let data: Vec<u8> = [200u8, 30, 30].repeat(16 * 16);
        let bytes = pdf_with_images(vec![(raw_dict(16, 16, "DeviceRGB", 8), data)], (16, 16));

        let pages = PdfReader::from_bytes(&bytes).unwrap().page_images(72).unwrap();
        let rgb = pages[0].to_rgb8();
        assert_eq!(rgb.dimensions(), (16, 16));
        assert_eq!(rgb.get_pixel(8, 8), &Rgb([200, 30, 30]));
    }

    #[test]
    fn jpeg_page_decoded() {
        let source = RgbImage::from_pixel(32, 24, Rgb([240, 240, 240]));
        let mut jpeg = Vec::new();
        DynamicImage::ImageRgb8(source)
            .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
            .unwrap();

        let mut dict = raw_dict(32, 24, "DeviceRGB", 8);
        dict.set("Filter", name("DCTDecode"));
        let bytes = pdf_with_images(vec![(dict, jpeg)], (32, 24));

        let pages = PdfReader::from_bytes(&bytes).unwrap().page_images(72).unwrap();
        assert_eq!((pages[0].width(), pages[0].height()), (32, 24));
        let luma = pages[0].to_luma8();
        assert!(luma.get_pixel(16, 12).0[0] > 220);
    }

    #[test]
    fn bilevel_page_unpacked() {
        // 10 px wide: two bytes per row. Left half black, right half white.
        let row = [0b0000_0111u8, 0b1100_0000];
        let data = row.repeat(4);
        let bytes = pdf_with_images(vec![(raw_dict(10, 4, "DeviceGray", 1), data)], (10, 4));

        let pages = PdfReader::from_bytes(&bytes).unwrap().page_images(72).unwrap();
        let gray = pages[0].to_luma8();
        assert_eq!(gray.get_pixel(0, 0), &Luma([0]));
        assert_eq!(gray.get_pixel(9, 3), &Luma([255]));
    }

    #[test]
    fn pages_come_back_in_order() {
        // The second page's image is larger, and both sit in the shared
        // Resources: the first page must still get its own.
        let dark = vec![10u8; 8 * 8];
        let light = vec![250u8; 16 * 16];
        let bytes = pdf_with_images(
            vec![
                (raw_dict(8, 8, "DeviceGray", 8), dark),
                (raw_dict(16, 16, "DeviceGray", 8), light),
            ],
            (8, 8),
        );

        let pages = PdfReader::from_bytes(&bytes).unwrap().page_images(72).unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages[0].to_luma8().get_pixel(4, 4).0[0] < 50);
        assert!(pages[1].to_luma8().get_pixel(4, 4).0[0] > 200);
    }

    #[test]
    fn image_on_part_of_page_keeps_its_place() {
        let page = TestPage {
            image: (raw_dict(50, 50, "DeviceGray", 8), vec![20u8; 50 * 50]),
            contents: "q 50 0 0 50 100 25 cm /{} Do Q".into(),
            rotate: None,
        };
        let bytes = build_pdf(vec![page], (200, 100));

        let pages = PdfReader::from_bytes(&bytes).unwrap().page_images(72).unwrap();
        let gray = pages[0].to_luma8();
        assert_eq!(gray.dimensions(), (200, 100));
        assert_eq!(gray.get_pixel(125, 50), &Luma([20]));
        assert_eq!(gray.get_pixel(10, 10), &Luma([255]));
        assert_eq!(gray.get_pixel(125, 10), &Luma([255]));
        assert_eq!(gray.get_pixel(125, 90), &Luma([255]));
    }

    #[test]
    fn mirrored_placement_flips_rows() {
        // Top row dark; painted with a negative vertical scale it lands at
        // the bottom of the page.
        let mut data = vec![255u8; 8 * 8];
        data[..8].fill(0);
        let page = TestPage {
            image: (raw_dict(8, 8, "DeviceGray", 8), data),
            contents: "q 8 0 0 -8 0 8 cm /{} Do Q".into(),
            rotate: None,
        };
        let bytes = build_pdf(vec![page], (8, 8));

        let pages = PdfReader::from_bytes(&bytes).unwrap().page_images(72).unwrap();
        let gray = pages[0].to_luma8();
        assert_eq!(gray.get_pixel(3, 7), &Luma([0]));
        assert_eq!(gray.get_pixel(3, 0), &Luma([255]));
    }

    #[test]
    fn rotated_page_turned_upright() {
        let mut data = vec![255u8; 40 * 20];
        data[0] = 0;
        let page = TestPage {
            image: (raw_dict(40, 20, "DeviceGray", 8), data),
            contents: "q 40 0 0 20 0 0 cm /{} Do Q".into(),
            rotate: Some(90),
        };
        let bytes = build_pdf(vec![page], (40, 20));

        let pages = PdfReader::from_bytes(&bytes).unwrap().page_images(72).unwrap();
        let gray = pages[0].to_luma8();
        assert_eq!(gray.dimensions(), (20, 40));
        assert_eq!(gray.get_pixel(19, 0), &Luma([0]));
        assert_eq!(gray.get_pixel(0, 0), &Luma([255]));
    }

    #[test]
    fn nested_cm_composes() {
        let inner = Matrix([2.0, 0.0, 0.0, 2.0, 0.0, 0.0]);
        let outer = Matrix([1.0, 0.0, 0.0, 1.0, 10.0, 20.0]);
        assert_eq!(inner.then(outer).apply(1.0, 1.0), (12.0, 22.0));
        assert_eq!(
            inner.then(outer).unit_square_bounds(),
            [10.0, 20.0, 12.0, 22.0]
        );
        assert!(Matrix::IDENTITY.is_axis_aligned());
        assert!(!Matrix([0.0, 1.0, -1.0, 0.0, 0.0, 0.0]).is_axis_aligned());
    }

    #[test]
    fn page_without_image_is_input_error() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => name("Page"),
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => media_box(612, 792),
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => name("Pages"),
                "Kids" => Object::Array(vec![Object::Reference(page_id)]),
                "Count" => Object::Integer(1),
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => name("Catalog"),
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();

        let err = PdfReader::from_bytes(&bytes).unwrap().page_images(200).unwrap_err();
        match err {
            FlatscanError::Input(detail) => assert!(detail.contains("no embedded page image")),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn garbage_bytes_are_pdf_error() {
        assert!(matches!(
            PdfReader::from_bytes(b"definitely not a pdf"),
            Err(FlatscanError::PdfError(_))
        ));
    }

    #[test]
    fn unpack_bilevel_honours_decode_inversion() {
        let gray = unpack_bilevel(8, 1, &[0b1000_0000], true).unwrap();
        assert_eq!(gray.get_pixel(0, 0), &Luma([0]));
        assert_eq!(gray.get_pixel(1, 0), &Luma([255]));
    }

    #[test]
    fn points_convert_at_dpi() {
        assert_eq!(points_to_pixels(612.0, 200), 1700);
        assert_eq!(points_to_pixels(792.0, 200), 2200);
        assert_eq!(points_to_pixels(0.1, 72), 1);
    }
}
