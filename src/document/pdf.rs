//! PDF output via [`pdf-writer`](https://crates.io/crates/pdf-writer).
//!
//! Millimetre coordinates with a top-left origin are converted to PDF
//! points with the y axis flipped. Frame JPEGs are embedded unchanged with
//! the `DCTDecode` filter; page content streams are deflated with
//! `miniz_oxide`.

use std::fs;
use std::path::Path;

use miniz_oxide::deflate::compress_to_vec_zlib;
use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str, TextStr};

use super::{DocumentMetadata, DocumentWriter};
use crate::error::FlipbookError;
use crate::geometry::Size;
use crate::layout::MM_PER_INCH;
use crate::paper::PaperSize;

const POINTS_PER_MM: f64 = 72.0 / MM_PER_INCH;

const FONT_NAME: &[u8] = b"F1";
const LABEL_FONT_SIZE: f32 = 12.0;
const RULING_WIDTH_MM: f64 = 0.1;
const RULING_GREY: f32 = 128.0 / 255.0;
const COMPRESSION_LEVEL: u8 = 6;

fn to_points(mm: f64) -> f32 {
    (mm * POINTS_PER_MM) as f32
}

struct PageContent {
    content: Content,
    images: Vec<(String, Ref)>,
}

/// A PDF [`DocumentWriter`].
///
/// Frames are embedded as JPEG image objects as soon as they are placed;
/// page content streams, the page tree and the document info are written on
/// [`finalize`](DocumentWriter::finalize). Every page has the landscape
/// dimensions of the paper the document was created for.
pub struct PdfDocument {
    pdf: Pdf,
    next_ref: i32,
    page_size: Size,
    metadata: DocumentMetadata,
    pages: Vec<PageContent>,
    image_count: usize,
}

impl PdfDocument {
    pub fn new(paper: PaperSize, metadata: DocumentMetadata) -> Self {
        Self {
            pdf: Pdf::new(),
            next_ref: 1,
            page_size: paper.dimensions(),
            metadata,
            pages: Vec::new(),
            image_count: 0,
        }
    }

    /// Number of pages started so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn alloc(&mut self) -> Ref {
        let id = Ref::new(self.next_ref);
        self.next_ref += 1;
        id
    }

    fn current_page(&mut self) -> Result<&mut PageContent, FlipbookError> {
        self.pages.last_mut().ok_or_else(|| {
            FlipbookError::DocumentWriteError("drawing command issued before the first page".into())
        })
    }

    /// Flip a top-left millimetre y coordinate into PDF user space.
    fn flip_y(&self, y: f64) -> f32 {
        to_points(self.page_size.height - y)
    }
}

impl DocumentWriter for PdfDocument {
    fn new_page(&mut self) -> Result<(), FlipbookError> {
        let mut content = Content::new();
        content.set_line_width(to_points(RULING_WIDTH_MM));
        content.set_stroke_rgb(RULING_GREY, RULING_GREY, RULING_GREY);
        self.pages.push(PageContent {
            content,
            images: Vec::new(),
        });
        log::trace!("Started page {}", self.pages.len());
        Ok(())
    }

    fn place_image(
        &mut self,
        path: &Path,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<(), FlipbookError> {
        self.current_page()?;

        let data = fs::read(path).map_err(|error| {
            FlipbookError::DocumentWriteError(format!(
                "cannot read frame image {}: {error}",
                path.display()
            ))
        })?;
        let (pixel_width, pixel_height) = image::image_dimensions(path).map_err(|error| {
            FlipbookError::DocumentWriteError(format!(
                "cannot read dimensions of {}: {error}",
                path.display()
            ))
        })?;

        let image_ref = self.alloc();
        {
            let mut xobject = self.pdf.image_xobject(image_ref, &data);
            xobject.filter(Filter::DctDecode);
            xobject.width(pixel_width as i32);
            xobject.height(pixel_height as i32);
            xobject.color_space().device_rgb();
            xobject.bits_per_component(8);
        }

        self.image_count += 1;
        let name = format!("Im{}", self.image_count);
        let bottom = self.flip_y(y + height);
        let page = self.current_page()?;
        page.content.save_state();
        page.content.transform([
            to_points(width),
            0.0,
            0.0,
            to_points(height),
            to_points(x),
            bottom,
        ]);
        page.content.x_object(Name(name.as_bytes()));
        page.content.restore_state();
        page.images.push((name, image_ref));
        Ok(())
    }

    fn draw_line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) -> Result<(), FlipbookError> {
        let (start_y, end_y) = (self.flip_y(y0), self.flip_y(y1));
        let page = self.current_page()?;
        page.content.move_to(to_points(x0), start_y);
        page.content.line_to(to_points(x1), end_y);
        page.content.stroke();
        Ok(())
    }

    fn draw_rotated_text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        angle: f64,
    ) -> Result<(), FlipbookError> {
        let baseline = self.flip_y(y);
        let (sin, cos) = angle.to_radians().sin_cos();
        let page = self.current_page()?;
        page.content.save_state();
        page.content.transform([
            cos as f32,
            sin as f32,
            -sin as f32,
            cos as f32,
            to_points(x),
            baseline,
        ]);
        page.content
            .begin_text()
            .set_font(Name(FONT_NAME), LABEL_FONT_SIZE)
            .next_line(0.0, 0.0)
            .show(Str(text.as_bytes()))
            .end_text();
        page.content.restore_state();
        Ok(())
    }

    fn finalize(&mut self, path: &Path) -> Result<(), FlipbookError> {
        if self.pages.is_empty() {
            return Err(FlipbookError::DocumentWriteError(
                "document has no pages".to_string(),
            ));
        }

        let catalog_id = self.alloc();
        let page_tree_id = self.alloc();
        let font_id = self.alloc();
        let info_id = self.alloc();

        let pages = std::mem::take(&mut self.pages);
        let mut page_ids = Vec::with_capacity(pages.len());
        let media_box = Rect::new(
            0.0,
            0.0,
            to_points(self.page_size.width),
            to_points(self.page_size.height),
        );

        for page in pages {
            let page_id = self.alloc();
            let content_id = self.alloc();
            page_ids.push(page_id);

            let raw = page.content.finish();
            let compressed = compress_to_vec_zlib(&raw, COMPRESSION_LEVEL);
            self.pdf
                .stream(content_id, &compressed)
                .filter(Filter::FlateDecode);

            let mut writer = self.pdf.page(page_id);
            writer
                .media_box(media_box)
                .parent(page_tree_id)
                .contents(content_id);
            let mut resources = writer.resources();
            resources.fonts().pair(Name(FONT_NAME), font_id);
            if !page.images.is_empty() {
                let mut xobjects = resources.x_objects();
                for (name, image_ref) in &page.images {
                    xobjects.pair(Name(name.as_bytes()), *image_ref);
                }
            }
        }

        self.pdf.catalog(catalog_id).pages(page_tree_id);
        self.pdf
            .pages(page_tree_id)
            .kids(page_ids.iter().copied())
            .count(page_ids.len() as i32);
        self.pdf.type1_font(font_id).base_font(Name(b"Helvetica"));

        {
            let mut info = self.pdf.document_info(info_id);
            info.title(TextStr(&self.metadata.title));
            if let Some(author) = &self.metadata.author {
                info.author(TextStr(author));
            }
            info.creator(TextStr(&self.metadata.creator));
            info.keywords(TextStr(&self.metadata.keywords));
        }

        let bytes = std::mem::replace(&mut self.pdf, Pdf::new()).finish();
        log::info!(
            "Writing {} page(s), {} image(s), {} bytes to {}",
            page_ids.len(),
            self.image_count,
            bytes.len(),
            path.display()
        );
        fs::write(path, bytes).map_err(|error| {
            FlipbookError::DocumentWriteError(format!("cannot write {}: {error}", path.display()))
        })
    }
}
