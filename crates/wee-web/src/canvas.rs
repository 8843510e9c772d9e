use std::collections::HashMap;

use wasm_bindgen::{Clamped, JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, ImageData};
use wee_engine::{Bitmap, Color, Rect, Surface, Vec2};

/// [`Surface`] backed by a `<canvas>` 2D context.
///
/// Engine bitmaps are plain RGBA buffers. The first time one is drawn it is
/// uploaded into an offscreen canvas, cached by bitmap ID, so each frame
/// only costs a `drawImage`.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    document: Document,
    uploads: HashMap<u64, HtmlCanvasElement>,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = context_2d(&canvas)?;
        let document = canvas
            .owner_document()
            .ok_or_else(|| JsValue::from_str("canvas is not in a document"))?;
        Ok(Self {
            canvas,
            ctx,
            document,
            uploads: HashMap::new(),
        })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Number of bitmaps uploaded so far.
    pub fn cached_bitmaps(&self) -> usize {
        self.uploads.len()
    }

    /// Drop every uploaded bitmap; they are re-uploaded on next draw.
    pub fn forget_bitmaps(&mut self) {
        self.uploads.clear();
    }

    fn upload(&mut self, bitmap: &Bitmap) -> Option<HtmlCanvasElement> {
        if let Some(canvas) = self.uploads.get(&bitmap.id()) {
            return Some(canvas.clone());
        }
        if bitmap.width() == 0 || bitmap.height() == 0 {
            return None;
        }
        match self.offscreen(bitmap) {
            Ok(canvas) => {
                log::debug!(
                    "uploaded bitmap {} ({}x{})",
                    bitmap.id(),
                    bitmap.width(),
                    bitmap.height()
                );
                self.uploads.insert(bitmap.id(), canvas.clone());
                Some(canvas)
            }
            Err(e) => {
                log::warn!("bitmap {} upload failed: {:?}", bitmap.id(), e);
                None
            }
        }
    }

    fn offscreen(&self, bitmap: &Bitmap) -> Result<HtmlCanvasElement, JsValue> {
        let canvas: HtmlCanvasElement = self.document.create_element("canvas")?.dyn_into()?;
        canvas.set_width(bitmap.width());
        canvas.set_height(bitmap.height());
        let data = ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(bitmap.as_bytes()),
            bitmap.width(),
            bitmap.height(),
        )?;
        context_2d(&canvas)?.put_image_data(&data, 0.0, 0.0)?;
        Ok(canvas)
    }
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    let ctx = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?;
    Ok(ctx.dyn_into()?)
}

fn check(op: &str, result: Result<(), JsValue>) {
    if let Err(e) = result {
        log::warn!("canvas {} failed: {:?}", op, e);
    }
}

impl Surface for CanvasSurface {
    fn size(&self) -> Vec2 {
        Vec2::new(self.canvas.width() as f32, self.canvas.height() as f32)
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.fill_rect(
            rect.min.x as f64,
            rect.min.y as f64,
            rect.size.x as f64,
            rect.size.y as f64,
        );
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color) {
        self.ctx.set_line_width(1.0);
        self.ctx.set_stroke_style_str(&color.to_css());
        self.ctx.stroke_rect(
            rect.min.x as f64,
            rect.min.y as f64,
            rect.size.x as f64,
            rect.size.y as f64,
        );
    }

    fn draw_bitmap(&mut self, bitmap: &Bitmap, at: Vec2) {
        if let Some(image) = self.upload(bitmap) {
            check(
                "drawImage",
                self.ctx
                    .draw_image_with_html_canvas_element(&image, at.x as f64, at.y as f64),
            );
        }
    }

    fn fill_pattern(&mut self, bitmap: &Bitmap, rect: Rect) {
        let Some(image) = self.upload(bitmap) else {
            return;
        };
        let pattern = match self.ctx.create_pattern_with_html_canvas_element(&image, "repeat") {
            Ok(Some(pattern)) => pattern,
            Ok(None) => return,
            Err(e) => {
                log::warn!("canvas createPattern failed: {:?}", e);
                return;
            }
        };
        // patterns anchor at the origin; move it to the rect so tiles start there
        self.ctx.save();
        check(
            "translate",
            self.ctx.translate(rect.min.x as f64, rect.min.y as f64),
        );
        self.ctx.set_fill_style_canvas_pattern(&pattern);
        self.ctx
            .fill_rect(0.0, 0.0, rect.size.x as f64, rect.size.y as f64);
        self.ctx.restore();
    }

    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn translate(&mut self, by: Vec2) {
        check("translate", self.ctx.translate(by.x as f64, by.y as f64));
    }

    fn rotate(&mut self, radians: f32) {
        check("rotate", self.ctx.rotate(radians as f64));
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.ctx.set_global_alpha(alpha as f64);
    }
}
