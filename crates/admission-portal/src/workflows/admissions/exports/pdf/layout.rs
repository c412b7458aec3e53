use super::fonts::{text_width, Font};

pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;
pub const MARGIN: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::grey(0.0);
    pub const DARK_GREY: Color = Color::grey(0.5);
    pub const LIGHT_GREY: Color = Color::grey(0.95);
    pub const GREEN: Color = Color {
        r: 0.15,
        g: 0.5,
        b: 0.15,
    };

    pub const fn grey(level: f32) -> Self {
        Self {
            r: level,
            g: level,
            b: level,
        }
    }
}

/// One drawing instruction in PDF user space (origin bottom-left, points).
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        size: f32,
        font: Font,
        color: Color,
        text: String,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Option<Color>,
        stroke: Option<(Color, f32)>,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        color: Color,
        thickness: f32,
    },
    Circle {
        x: f32,
        y: f32,
        radius: f32,
        fill: Color,
        stroke: Option<(Color, f32)>,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// A4 pages of draw operations, with the last page as the drawing target.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLayout {
    pages: Vec<Page>,
}

impl Default for DocumentLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLayout {
    pub fn new() -> Self {
        Self {
            pages: vec![Page::default()],
        }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn add_page(&mut self) {
        self.pages.push(Page::default());
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flat_map(Page::texts)
    }

    fn push(&mut self, op: DrawOp) {
        if self.pages.is_empty() {
            self.pages.push(Page::default());
        }
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    pub fn text(&mut self, text: impl Into<String>, x: f32, y: f32, size: f32, font: Font) {
        self.colored_text(text, x, y, size, font, Color::BLACK);
    }

    pub fn colored_text(
        &mut self,
        text: impl Into<String>,
        x: f32,
        y: f32,
        size: f32,
        font: Font,
        color: Color,
    ) {
        self.push(DrawOp::Text {
            x,
            y,
            size,
            font,
            color,
            text: text.into(),
        });
    }

    /// Horizontally centred on the page.
    pub fn centered_text(&mut self, text: &str, y: f32, size: f32, font: Font) {
        let x = (PAGE_WIDTH - text_width(font, text, size)) / 2.0;
        self.text(text, x, y, size, font);
    }

    pub fn rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Option<Color>,
        stroke: Option<(Color, f32)>,
    ) {
        self.push(DrawOp::Rect {
            x,
            y,
            width,
            height,
            fill,
            stroke,
        });
    }

    pub fn line(&mut self, from: (f32, f32), to: (f32, f32), thickness: f32, color: Color) {
        self.push(DrawOp::Line {
            from,
            to,
            color,
            thickness,
        });
    }

    pub fn circle(
        &mut self,
        x: f32,
        y: f32,
        radius: f32,
        fill: Color,
        stroke: Option<(Color, f32)>,
    ) {
        self.push(DrawOp::Circle {
            x,
            y,
            radius,
            fill,
            stroke,
        });
    }
}
