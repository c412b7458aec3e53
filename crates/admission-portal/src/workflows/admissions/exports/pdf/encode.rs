use super::fonts::{encode_win_ansi, Font};
use super::layout::{Color, DocumentLayout, DrawOp, PAGE_HEIGHT, PAGE_WIDTH};
use super::RenderError;

const FIRST_PAGE_OBJECT: usize = 5;
const BEZIER_CIRCLE: f32 = 0.552_284_8;

/// Serializes a [`DocumentLayout`] as an uncompressed PDF 1.4 file using the
/// built-in Helvetica faces, so no font program is embedded.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfEncoder;

impl PdfEncoder {
    pub fn encode(&self, layout: &DocumentLayout) -> Result<Vec<u8>, RenderError> {
        let streams = layout
            .pages()
            .iter()
            .map(|page| content_stream(&page.ops))
            .collect::<Result<Vec<_>, _>>()?;

        let mut writer = ObjectWriter::default();
        writer.raw(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

        let kids = (0..streams.len())
            .map(|index| format!("{} 0 R", FIRST_PAGE_OBJECT + index * 2))
            .collect::<Vec<_>>()
            .join(" ");

        writer.object(1, b"<< /Type /Catalog /Pages 2 0 R >>");
        writer.object(
            2,
            format!(
                "<< /Type /Pages /Kids [{kids}] /Count {} >>",
                streams.len()
            )
            .as_bytes(),
        );
        for (number, font) in [(3, Font::Regular), (4, Font::Bold)] {
            writer.object(
                number,
                format!(
                    "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                    font.base_font()
                )
                .as_bytes(),
            );
        }

        for (index, stream) in streams.iter().enumerate() {
            let page_object = FIRST_PAGE_OBJECT + index * 2;
            let content_object = page_object + 1;
            writer.object(
                page_object,
                format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                     /Resources << /Font << /{} 3 0 R /{} 4 0 R >> >> /Contents {content_object} 0 R >>",
                    number(PAGE_WIDTH),
                    number(PAGE_HEIGHT),
                    Font::Regular.resource_name(),
                    Font::Bold.resource_name(),
                )
                .as_bytes(),
            );

            let mut body = format!("<< /Length {} >>\nstream\n", stream.len()).into_bytes();
            body.extend_from_slice(stream);
            body.extend_from_slice(b"\nendstream");
            writer.object(content_object, &body);
        }

        Ok(writer.finish())
    }
}

#[derive(Default)]
struct ObjectWriter {
    buffer: Vec<u8>,
    offsets: Vec<(usize, usize)>,
}

impl ObjectWriter {
    fn raw(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    fn object(&mut self, number: usize, body: &[u8]) {
        self.offsets.push((number, self.buffer.len()));
        self.raw(format!("{number} 0 obj\n").as_bytes());
        self.raw(body);
        self.raw(b"\nendobj\n");
    }

    fn finish(mut self) -> Vec<u8> {
        self.offsets.sort_by_key(|(number, _)| *number);
        let xref_offset = self.buffer.len();
        let size = self.offsets.len() + 1;

        let mut table = format!("xref\n0 {size}\n0000000000 65535 f \n");
        for (_, offset) in &self.offsets {
            table.push_str(&format!("{offset:010} 00000 n \n"));
        }
        table.push_str(&format!(
            "trailer\n<< /Size {size} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n"
        ));
        self.raw(table.as_bytes());
        self.buffer
    }
}

fn number(value: f32) -> String {
    let formatted = format!("{value:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "" | "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

fn fill_color(color: Color) -> String {
    format!(
        "{} {} {} rg",
        number(color.r),
        number(color.g),
        number(color.b)
    )
}

fn stroke_style(color: Color, width: f32) -> String {
    format!(
        "{} {} {} RG {} w",
        number(color.r),
        number(color.g),
        number(color.b),
        number(width)
    )
}

fn paint_operator(has_fill: bool, has_stroke: bool) -> &'static str {
    match (has_fill, has_stroke) {
        (true, true) => "B",
        (true, false) => "f",
        (false, true) => "S",
        (false, false) => "n",
    }
}

fn escape_text(text: &str) -> Result<Vec<u8>, RenderError> {
    let encoded = encode_win_ansi(text).map_err(|character| RenderError::UnsupportedText {
        character,
        text: text.to_string(),
    })?;
    let mut escaped = Vec::with_capacity(encoded.len() + 2);
    for byte in encoded {
        match byte {
            b'(' | b')' | b'\\' => {
                escaped.push(b'\\');
                escaped.push(byte);
            }
            0x20..=0x7E => escaped.push(byte),
            other => escaped.extend_from_slice(format!("\\{other:03o}").as_bytes()),
        }
    }
    Ok(escaped)
}

fn content_stream(ops: &[DrawOp]) -> Result<Vec<u8>, RenderError> {
    let mut out: Vec<u8> = Vec::new();
    for op in ops {
        match op {
            DrawOp::Text {
                x,
                y,
                size,
                font,
                color,
                text,
            } => {
                let escaped = escape_text(text)?;
                out.extend_from_slice(
                    format!(
                        "BT {} /{} {} Tf {} {} Td (",
                        fill_color(*color),
                        font.resource_name(),
                        number(*size),
                        number(*x),
                        number(*y)
                    )
                    .as_bytes(),
                );
                out.extend_from_slice(&escaped);
                out.extend_from_slice(b") Tj ET\n");
            }
            DrawOp::Rect {
                x,
                y,
                width,
                height,
                fill,
                stroke,
            } => {
                let mut parts = vec!["q".to_string()];
                if let Some(color) = fill {
                    parts.push(fill_color(*color));
                }
                if let Some((color, line_width)) = stroke {
                    parts.push(stroke_style(*color, *line_width));
                }
                parts.push(format!(
                    "{} {} {} {} re {}",
                    number(*x),
                    number(*y),
                    number(*width),
                    number(*height),
                    paint_operator(fill.is_some(), stroke.is_some())
                ));
                parts.push("Q".to_string());
                out.extend_from_slice(parts.join(" ").as_bytes());
                out.push(b'\n');
            }
            DrawOp::Line {
                from,
                to,
                color,
                thickness,
            } => {
                out.extend_from_slice(
                    format!(
                        "q {} {} {} m {} {} l S Q\n",
                        stroke_style(*color, *thickness),
                        number(from.0),
                        number(from.1),
                        number(to.0),
                        number(to.1)
                    )
                    .as_bytes(),
                );
            }
            DrawOp::Circle {
                x,
                y,
                radius,
                fill,
                stroke,
            } => {
                let (x, y, r) = (*x, *y, *radius);
                let k = r * BEZIER_CIRCLE;
                let mut parts = vec!["q".to_string(), fill_color(*fill)];
                if let Some((color, line_width)) = stroke {
                    parts.push(stroke_style(*color, *line_width));
                }
                parts.push(format!("{} {} m", number(x + r), number(y)));
                for [c1x, c1y, c2x, c2y, ex, ey] in [
                    [x + r, y + k, x + k, y + r, x, y + r],
                    [x - k, y + r, x - r, y + k, x - r, y],
                    [x - r, y - k, x - k, y - r, x, y - r],
                    [x + k, y - r, x + r, y - k, x + r, y],
                ] {
                    parts.push(format!(
                        "{} {} {} {} {} {} c",
                        number(c1x),
                        number(c1y),
                        number(c2x),
                        number(c2y),
                        number(ex),
                        number(ey)
                    ));
                }
                parts.push(paint_operator(true, stroke.is_some()).to_string());
                parts.push("Q".to_string());
                out.extend_from_slice(parts.join(" ").as_bytes());
                out.push(b'\n');
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::admissions::exports::pdf::layout::MARGIN;

    #[test]
    fn numbers_are_trimmed() {
        assert_eq!(number(595.28), "595.28");
        assert_eq!(number(50.0), "50");
        assert_eq!(number(0.5), "0.5");
        assert_eq!(number(-0.0), "0");
    }

    #[test]
    fn escapes_delimiters_and_high_bytes() {
        let escaped = escape_text("a(b)\\ é").expect("encodable");
        assert_eq!(escaped, b"a\\(b\\)\\\\ \\351".to_vec());
    }

    #[test]
    fn produces_a_well_formed_two_page_file() {
        let mut layout = DocumentLayout::new();
        layout.text("Page one", MARGIN, 700.0, 12.0, Font::Bold);
        layout.add_page();
        layout.circle(100.0, 100.0, 3.0, Color::GREEN, Some((Color::BLACK, 0.5)));

        let bytes = PdfEncoder.encode(&layout).expect("encodes");
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.starts_with("%PDF-1.4"));
        assert!(text.contains("/Count 2"));
        assert!(text.contains("/BaseFont /Helvetica-Bold"));
        assert!(text.contains("(Page one) Tj"));
        assert!(text.trim_end().ends_with("%%EOF"));

        let startxref = text
            .rsplit("startxref\n")
            .next()
            .and_then(|tail| tail.lines().next())
            .and_then(|value| value.parse::<usize>().ok())
            .expect("startxref offset");
        assert!(bytes[startxref..].starts_with(b"xref"));
    }

    #[test]
    fn unsupported_characters_fail_the_encode() {
        let mut layout = DocumentLayout::new();
        layout.text("ഫാത്തിമ", MARGIN, 700.0, 12.0, Font::Regular);
        assert!(matches!(
            PdfEncoder.encode(&layout),
            Err(RenderError::UnsupportedText { .. })
        ));
    }
}
