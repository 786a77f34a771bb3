//! PDF backend: writes a finished [`Layout`] with lopdf
//!
//! Text uses the standard Courier Type1 fonts with WinAnsi encoding, so no
//! font files are embedded. Layout coordinates (mm, origin top-left) are
//! converted to PDF points with the origin at the bottom-left.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use thiserror::Error;

use super::layout::{Element, FontStyle, Layout, Rgb, PAGE_HEIGHT, PAGE_WIDTH};

const MM_TO_PT: f64 = 72.0 / 25.4;

#[derive(Debug, Error, miette::Diagnostic)]
pub enum PdfError {
    #[error("failed to build PDF document")]
    #[diagnostic(code(qag::report::pdf))]
    Document(#[from] lopdf::Error),

    #[error("failed to serialize PDF document")]
    #[diagnostic(code(qag::report::pdf_io))]
    Io(#[from] std::io::Error),
}

fn pt(mm: f64) -> f32 {
    (mm * MM_TO_PT) as f32
}

/// Flip a layout y (from the top) to a PDF y (from the bottom)
fn pt_y(mm: f64) -> f32 {
    pt(PAGE_HEIGHT - mm)
}

fn font_resource(style: FontStyle) -> &'static str {
    match style {
        FontStyle::Regular => "F1",
        FontStyle::Bold => "F2",
        FontStyle::Italic => "F3",
    }
}

fn color_operands(c: Rgb) -> Vec<Object> {
    [c.0, c.1, c.2]
        .iter()
        .map(|&v| (v as f32 / 255.0).into())
        .collect()
}

/// Encode text for a WinAnsi font; characters outside Latin-1 become `?`
pub fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7e | 0xa0..=0xff => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

fn page_operations(elements: &[Element]) -> Vec<Operation> {
    let mut ops = Vec::new();

    for element in elements {
        match element {
            Element::Rect { x, y, w, h, fill } => {
                ops.push(Operation::new("rg", color_operands(*fill)));
                ops.push(Operation::new(
                    "re",
                    vec![
                        pt(*x).into(),
                        pt_y(y + h).into(),
                        pt(*w).into(),
                        pt(*h).into(),
                    ],
                ));
                ops.push(Operation::new("f", vec![]));
            }
            Element::Line {
                from,
                to,
                color,
                width,
            } => {
                ops.push(Operation::new("RG", color_operands(*color)));
                ops.push(Operation::new("w", vec![pt(*width).into()]));
                ops.push(Operation::new("m", vec![pt(from.0).into(), pt_y(from.1).into()]));
                ops.push(Operation::new("l", vec![pt(to.0).into(), pt_y(to.1).into()]));
                ops.push(Operation::new("S", vec![]));
            }
            Element::Text {
                x,
                y,
                size,
                style,
                color,
                text,
            } => {
                ops.push(Operation::new("rg", color_operands(*color)));
                ops.push(Operation::new("BT", vec![]));
                ops.push(Operation::new(
                    "Tf",
                    vec![font_resource(*style).into(), (*size as f32).into()],
                ));
                ops.push(Operation::new("Td", vec![pt(*x).into(), pt_y(*y).into()]));
                ops.push(Operation::new(
                    "Tj",
                    vec![Object::String(win_ansi(text), StringFormat::Literal)],
                ));
                ops.push(Operation::new("ET", vec![]));
            }
            Element::Image { x, y, w, h, image } => {
                ops.push(Operation::new("q", vec![]));
                ops.push(Operation::new(
                    "cm",
                    vec![
                        pt(*w).into(),
                        0.into(),
                        0.into(),
                        pt(*h).into(),
                        pt(*x).into(),
                        pt_y(y + h).into(),
                    ],
                ));
                ops.push(Operation::new(
                    "Do",
                    vec![Object::Name(image_name(*image).into_bytes())],
                ));
                ops.push(Operation::new("Q", vec![]));
            }
        }
    }
    ops
}

fn image_name(index: usize) -> String {
    format!("Im{index}")
}

fn courier(doc: &mut Document, base_font: &str) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    })
}

/// Render a layout to PDF bytes
pub fn render_pdf(layout: &Layout) -> Result<Vec<u8>, PdfError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let fonts = dictionary! {
        "F1" => courier(&mut doc, "Courier"),
        "F2" => courier(&mut doc, "Courier-Bold"),
        "F3" => courier(&mut doc, "Courier-Oblique"),
    };

    let mut xobjects = Dictionary::new();
    for (index, raster) in layout.images.iter().enumerate() {
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => raster.width as i64,
                "Height" => raster.height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            raster.rgb.clone(),
        );
        let id = doc.add_object(stream);
        xobjects.set(image_name(index), id);
    }

    let resources_id = doc.add_object(dictionary! {
        "Font" => fonts,
        "XObject" => xobjects,
    });

    let mut kids: Vec<Object> = Vec::with_capacity(layout.pages.len());
    for page in &layout.pages {
        let content = Content {
            operations: page_operations(&page.elements),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                pt(PAGE_WIDTH).into(),
                pt(PAGE_HEIGHT).into(),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}
