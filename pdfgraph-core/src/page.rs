use crate::document::Document;
use crate::error::Result;
use crate::objects::Object;

/// Procedure sets advertised in a page's resources.
pub const DEFAULT_PROC_SETS: &[&str] = &["PDF", "Text", "ImageC"];

/// Builder for a single page dictionary.
///
/// Resources are referenced by the names the content stream uses for them
/// (`/F1`, `/Im1`, ...). The content stream itself is an opaque stream
/// created by the caller.
///
/// # Example
///
/// ```rust
/// use pdfgraph::{Document, Font, FontResource, Page};
///
/// # fn main() -> pdfgraph::Result<()> {
/// let mut doc = Document::new();
/// let font = FontResource::new(Font::Helvetica, "F1").build(&mut doc)?;
/// let contents = doc.new_stream(b"BT /F1 24 Tf 72 720 Td (Hi) Tj ET".to_vec())?;
///
/// let page = Page::letter()
///     .with_font("F1", font)
///     .with_contents(contents)
///     .build(&mut doc)?;
/// doc.add_page(&page, true)?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Page {
    media_box: [f64; 4],
    contents: Option<Object>,
    fonts: Vec<(String, Object)>,
    xobjects: Vec<(String, Object)>,
    proc_sets: Vec<String>,
    rotate: Option<i64>,
}

impl Page {
    /// Creates a new page with the specified width and height in points.
    ///
    /// Points are 1/72 of an inch.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            media_box: [0.0, 0.0, width, height],
            contents: None,
            fonts: Vec::new(),
            xobjects: Vec::new(),
            proc_sets: Vec::new(),
            rotate: None,
        }
    }

    /// Creates a new A4 page (595 x 842 points).
    pub fn a4() -> Self {
        Self::new(595.0, 842.0)
    }

    /// Creates a new US Letter page (612 x 792 points).
    pub fn letter() -> Self {
        Self::new(612.0, 792.0)
    }

    /// Replaces the media box with explicit bounds.
    pub fn with_media_box(mut self, llx: f64, lly: f64, urx: f64, ury: f64) -> Self {
        self.media_box = [llx, lly, urx, ury];
        self
    }

    pub fn with_contents(mut self, contents: Object) -> Self {
        self.contents = Some(contents);
        self
    }

    pub fn with_font(mut self, name: impl Into<String>, font: Object) -> Self {
        self.fonts.push((name.into(), font));
        self
    }

    pub fn with_xobject(mut self, name: impl Into<String>, xobject: Object) -> Self {
        self.xobjects.push((name.into(), xobject));
        self
    }

    pub fn with_proc_sets<I, S>(mut self, proc_sets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.proc_sets = proc_sets.into_iter().map(Into::into).collect();
        self
    }

    /// Page rotation in degrees; must be a multiple of 90 to mean anything to
    /// a reader.
    pub fn with_rotation(mut self, degrees: i64) -> Self {
        self.rotate = Some(degrees);
        self
    }

    pub fn width(&self) -> f64 {
        self.media_box[2] - self.media_box[0]
    }

    pub fn height(&self) -> f64 {
        self.media_box[3] - self.media_box[1]
    }

    pub fn media_box(&self) -> [f64; 4] {
        self.media_box
    }

    /// Builds the page dictionary as an indirect object of `doc`.
    ///
    /// The page is not added to the page list; pass it to
    /// [`Document::add_page`].
    pub fn build(&self, doc: &mut Document) -> Result<Object> {
        let resources = self.build_resources(doc)?;

        let media_box = doc.new_array_from(self.media_box.iter().map(|v| number(*v)))?;

        let page = doc.new_dictionary();
        doc.replace_key(&page, "Type", Object::name("Page"))?;
        doc.replace_key(&page, "MediaBox", media_box)?;
        if let Some(contents) = &self.contents {
            doc.replace_key(&page, "Contents", contents)?;
        }
        doc.replace_key(&page, "Resources", resources)?;
        if let Some(rotate) = self.rotate {
            doc.replace_key(&page, "Rotate", rotate)?;
        }
        doc.make_indirect(&page)?;
        Ok(page)
    }

    fn build_resources(&self, doc: &mut Document) -> Result<Object> {
        let resources = doc.new_dictionary();

        if !self.proc_sets.is_empty() {
            let proc_sets = doc.new_array_from(self.proc_sets.iter().map(Object::name))?;
            doc.replace_key(&resources, "ProcSet", proc_sets)?;
        }
        for (key, entries) in [("Font", &self.fonts), ("XObject", &self.xobjects)] {
            if entries.is_empty() {
                continue;
            }
            let dict = doc.new_dictionary();
            for (name, value) in entries {
                doc.replace_key(&dict, name, value)?;
            }
            doc.replace_key(&resources, key, dict)?;
        }
        Ok(resources)
    }
}

/// Whole numbers are written as integers.
fn number(value: f64) -> Object {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Object::Integer(value as i64)
    } else {
        Object::Real(value)
    }
}
