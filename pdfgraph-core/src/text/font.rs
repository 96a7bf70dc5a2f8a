use crate::document::Document;
use crate::error::Result;
use crate::objects::Object;

/// PDF font encoding types
///
/// Specifies how text characters are encoded in the PDF document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontEncoding {
    /// WinAnsiEncoding - Windows ANSI encoding (CP1252)
    WinAnsiEncoding,
    /// MacRomanEncoding - Apple Macintosh Roman encoding
    MacRomanEncoding,
    /// StandardEncoding - Adobe Standard encoding
    StandardEncoding,
    /// MacExpertEncoding - Macintosh Expert encoding
    MacExpertEncoding,
    /// Custom encoding specified by name
    Custom(&'static str),
}

impl FontEncoding {
    /// Get the PDF name for this encoding
    pub fn pdf_name(&self) -> &'static str {
        match self {
            FontEncoding::WinAnsiEncoding => "WinAnsiEncoding",
            FontEncoding::MacRomanEncoding => "MacRomanEncoding",
            FontEncoding::StandardEncoding => "StandardEncoding",
            FontEncoding::MacExpertEncoding => "MacExpertEncoding",
            FontEncoding::Custom(name) => name,
        }
    }

    /// Encodes `text` as single-byte character codes for this encoding.
    ///
    /// Returns `None` if any character has no code. Only WinAnsiEncoding maps
    /// characters beyond ASCII; the other encodings accept printable ASCII.
    pub fn encode(&self, text: &str) -> Option<Vec<u8>> {
        text.chars()
            .map(|ch| match self {
                FontEncoding::WinAnsiEncoding => win_ansi_code(ch),
                _ => (ch.is_ascii() && !ch.is_ascii_control()).then_some(ch as u8),
            })
            .collect()
    }

    /// Get the recommended encoding for a specific font
    /// Returns None if the font doesn't typically need explicit encoding
    pub fn recommended_for_font(font: &Font) -> Option<Self> {
        if font.is_symbolic() {
            None
        } else {
            Some(FontEncoding::WinAnsiEncoding)
        }
    }
}

/// Windows-1252 code for `ch`.
fn win_ansi_code(ch: char) -> Option<u8> {
    let code = match ch as u32 {
        0x09 | 0x0A | 0x0D | 0x20..=0x7E | 0xA0..=0xFF => ch as u32 as u8,
        0x20AC => 0x80, // Euro sign
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85, // Horizontal ellipsis
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91, // Curly quotes
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96, // En dash
        0x2014 => 0x97, // Em dash
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => return None,
    };
    Some(code)
}

/// Base fonts: the standard 14 Type 1 fonts or any other base font name.
///
/// Standard fonts are available in every PDF reader and need no embedding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Font {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
    Symbol,
    ZapfDingbats,
    /// Any other base font name
    Custom(String),
}

impl Font {
    /// Get the PDF name for this font
    pub fn pdf_name(&self) -> &str {
        match self {
            Font::Helvetica => "Helvetica",
            Font::HelveticaBold => "Helvetica-Bold",
            Font::HelveticaOblique => "Helvetica-Oblique",
            Font::HelveticaBoldOblique => "Helvetica-BoldOblique",
            Font::TimesRoman => "Times-Roman",
            Font::TimesBold => "Times-Bold",
            Font::TimesItalic => "Times-Italic",
            Font::TimesBoldItalic => "Times-BoldItalic",
            Font::Courier => "Courier",
            Font::CourierBold => "Courier-Bold",
            Font::CourierOblique => "Courier-Oblique",
            Font::CourierBoldOblique => "Courier-BoldOblique",
            Font::Symbol => "Symbol",
            Font::ZapfDingbats => "ZapfDingbats",
            Font::Custom(name) => name,
        }
    }

    /// Check if this font is symbolic (doesn't use text encodings)
    pub fn is_symbolic(&self) -> bool {
        matches!(self, Font::Symbol | Font::ZapfDingbats)
    }

    pub fn custom(name: impl Into<String>) -> Self {
        Font::Custom(name.into())
    }
}

/// A font resource descriptor: one `/Type /Font` dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct FontResource {
    font: Font,
    resource_name: String,
    subtype: String,
    encoding: Option<FontEncoding>,
}

impl FontResource {
    /// A Type 1 font known to pages as `resource_name` (e.g. `F1`), using
    /// the encoding recommended for it.
    pub fn new(font: Font, resource_name: impl Into<String>) -> Self {
        let encoding = FontEncoding::recommended_for_font(&font);
        Self {
            font,
            resource_name: resource_name.into(),
            subtype: "Type1".to_string(),
            encoding,
        }
    }

    pub fn with_encoding(mut self, encoding: Option<FontEncoding>) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = subtype.into();
        self
    }

    pub fn font(&self) -> &Font {
        &self.font
    }

    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    /// Builds the font dictionary as an indirect object of `doc`.
    pub fn build(&self, doc: &mut Document) -> Result<Object> {
        let font = doc.new_dictionary();
        doc.replace_key(&font, "Type", Object::name("Font"))?;
        doc.replace_key(&font, "Subtype", Object::name(&self.subtype))?;
        doc.replace_key(&font, "Name", Object::name(&self.resource_name))?;
        doc.replace_key(&font, "BaseFont", Object::name(self.font.pdf_name()))?;
        if let Some(encoding) = self.encoding {
            doc.replace_key(&font, "Encoding", Object::name(encoding.pdf_name()))?;
        }
        doc.make_indirect(&font)?;
        Ok(font)
    }
}
