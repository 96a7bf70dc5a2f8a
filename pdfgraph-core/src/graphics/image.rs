//! Image XObjects
//!
//! Pixel data is opaque here: it comes either as prepared bytes or from a
//! [`StreamDataProvider`] that generates it while the document is written.

use crate::document::Document;
use crate::error::{PdfError, Result};
use crate::objects::{Object, ObjectId, StreamContent};
use crate::provider::{StreamDataProvider, StreamSink};

/// Color spaces for images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// Grayscale
    DeviceGray,
    /// RGB color
    DeviceRGB,
    /// CMYK color
    DeviceCMYK,
}

impl ColorSpace {
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ColorSpace::DeviceGray => "DeviceGray",
            ColorSpace::DeviceRGB => "DeviceRGB",
            ColorSpace::DeviceCMYK => "DeviceCMYK",
        }
    }

    pub fn components(&self) -> usize {
        match self {
            ColorSpace::DeviceGray => 1,
            ColorSpace::DeviceRGB => 3,
            ColorSpace::DeviceCMYK => 4,
        }
    }
}

/// Dimensions and sample layout of an image XObject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSpec {
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
    pub bits_per_component: u8,
}

impl ImageSpec {
    /// 8-bit RGB image.
    pub fn rgb(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            color_space: ColorSpace::DeviceRGB,
            bits_per_component: 8,
        }
    }

    /// Size in bytes of the unfiltered samples.
    pub fn raw_len(&self) -> u64 {
        let bits_per_row =
            self.width as u64 * self.color_space.components() as u64 * self.bits_per_component as u64;
        bits_per_row.div_ceil(8) * self.height as u64
    }

    /// Builds an `/XObject /Image` stream holding `content`.
    pub fn build(&self, doc: &mut Document, content: StreamContent) -> Result<Object> {
        if !matches!(self.bits_per_component, 1 | 2 | 4 | 8 | 16) {
            return Err(PdfError::InvalidStructure(format!(
                "unsupported bits per component: {}",
                self.bits_per_component
            )));
        }

        let image = match content {
            StreamContent::Data(data) => doc.new_stream(data)?,
            StreamContent::Provider(provider) => doc.new_stream_with_shared_provider(provider)?,
        };
        let dict = doc.stream_dict(&image)?;
        doc.replace_key(&dict, "Type", Object::name("XObject"))?;
        doc.replace_key(&dict, "Subtype", Object::name("Image"))?;
        doc.replace_key(&dict, "ColorSpace", Object::name(self.color_space.pdf_name()))?;
        doc.replace_key(&dict, "BitsPerComponent", self.bits_per_component as i64)?;
        doc.replace_key(&dict, "Width", self.width as i64)?;
        doc.replace_key(&dict, "Height", self.height as i64)?;
        Ok(image)
    }
}

/// Provider generating an image filled with a single color, one sample
/// tuple per pixel, 8 bits per component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolidColorImage {
    width: u32,
    height: u32,
    color: Vec<u8>,
}

impl SolidColorImage {
    pub fn new(width: u32, height: u32, color: impl Into<Vec<u8>>) -> Self {
        Self {
            width,
            height,
            color: color.into(),
        }
    }

    pub fn rgb(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        Self::new(width, height, rgb)
    }

    pub fn spec(&self) -> ImageSpec {
        let color_space = match self.color.len() {
            1 => ColorSpace::DeviceGray,
            4 => ColorSpace::DeviceCMYK,
            _ => ColorSpace::DeviceRGB,
        };
        ImageSpec {
            width: self.width,
            height: self.height,
            color_space,
            bits_per_component: 8,
        }
    }
}

impl StreamDataProvider for SolidColorImage {
    fn provide_stream_data(&self, _id: ObjectId, sink: &mut StreamSink) -> Result<()> {
        for _ in 0..(self.width as u64 * self.height as u64) {
            sink.write(&self.color)?;
        }
        sink.finish()
    }

    fn declared_length(&self) -> Option<u64> {
        Some(self.color.len() as u64 * self.width as u64 * self.height as u64)
    }
}
