use crate::Error;
use lopdf::ObjectId;
use png::{BitDepth, ColorType};
use std::io::Read;

/// A decoded raster image, ready to become a PDF Image XObject.
#[derive(Debug, Clone)]
pub(crate) struct ImageXObject {
    pub width: u32,
    pub height: u32,
    pub color_space: ColorType,
    pub bit_depth: BitDepth,
    pub image_data: Vec<u8>,
    /// Soft mask (alpha channel) of the image, added as a separate object.
    pub s_mask: Option<ObjectId>,
}

impl ImageXObject {
    /// Decode a PNG into an image XObject and, when the source has an alpha
    /// channel, a second grayscale XObject to use as its `/SMask`.
    pub(crate) fn decode_png<R: Read>(reader: R) -> Result<(Self, Option<Self>), Error> {
        let mut png_reader = png::Decoder::new(reader).read_info()?;
        let mut buf = vec![0; png_reader.output_buffer_size()];
        let info = png_reader.next_frame(&mut buf)?;
        buf.truncate(info.buffer_size());

        let (color_space, color_data, alpha_data) = match info.color_type {
            ColorType::Rgba => {
                require_eight_bit(info.bit_depth)?;
                let (color, alpha) = split_alpha(&buf, 4);
                (ColorType::Rgb, color, Some(alpha))
            }
            ColorType::GrayscaleAlpha => {
                require_eight_bit(info.bit_depth)?;
                let (color, alpha) = split_alpha(&buf, 2);
                (ColorType::Grayscale, color, Some(alpha))
            }
            // A `/ColorSpace /Indexed` entry would need the palette array.
            ColorType::Indexed => {
                return Err(Error::Other(
                    "indexed-color PNG graphics are not supported".to_owned(),
                ))
            }
            other => (other, buf, None),
        };

        let image = ImageXObject {
            width: info.width,
            height: info.height,
            color_space,
            bit_depth: info.bit_depth,
            image_data: color_data,
            s_mask: None,
        };
        let mask = alpha_data.map(|alpha| ImageXObject {
            width: info.width,
            height: info.height,
            color_space: ColorType::Grayscale,
            bit_depth: info.bit_depth,
            image_data: alpha,
            s_mask: None,
        });
        Ok((image, mask))
    }
}

fn require_eight_bit(bit_depth: BitDepth) -> Result<(), Error> {
    if bit_depth != BitDepth::Eight {
        return Err(Error::Other(format!(
            "unsupported bit depth for alpha PNG: {:?}",
            bit_depth
        )));
    }
    Ok(())
}

/// Split interleaved pixels into color components and the trailing alpha
/// component. Assumes 8-bit components.
fn split_alpha(data: &[u8], pixel_width: usize) -> (Vec<u8>, Vec<u8>) {
    let pixels = data.len() / pixel_width;
    let mut color = Vec::with_capacity(pixels * (pixel_width - 1));
    let mut alpha = Vec::with_capacity(pixels);
    for pixel in data.chunks_exact(pixel_width) {
        color.extend_from_slice(&pixel[..pixel_width - 1]);
        alpha.push(pixel[pixel_width - 1]);
    }
    (color, alpha)
}

impl From<ImageXObject> for lopdf::Stream {
    fn from(image: ImageXObject) -> Self {
        use lopdf::Object::*;

        let color_space: &'static str = match image.color_space {
            ColorType::Grayscale => "DeviceGray",
            // Alpha and indexed variants are split or rejected during
            // decoding; only plain color components reach this point.
            _ => "DeviceRGB",
        };

        let mut dict = lopdf::Dictionary::from_iter(vec![
            ("Type", Name("XObject".as_bytes().to_vec())),
            ("Subtype", Name("Image".as_bytes().to_vec())),
            ("Width", Integer(image.width as i64)),
            ("Height", Integer(image.height as i64)),
            ("BitsPerComponent", Integer(image.bit_depth as i64)),
            ("ColorSpace", Name(color_space.as_bytes().to_vec())),
            ("Interpolate", Boolean(false)),
        ]);
        if let Some(s_mask) = image.s_mask {
            dict.set("SMask", Reference(s_mask));
        }

        lopdf::Stream::new(dict, image.image_data)
    }
}

impl From<ImageXObject> for lopdf::Object {
    fn from(image: ImageXObject) -> Self {
        lopdf::Object::Stream(image.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_alpha_separates_rgba_channels() {
        let data = [10, 20, 30, 255, 40, 50, 60, 128];
        let (color, alpha) = split_alpha(&data, 4);
        assert_eq!(color, vec![10, 20, 30, 40, 50, 60]);
        assert_eq!(alpha, vec![255, 128]);
    }

    #[test]
    fn split_alpha_separates_gray_alpha_channels() {
        let data = [7, 200, 9, 100];
        let (color, alpha) = split_alpha(&data, 2);
        assert_eq!(color, vec![7, 9]);
        assert_eq!(alpha, vec![200, 100]);
    }

    #[test]
    fn decode_png_splits_alpha_into_mask() {
        let mut encoded = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut encoded, 2, 2);
            encoder.set_color(ColorType::Rgba);
            encoder.set_depth(BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[0u8; 16]).unwrap();
        }

        let (image, mask) = ImageXObject::decode_png(&encoded[..]).unwrap();
        assert_eq!(image.color_space, ColorType::Rgb);
        assert_eq!(image.image_data.len(), 12);
        let mask = mask.expect("alpha channel should produce a mask");
        assert_eq!(mask.color_space, ColorType::Grayscale);
        assert_eq!(mask.image_data.len(), 4);
    }

    #[test]
    fn decode_png_rejects_indexed_color() {
        let mut encoded = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut encoded, 2, 2);
            encoder.set_color(ColorType::Indexed);
            encoder.set_depth(BitDepth::Eight);
            encoder.set_palette(vec![0, 0, 0, 255, 255, 255]);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[0, 1, 1, 0]).unwrap();
        }

        assert!(ImageXObject::decode_png(&encoded[..]).is_err());
    }
}
