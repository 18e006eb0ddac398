//! 帧预处理: JPEG → RGB (摄像头倒装时旋转180°)

use crate::error::DetectorError;
use image::RgbImage;

pub fn decode_frame(bytes: &[u8], rotate_180: bool) -> Result<RgbImage, DetectorError> {
    let image = image::load_from_memory(bytes)?;
    let image = if rotate_180 { image.rotate180() } else { image };
    Ok(image.to_rgb8())
}

#[cfg(test)]
pub(crate) fn encode_test_frame(width: u32, height: u32) -> Vec<u8> {
    use image::{DynamicImage, ImageFormat, Rgb};
    use std::io::Cursor;

    // 左上角标记一个红点
    let mut img = RgbImage::from_pixel(width, height, Rgb([0, 0, 0]));
    img.put_pixel(0, 0, Rgb([255, 0, 0]));

    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}
