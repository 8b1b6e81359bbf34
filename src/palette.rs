use {
    crate::basis::Color,
    anyhow::{ensure, Context as _, Result},
    bytes::Bytes,
    image::RgbImage,
    png::{BitDepth, ColorType, Compression, Encoder},
    std::collections::HashMap,
};

/// `Indexed` はパレットと, 各画素のパレット上の番号で表した画像を表す.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indexed {
    pub width: u32,
    pub height: u32,
    pub palette: Vec<Color>,
    pub indices: Vec<u8>,
}

impl Indexed {
    pub fn color_at(&self, x: u32, y: u32) -> Color {
        self.palette[self.indices[(y * self.width + x) as usize] as usize]
    }
}

/// `image` を高々 `cap` 色のパレット画像にする. ディザリングはしない.
///
/// 色数が `cap` 以下ならそのまま使う. 超える場合は出現数の多い順に `cap` 色を残し,
/// 残りの画素は二乗距離が最も近い色に置き換える.
pub fn quantize(image: &RgbImage, cap: usize) -> Indexed {
    let cap = cap.clamp(1, 256);

    let mut counts = HashMap::<Color, usize>::new();
    for &pixel in image.pixels() {
        *counts.entry(pixel.into()).or_insert(0) += 1;
    }

    let mut by_frequency = counts.into_iter().collect::<Vec<_>>();
    by_frequency.sort_unstable_by(|(a, na), (b, nb)| nb.cmp(na).then(a.cmp(b)));

    let palette = by_frequency
        .iter()
        .take(cap)
        .map(|&(color, _)| color)
        .collect::<Vec<_>>();

    let mut lookup = palette
        .iter()
        .enumerate()
        .map(|(i, &color)| (color, i as u8))
        .collect::<HashMap<_, _>>();

    let indices = image
        .pixels()
        .map(|&pixel| {
            let color = Color::from(pixel);
            *lookup
                .entry(color)
                .or_insert_with(|| nearest(&palette, color))
        })
        .collect();

    Indexed {
        width: image.width(),
        height: image.height(),
        palette,
        indices,
    }
}

fn nearest(palette: &[Color], color: Color) -> u8 {
    palette
        .iter()
        .enumerate()
        .min_by_key(|&(i, &c)| (c.distance_sq(color), i))
        .map(|(i, _)| i as u8)
        .unwrap_or(0)
}

/// 8 ビットのパレット PNG にする.
pub fn encode_png(indexed: &Indexed) -> Result<Bytes> {
    ensure!(
        !indexed.palette.is_empty() && indexed.palette.len() <= 256,
        "palette must have 1..=256 entries, but has {}",
        indexed.palette.len()
    );

    let mut buf = vec![];
    {
        let mut encoder = Encoder::new(&mut buf, indexed.width, indexed.height);
        encoder.set_color(ColorType::Indexed);
        encoder.set_depth(BitDepth::Eight);
        encoder.set_compression(Compression::Best);
        encoder.set_palette(
            indexed
                .palette
                .iter()
                .flat_map(|c| [c.r, c.g, c.b])
                .collect::<Vec<_>>(),
        );

        let mut writer = encoder
            .write_header()
            .context("failed to write png header")?;
        writer
            .write_image_data(&indexed.indices)
            .context("failed to write png image data")?;
    }
    Ok(Bytes::from(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn decode(bytes: &[u8]) -> (Vec<u8>, Vec<u8>, png::OutputInfo) {
        let mut decoder = png::Decoder::new(bytes);
        decoder.set_transformations(png::Transformations::EXPAND);
        let mut reader = decoder.read_info().unwrap();
        let palette = reader.info().palette.as_ref().unwrap().to_vec();
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).unwrap();
        buf.truncate(info.buffer_size());
        (palette, buf, info)
    }

    #[test]
    fn few_colors_are_kept_exactly() {
        let mut image = RgbImage::from_pixel(4, 4, Rgb([255, 255, 255]));
        image.put_pixel(0, 0, Rgb([1, 2, 3]));
        image.put_pixel(1, 0, Rgb([1, 2, 3]));
        image.put_pixel(3, 3, Rgb([9, 9, 9]));

        let indexed = quantize(&image, 255);
        assert_eq!(
            indexed.palette,
            [Color::WHITE, Color::new(1, 2, 3), Color::gray(9)]
        );
        for (x, y, &pixel) in image.enumerate_pixels() {
            assert_eq!(indexed.color_at(x, y), pixel.into());
        }
    }

    #[test]
    fn many_colors_are_capped() {
        // 上半分の 64 色は 8 回ずつ, 下半分の 512 色は 1 回ずつ現れる.
        // 上半分の色のうち値の小さい 16 色 (r <= 48) が残る
        let mut image = RgbImage::new(32, 32);
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            *pixel = if y < 16 {
                Rgb([(x / 2 * 16) as u8, (y / 4 * 64) as u8, 0])
            } else {
                Rgb([x as u8, y as u8, 200])
            };
        }

        let indexed = quantize(&image, 16);
        assert_eq!(indexed.palette.len(), 16);
        assert_eq!(indexed.color_at(0, 0), Color::new(0, 0, 0));
        assert_eq!(indexed.color_at(6, 15), Color::new(48, 192, 0));
        assert_eq!(indexed.color_at(31, 15), Color::new(48, 192, 0));
        assert!(indexed.indices.iter().all(|&i| (i as usize) < 16));
    }

    #[test]
    fn quantize_is_deterministic() {
        let mut image = RgbImage::new(20, 20);
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            *pixel = Rgb([(x * 13) as u8, (y * 7) as u8, (x * y) as u8]);
        }
        assert_eq!(quantize(&image, 255), quantize(&image, 255));
        assert_eq!(quantize(&image, 255).palette.len(), 255);
    }

    #[test]
    fn encoded_png_is_indexed() {
        let mut image = RgbImage::from_pixel(5, 3, Rgb([255, 255, 255]));
        image.put_pixel(4, 2, Rgb([10, 20, 30]));
        let bytes = encode_png(&quantize(&image, 255)).unwrap();

        let (palette, rgb, info) = decode(&bytes);
        assert_eq!((info.width, info.height), (5, 3));
        assert_eq!(palette, [255, 255, 255, 10, 20, 30]);
        assert_eq!(&rgb[rgb.len() - 3..], &[10, 20, 30]);
    }
}
