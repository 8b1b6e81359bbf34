use {
    crate::{
        basis::Color,
        glyph::{Coverage, Placement},
        grid::TileBounds,
    },
    image::RgbImage,
};

/// `Canvas` は描画中のフルカラー画像を表す.
pub struct Canvas {
    image: RgbImage,
}

impl Canvas {
    /// 一辺 `side_length` の白い画像.
    pub fn new(side_length: u32) -> Self {
        Self {
            image: RgbImage::from_pixel(side_length, side_length, Color::WHITE.into()),
        }
    }

    pub fn side_length(&self) -> u32 {
        self.image.width()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Color {
        (*self.image.get_pixel(x, y)).into()
    }

    pub fn pixels(&self) -> impl Iterator<Item = Color> + '_ {
        self.image.pixels().map(|&p| p.into())
    }

    /// `bounds` の内側 (両端を含む) を `color` で塗りつぶす.
    pub fn fill_rect(&mut self, bounds: TileBounds, color: Color) {
        let last = self.side_length() - 1;
        for y in bounds.top..=bounds.bottom.min(last) {
            for x in bounds.left..=bounds.right.min(last) {
                self.image.put_pixel(x, y, color.into());
            }
        }
    }

    /// 原点を `origin` に置いた `coverage` を被覆率に応じて `color` で重ねる. 画像の外は捨てる.
    pub fn draw_coverage(&mut self, coverage: &Coverage, origin: Placement, color: Color) {
        let side = self.side_length() as i32;
        for (x, y, alpha) in coverage.pixels(origin) {
            if x < 0 || y < 0 || x >= side || y >= side {
                continue;
            }
            let pixel = self.image.get_pixel_mut(x as u32, y as u32);
            *pixel = Color::from(*pixel).blend(color, alpha).into();
        }
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }
}
