use {
    crate::{basis::Color, basis::Glyph, color::DerivedColor},
    anyhow::Result,
};

/// `GlyphSource` は文字の外接矩形を測り, 被覆率のマスクに変換するフォントを表す.
///
/// 並行に描画できるよう, 実装は内部に可変状態を持たない.
pub trait GlyphSource: Sync {
    /// 大きさ `pixel_size` の `glyph` を `angle` 度だけ反時計回りに回したときの外接矩形.
    fn bounding_box(&self, glyph: Glyph, pixel_size: f32, angle: f32) -> Result<BoundingBox>;

    /// 同じ条件で `glyph` をラスタライズする.
    fn rasterize(&self, glyph: Glyph, pixel_size: f32, angle: f32) -> Result<Coverage>;
}

/// `BoundingBox` は回転させた文字の外接矩形の四隅を表す.
///
/// 座標はベースラインの原点からの相対位置で, y 軸は下向き. 左下, 右下, 右上, 左上の順に並ぶ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox(pub [(i32, i32); 4]);

impl BoundingBox {
    /// y 軸上向きのフォント座標での範囲から, 四隅を `angle` 度回転させて作る.
    pub fn from_extents(x_min: f32, y_min: f32, x_max: f32, y_max: f32, angle: f32) -> Self {
        let (sin, cos) = (angle as f64).to_radians().sin_cos();
        let corner = |x: f32, y: f32| {
            let (x, y) = (x as f64, y as f64);
            let rx = x * cos - y * sin;
            let ry = x * sin + y * cos;
            (rx.round() as i32, -ry.round() as i32)
        };
        Self([
            corner(x_min, y_min),
            corner(x_max, y_min),
            corner(x_max, y_max),
            corner(x_min, y_max),
        ])
    }

    /// 四隅の x 座標の最大値.
    pub fn width(&self) -> i32 {
        self.0.iter().map(|&(x, _)| x).max().unwrap_or(0)
    }

    /// 四隅の y 座標の最小値. ベースラインより上に伸びるので普通は負になる.
    pub fn height(&self) -> i32 {
        self.0.iter().map(|&(_, y)| y).min().unwrap_or(0)
    }
}

/// `Placement` は文字を描くときのベースラインの原点を表す.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
}

impl Placement {
    /// 一辺 `side_length` の画像の中央に `bbox` を置く位置. 横は 2px 右に寄せる.
    pub fn centered(side_length: u32, bbox: &BoundingBox) -> Self {
        let side = side_length as i32;
        Self {
            x: (side - bbox.width()).div_euclid(2) + 2,
            y: (side - bbox.height()).div_euclid(2),
        }
    }

    /// 影を描く位置. 左上に 1px ずらす.
    pub fn shadow(self) -> Self {
        Self {
            x: self.x - 1,
            y: self.y - 1,
        }
    }
}

/// `Contrast` は影と文字の色の組を表す.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contrast {
    pub shadow: Color,
    pub glyph: Color,
}

pub const LIGHT: Color = Color::gray(222);
pub const DARK: Color = Color::gray(33);

impl Contrast {
    /// 暗い背景には暗い影と明るい文字, 明るい背景には明るい影と暗い文字を使う.
    pub fn for_background(derived: &DerivedColor) -> Self {
        if derived.is_dark() {
            Self {
                shadow: DARK,
                glyph: LIGHT,
            }
        } else {
            Self {
                shadow: LIGHT,
                glyph: DARK,
            }
        }
    }
}

/// `Coverage` はラスタライズした文字の被覆率を表す.
///
/// `left` と `top` は原点からマスク左上までのずれで, `top` はベースラインより上を正とする.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coverage {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Coverage {
    /// 原点を `origin` に置いたときに被覆率が 0 でない画素の絶対座標と被覆率.
    pub fn pixels(&self, origin: Placement) -> impl Iterator<Item = (i32, i32, u8)> + '_ {
        let width = self.width as usize;
        let (left, top) = (origin.x + self.left, origin.y - self.top);
        self.data
            .iter()
            .enumerate()
            .filter(|&(_, &alpha)| alpha != 0)
            .map(move |(i, &alpha)| {
                let (col, row) = ((i % width) as i32, (i / width) as i32);
                (left + col, top + row, alpha)
            })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrotated_bounding_box() {
        let bbox = BoundingBox::from_extents(2.0, -1.0, 30.0, 40.0, 0.0);
        assert_eq!(bbox.0, [(2, 1), (30, 1), (30, -40), (2, -40)]);
        assert_eq!(bbox.width(), 30);
        assert_eq!(bbox.height(), -40);
    }

    #[test]
    fn rotated_bounding_box_uses_extreme_corners() {
        let bbox = BoundingBox::from_extents(0.0, 0.0, 40.0, 50.0, 12.0);
        // 反時計回りに回すと右下の角が上がり, 左上の角が左へ出る
        let [lower_left, lower_right, upper_right, upper_left] = bbox.0;
        assert_eq!(lower_left, (0, 0));
        assert!(lower_right.1 < 0);
        assert!(upper_left.0 < 0);
        // x: 40 cos12 - 0 = 39.13, 40 cos12 - 50 sin12 = 28.73
        assert_eq!(bbox.width(), 39);
        // y: -(40 sin12 + 50 cos12) = -57.22
        assert_eq!(bbox.height(), -57);
        assert_eq!(upper_right, (29, -57));
    }

    #[test]
    fn placement_centers_glyph() {
        let bbox = BoundingBox::from_extents(0.0, 0.0, 39.0, 57.0, 0.0);
        let placement = Placement::centered(80, &bbox);
        // floor((80 - 39) / 2) + 2, floor((80 + 57) / 2)
        assert_eq!(placement, Placement { x: 22, y: 68 });
        assert_eq!(placement.shadow(), Placement { x: 21, y: 67 });

        let wide = BoundingBox::from_extents(0.0, 0.0, 101.0, 10.0, 0.0);
        assert_eq!(Placement::centered(80, &wide).x, -11 + 2);
    }

    #[test]
    fn contrast_switches_at_127() {
        let dark = DerivedColor::from_color_key("7e7e7e00").unwrap();
        assert_eq!(
            Contrast::for_background(&dark),
            Contrast {
                shadow: Color::gray(33),
                glyph: Color::gray(222),
            }
        );

        let bright = DerivedColor::from_color_key("7f7f7fff").unwrap();
        assert_eq!(
            Contrast::for_background(&bright),
            Contrast {
                shadow: Color::gray(222),
                glyph: Color::gray(33),
            }
        );

        // (0 + 0 + 255) / 3 = 85
        let blue = DerivedColor::from_color_key("0000ff00").unwrap();
        assert_eq!(Contrast::for_background(&blue).glyph, LIGHT);

        // 真っ白でも明るい側に入る
        let white = DerivedColor::from_color_key("ffffff00").unwrap();
        assert_eq!(
            Contrast::for_background(&white),
            Contrast {
                shadow: LIGHT,
                glyph: DARK,
            }
        );
    }

    #[test]
    fn block_font_rotates_like_its_bounding_box() -> Result<()> {
        let font = testing::BlockFont::default();
        let glyph = Glyph::from_source("T");
        for &angle in &[0.0, 12.0, 30.0] {
            let (bbox, ink) = testing::check_ink_follows_bbox(&font, glyph, 66.0, angle)?;
            // 矩形なのでインクは外接矩形の端まで届く
            let ink_min_x = ink.iter().map(|p| p.0).min().unwrap();
            let ink_max_x = ink.iter().map(|p| p.0).max().unwrap();
            let ink_min_y = ink.iter().map(|p| p.1).min().unwrap();
            let bbox_min_x = bbox.0.iter().map(|c| c.0).min().unwrap();
            assert!((ink_min_x - bbox_min_x).abs() <= 1, "angle {}", angle);
            assert!((ink_max_x + 1 - bbox.width()).abs() <= 1, "angle {}", angle);
            assert!((ink_min_y - bbox.height()).abs() <= 1, "angle {}", angle);
        }

        // 回さなければ 40x46 の矩形をそのまま塗る
        let coverage = font.rasterize(glyph, 66.0, 0.0)?;
        assert_eq!(
            (coverage.left, coverage.top, coverage.width, coverage.height),
            (0, 46, 40, 46)
        );
        assert!(coverage.data.iter().all(|&a| a == 255));
        Ok(())
    }

    #[test]
    fn coverage_pixels_are_placed_above_baseline() {
        let coverage = Coverage {
            left: 1,
            top: 2,
            width: 2,
            height: 2,
            data: vec![0, 10, 20, 30],
        };
        let pixels = coverage.pixels(Placement { x: 10, y: 10 }).collect::<Vec<_>>();
        assert_eq!(pixels, [(12, 8, 10), (11, 9, 20), (12, 9, 30)]);
    }
}
