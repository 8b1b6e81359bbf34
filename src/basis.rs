/// `Color` は 24 ビットの RGB カラーを表す.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl std::fmt::Debug for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Color {
    pub const WHITE: Color = Color::gray(255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(v: u8) -> Self {
        Self { r: v, g: v, b: v }
    }

    /// 3 チャンネルの平均の明るさ. 整数除算はしない.
    pub fn average(self) -> f64 {
        (self.r as f64 + self.g as f64 + self.b as f64) / 3.0
    }

    /// `self` と `other` の二乗ユークリッド距離.
    pub(crate) fn distance_sq(self, other: Self) -> u32 {
        let dr = self.r as i32 - other.r as i32;
        let dg = self.g as i32 - other.g as i32;
        let db = self.b as i32 - other.b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }

    /// 不透明度 `alpha` で `self` の上に `fg` を重ねた色.
    pub(crate) fn blend(self, fg: Self, alpha: u8) -> Self {
        let mix = |bg: u8, fg: u8| {
            let a = alpha as u32;
            ((fg as u32 * a + bg as u32 * (255 - a) + 127) / 255) as u8
        };
        Self {
            r: mix(self.r, fg.r),
            g: mix(self.g, fg.g),
            b: mix(self.b, fg.b),
        }
    }
}

impl From<image::Rgb<u8>> for Color {
    fn from(image::Rgb([r, g, b]): image::Rgb<u8>) -> Self {
        Self { r, g, b }
    }
}

impl From<Color> for image::Rgb<u8> {
    fn from(Color { r, g, b }: Color) -> Self {
        image::Rgb([r, g, b])
    }
}

/// `Glyph` はアバター中央に描く 1 文字を表す. `A` から `Z` の大文字か, それ以外を表す `*` のどちらか.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Glyph(char);

impl Glyph {
    pub const FALLBACK: Glyph = Glyph('*');

    /// `source` の先頭の文字を大文字にしたもの. ASCII の英字でなければ (空文字列も含む) `*` になる.
    pub fn from_source(source: &str) -> Self {
        match source.chars().next().map(|c| c.to_ascii_uppercase()) {
            Some(c @ 'A'..='Z') => Self(c),
            _ => Self::FALLBACK,
        }
    }

    pub fn char(self) -> char {
        self.0
    }
}

impl std::fmt::Display for Glyph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[test]
fn test_glyph_from_source() {
    assert_eq!(Glyph::from_source("Tiger-222").char(), 'T');
    assert_eq!(Glyph::from_source("tiger").char(), 'T');
    assert_eq!(Glyph::from_source("z").char(), 'Z');
    for source in ["", "2", "*", "-a", " b", "é", "ß", "[", "@"] {
        assert_eq!(Glyph::from_source(source), Glyph::FALLBACK, "{:?}", source);
    }
}

#[test]
fn test_glyph_from_every_ascii_letter() {
    for c in ('a'..='z').chain('A'..='Z') {
        let glyph = Glyph::from_source(&c.to_string());
        assert_eq!(glyph.char(), c.to_ascii_uppercase());
    }
}

#[test]
fn test_color_blend() {
    let white = Color::WHITE;
    let dark = Color::gray(33);
    assert_eq!(white.blend(dark, 255), dark);
    assert_eq!(white.blend(dark, 0), white);
    assert_eq!(Color::gray(0).blend(Color::gray(255), 128), Color::gray(128));
}
