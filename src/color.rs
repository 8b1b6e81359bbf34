use crate::{basis::Color, error::AvatarError};

/// CRC-32/BZIP2. 多項式 0x04C11DB7 を反転させずに上位ビットから処理する.
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xffff_ffffu32;
    for &b in data {
        crc ^= (b as u32) << 24;
        for _ in 0..8 {
            crc = if crc & 0x8000_0000 != 0 {
                (crc << 1) ^ 0x04c1_1db7
            } else {
                crc << 1
            };
        }
    }
    !crc
}

/// `key` のチェックサムを下位バイトから順に並べた 4 バイト.
///
/// 既存のキャッシュファイル名と揃えるため, 上位バイトからではなくこの順で並べる.
fn checksum_bytes(key: &str) -> [u8; 4] {
    crc32(key.as_bytes()).to_le_bytes()
}

/// `key` のチェックサムを 8 桁の小文字 16 進数にしたもの.
pub fn color_key(key: &str) -> String {
    hex(&checksum_bytes(key))
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// `DerivedColor` は入力キーから求めた基準色と, その元になった `color_key` を表す.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedColor {
    pub base: Color,
    color_key: String,
}

impl DerivedColor {
    /// 任意の文字列から基準色を求める. 失敗しない.
    pub fn derive(key: &str) -> Self {
        let bytes = checksum_bytes(key);
        let [r, g, b, _alpha] = bytes;
        Self {
            base: Color { r, g, b },
            color_key: hex(&bytes),
        }
    }

    /// 8 桁の 16 進数 (キャッシュ名の先頭部分) から基準色を復元する.
    pub fn from_color_key(color_key: &str) -> Result<Self, AvatarError> {
        let base = split_color_key(color_key).ok_or_else(|| {
            AvatarError::Configuration(format!("malformed color key '{}'", color_key))
        })?;
        Ok(Self {
            base,
            color_key: color_key.to_ascii_lowercase(),
        })
    }

    pub fn color_key(&self) -> &str {
        &self.color_key
    }

    /// 平均の明るさが 127 未満なら暗い背景とみなす.
    pub fn is_dark(&self) -> bool {
        self.base.average() < 127.0
    }
}

/// 2 桁ずつ 4 つに分け, 先頭 3 つを RGB として読む. 4 つ目 (アルファ) は読むだけで使わない.
fn split_color_key(color_key: &str) -> Option<Color> {
    if color_key.len() != 8 || !color_key.is_ascii() {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&color_key[i * 2..i * 2 + 2], 16).ok();
    let (r, g, b, _alpha) = (byte(0)?, byte(1)?, byte(2)?, byte(3)?);
    Some(Color { r, g, b })
}

/// `GradientStep` は 1 段ごとに各チャンネルを 255 へ近づける増分を表す.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStep {
    pub dr: f64,
    pub dg: f64,
    pub db: f64,
}

impl GradientStep {
    pub fn new(base: Color, side_length: u32) -> Self {
        let delta = |c: u8| (255.0 - c as f64) / side_length as f64;
        Self {
            dr: delta(base.r),
            dg: delta(base.g),
            db: delta(base.b),
        }
    }

    /// 段数 `step` のタイル色. `floor(base + delta * step * k)` を 0..=255 に収める.
    pub fn tint(&self, base: Color, step: u32, scale_factor: u32) -> Color {
        let i = step as f64 * scale_factor as f64;
        let channel = |c: u8, d: f64| (c as f64 + d * i).floor().clamp(0.0, 255.0) as u8;
        Color {
            r: channel(base.r, self.dr),
            g: channel(base.g, self.dg),
            b: channel(base.b, self.db),
        }
    }
}
