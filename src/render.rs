use {
    crate::{
        basis::{Color, Glyph},
        canvas::Canvas,
        color::{DerivedColor, GradientStep},
        config::AvatarConfig,
        glyph::{Contrast, GlyphSource, Placement},
        grid::{Grid, TRAVERSAL},
        palette,
    },
    anyhow::Result,
    bytes::Bytes,
    log::debug,
};


/// `AvatarKey` はアバターの見た目を決める 3 つ組 (基準色, 文字, 一辺の長さ) を表す.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarKey {
    pub derived: DerivedColor,
    pub glyph: Glyph,
    pub side_length: u32,
}

impl AvatarKey {
    /// 色は `raw_key` から, 文字は `raw_letter_source` の先頭から決める.
    pub fn new(raw_key: &str, raw_letter_source: &str, side_length: u32) -> Self {
        Self {
            derived: DerivedColor::derive(raw_key),
            glyph: Glyph::from_source(raw_letter_source),
            side_length,
        }
    }

    /// `{color_key}_{glyph}_{side_length}`. キャッシュの検索と保存に使う.
    pub fn cache_key(&self) -> String {
        format!(
            "{}_{}_{}",
            self.derived.color_key(),
            self.glyph,
            self.side_length
        )
    }
}

/// `Avatar` はエンコード済みのアバター画像とそのキャッシュキーを表す.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Avatar {
    pub cache_key: String,
    pub bytes: Bytes,
}

/// 入力キーと文字からアバターを作り, PNG にエンコードする.
pub fn generate_avatar<F: GlyphSource + ?Sized>(
    raw_key: &str,
    raw_letter_source: &str,
    config: &AvatarConfig,
    font: &F,
) -> Result<Avatar> {
    let key = AvatarKey::new(raw_key, raw_letter_source, config.side_length);
    let bytes = render_png(&key, config, font)?;
    Ok(Avatar {
        cache_key: key.cache_key(),
        bytes,
    })
}

/// `key` のアバターを描いてパレット PNG にする.
pub fn render_png<F: GlyphSource + ?Sized>(
    key: &AvatarKey,
    config: &AvatarConfig,
    font: &F,
) -> Result<Bytes> {
    let canvas = render(key, config, font)?;
    let indexed = palette::quantize(&canvas.into_image(), config.palette_cap);
    debug!(
        "rendered {} with {} palette entries",
        key.cache_key(),
        indexed.palette.len()
    );
    palette::encode_png(&indexed)
}

/// `key` のアバターをフルカラーで描く.
///
/// 設定値の検査は描き始める前に行う. `key.side_length` と `config.side_length` は一致していなければならない.
pub fn render<F: GlyphSource + ?Sized>(
    key: &AvatarKey,
    config: &AvatarConfig,
    font: &F,
) -> Result<Canvas> {
    config.validate()?;
    anyhow::ensure!(
        key.side_length == config.side_length,
        "key is for {}px but config is for {}px",
        key.side_length,
        config.side_length
    );

    let mut canvas = Canvas::new(config.side_length);
    paint_tiles(&mut canvas, key.derived.base, config);
    paint_glyph(&mut canvas, key, config, font)?;
    Ok(canvas)
}

/// 白い背景の上に 16 枚のタイルを `TRAVERSAL` の順に塗る.
pub fn paint_tiles(canvas: &mut Canvas, base: Color, config: &AvatarConfig) {
    let grid = Grid::new(config.side_length);
    let gradient = GradientStep::new(base, config.side_length);
    for tile in TRAVERSAL.iter() {
        let color = gradient.tint(base, tile.step as u32, config.scale_factor);
        canvas.fill_rect(grid.bounds(tile.pos), color);
    }
}

/// 文字を中央に描く. 影を先に 1px 左上へ描き, その上に文字を重ねる.
pub fn paint_glyph<F: GlyphSource + ?Sized>(
    canvas: &mut Canvas,
    key: &AvatarKey,
    config: &AvatarConfig,
    font: &F,
) -> Result<()> {
    let pixel_size = config.pixel_size();
    let bbox = font.bounding_box(key.glyph, pixel_size, config.angle)?;
    let placement = Placement::centered(config.side_length, &bbox);
    let coverage = font.rasterize(key.glyph, pixel_size, config.angle)?;
    let contrast = Contrast::for_background(&key.derived);

    canvas.draw_coverage(&coverage, placement.shadow(), contrast.shadow);
    canvas.draw_coverage(&coverage, placement, contrast.glyph);
    Ok(())
}
