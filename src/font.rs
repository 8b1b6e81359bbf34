use {
    crate::{
        basis::Glyph,
        error::AvatarError,
        glyph::{BoundingBox, Coverage, GlyphSource},
    },
    anyhow::{Context as _, Result},
    std::{path::Path, sync::Arc},
    swash::{
        scale::{image::Content, Render, ScaleContext, Scaler, Source},
        zeno::{Angle, Format, Transform},
        FontRef, GlyphId,
    },
};

/// `Font` は TrueType / OpenType フォントのバイト列を表す.
///
/// 読み込みはプロセス開始時に一度だけ行い, 以降は `clone` してスレッド間で共有する.
#[derive(Clone)]
pub struct Font {
    data: Arc<[u8]>,
}

impl std::fmt::Debug for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Font({} bytes)", self.data.len())
    }
}

impl Font {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| AvatarError::Resource(format!("{}: {}", path.display(), e)))?;
        Self::from_bytes(data).with_context(|| format!("failed to load font {}", path.display()))
    }

    pub fn from_bytes(data: impl Into<Arc<[u8]>>) -> Result<Self> {
        let font = Self { data: data.into() };
        font.font_ref()?;
        Ok(font)
    }

    fn font_ref(&self) -> Result<FontRef<'_>, AvatarError> {
        FontRef::from_index(&self.data, 0)
            .ok_or_else(|| AvatarError::Resource("not a TrueType or OpenType font".to_string()))
    }

    fn glyph_id(&self, glyph: Glyph) -> Result<GlyphId, AvatarError> {
        match self.font_ref()?.charmap().map(glyph.char()) {
            0 => Err(AvatarError::Resource(format!(
                "font has no glyph for '{}'",
                glyph
            ))),
            id => Ok(id),
        }
    }

    /// 描画ごとに `ScaleContext` を作るので `&self` のまま並行に呼べる.
    fn with_scaler<T>(
        &self,
        pixel_size: f32,
        f: impl FnOnce(&mut Scaler<'_>) -> Option<T>,
    ) -> Result<Option<T>, AvatarError> {
        let mut context = ScaleContext::new();
        let mut scaler = context
            .builder(self.font_ref()?)
            .size(pixel_size)
            .hint(false)
            .build();
        Ok(f(&mut scaler))
    }
}

impl GlyphSource for Font {
    fn bounding_box(&self, glyph: Glyph, pixel_size: f32, angle: f32) -> Result<BoundingBox> {
        let id = self.glyph_id(glyph)?;
        let bounds = self
            .with_scaler(pixel_size, |scaler| scaler.scale_outline(id))?
            .map(|outline| outline.bounds())
            .ok_or_else(|| AvatarError::Resource(format!("font has no outline for '{}'", glyph)))?;
        Ok(BoundingBox::from_extents(
            bounds.min.x,
            bounds.min.y,
            bounds.max.x,
            bounds.max.y,
            angle,
        ))
    }

    fn rasterize(&self, glyph: Glyph, pixel_size: f32, angle: f32) -> Result<Coverage> {
        let id = self.glyph_id(glyph)?;
        let image = self
            .with_scaler(pixel_size, |scaler| {
                Render::new(&[Source::Outline])
                    .format(Format::Alpha)
                    .transform(Some(Transform::rotation(Angle::from_degrees(angle))))
                    .render(scaler, id)
            })?
            .ok_or_else(|| {
                AvatarError::Resource(format!("failed to rasterize '{}'", glyph))
            })?;

        if !matches!(image.content, Content::Mask) {
            return Err(AvatarError::Resource(format!(
                "font has a color or subpixel image for '{}'",
                glyph
            ))
            .into());
        }

        Ok(Coverage {
            left: image.placement.left,
            top: image.placement.top,
            width: image.placement.width,
            height: image.placement.height,
            data: image.data,
        })
    }
}
