use {
    crate::error::AvatarError,
    anyhow::{Context as _, Result},
    std::{env, str::FromStr},
};

/// `AvatarConfig` はアバターの見た目を決める設定値を表す.
#[derive(Debug, Clone, PartialEq)]
pub struct AvatarConfig {
    /// 画像の一辺のピクセル数. 4 の倍数でなければならない.
    pub side_length: u32,
    /// 文字のポイントサイズ.
    pub point_size: f32,
    /// 文字を反時計回りに傾ける角度 (度).
    pub angle: f32,
    /// グラデーションの倍率 `k`. 80px では 3 で 16 段が白寄りに広がる.
    pub scale_factor: u32,
    /// パレットの最大色数.
    pub palette_cap: usize,
    /// ポイントからピクセルへ換算するときの解像度.
    pub dpi: f32,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            side_length: 80,
            point_size: 50.0,
            angle: 12.0,
            scale_factor: 3,
            palette_cap: 255,
            dpi: 96.0,
        }
    }
}

impl AvatarConfig {
    pub fn with_side_length(side_length: u32) -> Self {
        Self {
            side_length,
            ..Self::default()
        }
    }

    /// 一辺を 4 等分したタイルの一辺.
    pub fn tile_size(&self) -> u32 {
        self.side_length / 4
    }

    /// ラスタライザに渡すピクセル単位の文字サイズ.
    pub fn pixel_size(&self) -> f32 {
        self.point_size * self.dpi / 72.0
    }

    /// 描画前に設定値を検査する. 問題があれば `AvatarError::Configuration` を返す.
    pub fn validate(&self) -> Result<(), AvatarError> {
        let fail = |msg: String| Err(AvatarError::Configuration(msg));

        if self.side_length == 0 || self.side_length % 4 != 0 {
            return fail(format!(
                "side length {} is not a positive multiple of 4",
                self.side_length
            ));
        }
        // 隙間の 1px を除いても各タイルが 1px 以上残る大きさが要る
        if self.tile_size() < 2 {
            return fail(format!("side length {} is too small", self.side_length));
        }
        if !self.point_size.is_finite() || self.point_size <= 0.0 {
            return fail(format!("point size {} must be positive", self.point_size));
        }
        if !self.dpi.is_finite() || self.dpi <= 0.0 {
            return fail(format!("dpi {} must be positive", self.dpi));
        }
        if !self.angle.is_finite() {
            return fail(format!("angle {} must be finite", self.angle));
        }
        // 255 を超えると 1 段目から白に張り付く
        if !(1..=255).contains(&self.scale_factor) {
            return fail(format!(
                "scale factor {} is outside 1..=255",
                self.scale_factor
            ));
        }
        if !(1..=255).contains(&self.palette_cap) {
            return fail(format!(
                "palette cap {} is outside 1..=255",
                self.palette_cap
            ));
        }
        Ok(())
    }

    /// 環境変数 `AVATAR_*` で既定値を上書きした設定を作る.
    pub fn from_env() -> Result<Self> {
        let default = Self::default();
        let config = Self {
            side_length: var_or("AVATAR_SIDE_LENGTH", default.side_length)?,
            point_size: var_or("AVATAR_POINT_SIZE", default.point_size)?,
            angle: var_or("AVATAR_ANGLE", default.angle)?,
            scale_factor: var_or("AVATAR_SCALE_FACTOR", default.scale_factor)?,
            palette_cap: var_or("AVATAR_PALETTE_CAP", default.palette_cap)?,
            dpi: var_or("AVATAR_DPI", default.dpi)?,
        };
        config.validate()?;
        Ok(config)
    }
}

fn var_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("failed to parse {}='{}'", name, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(e) => Err(e).with_context(|| format!("failed to read {}", name)),
    }
}
