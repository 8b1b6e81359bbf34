/// `AvatarError` は描画を始める前に弾かれる致命的なエラーを表す.
///
/// 呼び出し側には `anyhow::Error` に包んで返すので, 種類を見たいときは `downcast_ref` で取り出す.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarError {
    /// 一辺の長さやポイントサイズなど, 設定値が描画できない値だった.
    Configuration(String),
    /// フォントが読めない, もしくはグリフを持っていなかった.
    Resource(String),
}

impl std::fmt::Display for AvatarError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AvatarError::Configuration(msg) => write!(f, "invalid configuration: {}", msg),
            AvatarError::Resource(msg) => write!(f, "font resource unavailable: {}", msg),
        }
    }
}

impl std::error::Error for AvatarError {}

/// `err` が `AvatarError::Configuration` なら `true`.
pub fn is_configuration(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<AvatarError>(),
        Some(AvatarError::Configuration(_))
    )
}

/// `err` が `AvatarError::Resource` なら `true`.
pub fn is_resource(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<AvatarError>(), Some(AvatarError::Resource(_)))
}

#[test]
fn test_downcast_through_context() {
    use anyhow::Context as _;

    let err: anyhow::Result<()> = Err(AvatarError::Resource("missing".into()).into());
    let err = err.context("failed to load font").unwrap_err();
    assert!(is_resource(&err));
    assert!(!is_configuration(&err));
}
