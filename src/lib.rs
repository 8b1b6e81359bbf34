//! 入力キーから決まる色のタイルと頭文字で, アバター画像を決定的に作る.

pub mod basis;
pub mod cache;
pub mod canvas;
pub mod color;
pub mod config;
pub mod error;
pub mod font;
pub mod glyph;
pub mod grid;
pub mod palette;
pub mod render;
pub mod request;

pub use crate::{
    basis::{Color, Glyph},
    cache::{get_or_render, lookup_or_render, AvatarStore, FsStore, Lookup, MemoryStore},
    color::{DerivedColor, GradientStep},
    config::AvatarConfig,
    error::AvatarError,
    font::Font,
    glyph::GlyphSource,
    render::{generate_avatar, Avatar, AvatarKey},
    request::{respond, AvatarRequest, Response},
};
