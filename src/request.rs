use {
    crate::{
        cache::{self, AvatarStore},
        config::AvatarConfig,
        glyph::GlyphSource,
        render::AvatarKey,
    },
    anyhow::Result,
    bytes::Bytes,
};

pub const CONTENT_TYPE: &str = "image/png";
pub const DEFAULT_ADDR: &str = "127.0.0.1";
pub const DEFAULT_LETTER: &str = "T";

/// `AvatarRequest` はアバターの要求を表す.
///
/// `t=<text>` なら色も文字も `text` から決める. `t` がなければ色は接続元のアドレスから,
/// 文字は `l=<letter>` から決める.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarRequest {
    Text { text: String },
    Address { remote_addr: String, letter: String },
}

impl AvatarRequest {
    pub fn from_query(query: &str, remote_addr: Option<&str>) -> Self {
        let mut text = None;
        let mut letter = None;
        for (name, value) in parse_query(query) {
            match name.as_str() {
                "t" if text.is_none() => text = Some(value),
                "l" if letter.is_none() => letter = Some(value),
                _ => {}
            }
        }

        match text {
            Some(text) => AvatarRequest::text(&text),
            None => AvatarRequest::Address {
                remote_addr: remote_addr.unwrap_or(DEFAULT_ADDR).to_string(),
                letter: letter.unwrap_or_else(|| DEFAULT_LETTER.to_string()),
            },
        }
    }

    /// 空の `text` もそのまま色に使う. 文字は `*` になる.
    pub fn text(text: &str) -> Self {
        AvatarRequest::Text {
            text: text.to_string(),
        }
    }

    /// 色を決める文字列と, 先頭を文字に使う文字列.
    pub fn sources(&self) -> (&str, &str) {
        match self {
            AvatarRequest::Text { text } => (text.as_str(), text.as_str()),
            AvatarRequest::Address {
                remote_addr,
                letter,
            } => (remote_addr.as_str(), letter.as_str()),
        }
    }

    pub fn key(&self, side_length: u32) -> AvatarKey {
        let (raw_key, raw_letter) = self.sources();
        AvatarKey::new(raw_key, raw_letter, side_length)
    }
}

/// `Response` は返すべき本文とその Content-Type を表す.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub content_type: &'static str,
    pub body: Bytes,
}

/// キャッシュを通して `request` のアバターを返す.
pub fn respond<S, F>(
    store: &S,
    request: &AvatarRequest,
    config: &AvatarConfig,
    font: &F,
) -> Result<Response>
where
    S: AvatarStore + ?Sized,
    F: GlyphSource + ?Sized,
{
    let key = request.key(config.side_length);
    let body = cache::get_or_render(store, &key, config, font)?;
    Ok(Response {
        content_type: CONTENT_TYPE,
        body,
    })
}

/// `a=1&b=2` を名前と値の組に分ける. 値はパーセントデコードし, `+` は空白にする.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = match pair.find('=') {
                Some(i) => (&pair[..i], &pair[i + 1..]),
                None => (pair, ""),
            };
            (percent_decode(name), percent_decode(value))
        })
        .collect()
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => match bytes.get(i + 1..i + 3).and_then(|h| hex_pair(h[0], h[1])) {
                Some(decoded) => {
                    out.push(decoded);
                    i += 2;
                }
                None => out.push(b'%'),
            },
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_pair(hi: u8, lo: u8) -> Option<u8> {
    let digit = |c: u8| (c as char).to_digit(16);
    Some((digit(hi)? * 16 + digit(lo)?) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cache::MemoryStore, glyph::testing::BlockFont};

    #[test]
    fn text_mode() {
        let request = AvatarRequest::from_query("t=Tiger-222", Some("10.0.0.1"));
        assert_eq!(request.sources(), ("Tiger-222", "Tiger-222"));
        assert_eq!(request.key(80).cache_key(), "199f6113_T_80");
    }

    #[test]
    fn address_mode() {
        let request = AvatarRequest::from_query("l=b", Some("10.0.0.1"));
        assert_eq!(request.sources(), ("10.0.0.1", "b"));

        let request = AvatarRequest::from_query("", None);
        assert_eq!(request.sources(), (DEFAULT_ADDR, DEFAULT_LETTER));
    }

    #[test]
    fn text_wins_over_letter() {
        let request = AvatarRequest::from_query("?l=x&t=hello&t=ignored", None);
        assert_eq!(request.sources(), ("hello", "hello"));
    }

    #[test]
    fn empty_text_hashes_empty_string() {
        let request = AvatarRequest::from_query("t=", Some("10.0.0.1"));
        assert_eq!(request, AvatarRequest::text(""));
        assert_eq!(request.sources(), ("", ""));
        assert_eq!(request.key(80).cache_key(), "00000000_*_80");

        // "*" を送ったときとは色が変わる
        let star = AvatarRequest::from_query("t=*", None).key(80);
        assert_eq!(star.glyph.char(), '*');
        assert_ne!(star.cache_key(), "00000000_*_80");
    }

    #[test]
    fn query_decoding() {
        assert_eq!(
            parse_query("t=J%C3%A9r%C3%B4me+D&x&bad=%zz%4"),
            [
                ("t".to_string(), "Jérôme D".to_string()),
                ("x".to_string(), String::new()),
                ("bad".to_string(), "%zz%4".to_string()),
            ]
        );
    }

    #[test]
    fn respond_serves_png_from_cache() -> Result<()> {
        let store = MemoryStore::new();
        let font = BlockFont::default();
        let config = AvatarConfig::default();
        let request = AvatarRequest::from_query("t=Tiger-222", None);

        let first = respond(&store, &request, &config, &font)?;
        let second = respond(&store, &request, &config, &font)?;
        assert_eq!(first.content_type, "image/png");
        assert_eq!(&first.body[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(first, second);
        assert_eq!(store.put_count(), 1);
        Ok(())
    }
}
