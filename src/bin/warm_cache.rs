use std::{
    env,
    fs::File,
    io::{self, BufRead, BufReader},
    time::Instant,
};

use anyhow::{Context as _, Result};
use easy_parallel::Parallel;

use avatar::{
    cache::{self, Lookup},
    AvatarConfig, AvatarKey, Font, FsStore,
};

const JOBS: usize = 4;

/// 1 行に 1 つのキーを読み, キャッシュにないアバターを並列に描いておく.
///
/// 行はタブ区切りで `key<TAB>letter` とも書ける. 文字を省くとキーの先頭を使う.
fn main() -> Result<()> {
    #[cfg(feature = "env")]
    dotenv::dotenv().ok();

    let mut args = env::args().skip(1);
    let lines = match args.next() {
        Some(path) => read_lines(BufReader::new(
            File::open(&path).with_context(|| format!("failed to open {}", path))?,
        ))?,
        None => {
            let stdin = io::stdin();
            read_lines(stdin.lock())?
        }
    };

    let config = AvatarConfig::from_env()?;
    let font_path = env::var("AVATAR_FONT").unwrap_or_else(|_| "./_avatars.ttf".to_string());
    let cache_dir = env::var("AVATAR_CACHE_DIR").unwrap_or_else(|_| ".".to_string());
    let font = Font::open(&font_path)?;
    let store = FsStore::create(cache_dir)?;

    let keys = lines
        .iter()
        .map(|line| {
            let mut fields = line.splitn(2, '\t');
            let raw_key = fields.next().unwrap_or_default();
            let raw_letter = fields.next().unwrap_or(raw_key);
            AvatarKey::new(raw_key, raw_letter, config.side_length)
        })
        .collect::<Vec<_>>();

    let started = Instant::now();
    let chunk_size = (keys.len() + JOBS - 1) / JOBS;
    let results = Parallel::new()
        .each(keys.chunks(chunk_size.max(1)), |chunk| -> Result<usize> {
            let mut rendered = 0;
            for key in chunk {
                let (_, lookup) = cache::lookup_or_render(&store, key, &config, &font)
                    .with_context(|| format!("failed to render {}", key.cache_key()))?;
                if lookup == Lookup::Rendered {
                    rendered += 1;
                }
            }
            Ok(rendered)
        })
        .run();

    let mut rendered = 0;
    for result in results {
        rendered += result?;
    }
    println!(
        "{} keys, {} rendered, {} cached, in {:?}",
        keys.len(),
        rendered,
        keys.len() - rendered,
        started.elapsed()
    );
    Ok(())
}

fn read_lines(reader: impl BufRead) -> Result<Vec<String>> {
    let mut lines = vec![];
    for line in reader.lines() {
        let line = line.context("failed to read keys")?;
        if !line.trim().is_empty() {
            lines.push(line);
        }
    }
    Ok(lines)
}
