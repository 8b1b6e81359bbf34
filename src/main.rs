use std::{
    env,
    fs::File,
    io::{self, BufWriter, Write},
};

use anyhow::{Context as _, Result};

use avatar::{cache, AvatarConfig, AvatarKey, Font, FsStore};

const DEFAULT_FONT: &str = "./_avatars.ttf";

fn main() -> Result<()> {
    #[cfg(feature = "env")]
    dotenv::dotenv().ok();

    let mut args = env::args().skip(1);
    let raw_key = args.next().expect("the avatar key must be given");
    let raw_letter = args.next().unwrap_or_else(|| raw_key.clone());
    let output = args.next();

    let config = AvatarConfig::from_env()?;
    let font_path = env::var("AVATAR_FONT").unwrap_or_else(|_| DEFAULT_FONT.to_string());
    let cache_dir = env::var("AVATAR_CACHE_DIR").unwrap_or_else(|_| ".".to_string());

    let font = Font::open(&font_path)?;
    let store = FsStore::create(cache_dir)?;
    let key = AvatarKey::new(&raw_key, &raw_letter, config.side_length);
    let bytes = cache::get_or_render(&store, &key, &config, &font)?;

    eprintln!(
        "avatar {} ({})",
        key.cache_key(),
        store.path_of(&key.cache_key()).display()
    );

    match output {
        Some(path) => {
            let mut f = BufWriter::new(
                File::create(&path).with_context(|| format!("failed to create {}", path))?,
            );
            f.write_all(&bytes)?;
            f.flush()?;
            eprintln!("saved avatar to {}", path);
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(&bytes)
                .context("failed to output png")?;
        }
    }
    Ok(())
}
