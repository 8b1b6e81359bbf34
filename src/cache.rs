use {
    crate::{
        config::AvatarConfig,
        glyph::GlyphSource,
        render::{self, AvatarKey},
    },
    anyhow::{Context as _, Result},
    bytes::Bytes,
    log::{debug, warn},
    std::{
        collections::HashMap,
        fs::{self, File},
        io::{ErrorKind, Write},
        path::{Path, PathBuf},
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex,
        },
    },
};

/// `AvatarStore` はキャッシュキーでエンコード済みのアバターを出し入れする保存先を表す.
pub trait AvatarStore: Sync {
    fn get(&self, cache_key: &str) -> Result<Option<Bytes>>;
    fn put(&self, cache_key: &str, bytes: &Bytes) -> Result<()>;
}

/// `Lookup` はキャッシュを引いた結果を表す.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// 保存済みのものを返した.
    Hit,
    /// なかったので描いて保存した.
    Rendered,
}

/// `store` に `key` のアバターがあればそれを返し, なければ描いて保存してから返す.
pub fn get_or_render<S, F>(
    store: &S,
    key: &AvatarKey,
    config: &AvatarConfig,
    font: &F,
) -> Result<Bytes>
where
    S: AvatarStore + ?Sized,
    F: GlyphSource + ?Sized,
{
    lookup_or_render(store, key, config, font).map(|(bytes, _)| bytes)
}

/// `get_or_render` と同じだが, 保存済みだったかどうかも返す. `store` は 1 回だけ引く.
pub fn lookup_or_render<S, F>(
    store: &S,
    key: &AvatarKey,
    config: &AvatarConfig,
    font: &F,
) -> Result<(Bytes, Lookup)>
where
    S: AvatarStore + ?Sized,
    F: GlyphSource + ?Sized,
{
    let cache_key = key.cache_key();
    if let Some(bytes) = store.get(&cache_key)? {
        debug!("cache hit: {}", cache_key);
        return Ok((bytes, Lookup::Hit));
    }

    debug!("cache miss: {}", cache_key);
    let bytes = render::render_png(key, config, font)?;
    store.put(&cache_key, &bytes)?;
    Ok((bytes, Lookup::Rendered))
}

/// `FsStore` はディレクトリに `{cache_key}.png` という名前で保存する.
#[derive(Debug)]
pub struct FsStore {
    dir: PathBuf,
    temp_counter: AtomicUsize,
}

impl FsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            temp_counter: AtomicUsize::new(0),
        }
    }

    /// ディレクトリがなければ作る.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::new(dir);
        fs::create_dir_all(&store.dir)
            .with_context(|| format!("failed to create cache dir {}", store.dir.display()))?;
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, cache_key: &str) -> PathBuf {
        self.dir.join(format!("{}.png", cache_key))
    }

    fn temp_path(&self, cache_key: &str) -> PathBuf {
        let n = self.temp_counter.fetch_add(1, Ordering::Relaxed);
        self.dir
            .join(format!(".{}.{}.{}.tmp", cache_key, std::process::id(), n))
    }
}

impl AvatarStore for FsStore {
    fn get(&self, cache_key: &str) -> Result<Option<Bytes>> {
        let path = self.path_of(cache_key);
        match fs::read(&path) {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e)
                .with_context(|| format!("failed to read cached avatar {}", path.display())),
        }
    }

    /// 一時ファイルに書いてから置き換えるので, 同じキーを並行に書いても壊れたファイルは見えない.
    fn put(&self, cache_key: &str, bytes: &Bytes) -> Result<()> {
        let path = self.path_of(cache_key);
        let temp = self.temp_path(cache_key);

        let written = File::create(&temp)
            .and_then(|mut f| {
                f.write_all(bytes)?;
                f.sync_all()
            })
            .and_then(|_| fs::rename(&temp, &path));

        if let Err(e) = written {
            if let Err(remove) = fs::remove_file(&temp) {
                if remove.kind() != ErrorKind::NotFound {
                    warn!("failed to remove {}: {}", temp.display(), remove);
                }
            }
            return Err(e)
                .with_context(|| format!("failed to write cached avatar {}", path.display()));
        }
        Ok(())
    }
}

/// `MemoryStore` はメモリ上に保存する. 読み書きの回数も数える.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Bytes>>,
    gets: AtomicUsize,
    puts: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Bytes>> {
        // poison は無視する
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AvatarStore for MemoryStore {
    fn get(&self, cache_key: &str) -> Result<Option<Bytes>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok(self.lock().get(cache_key).cloned())
    }

    fn put(&self, cache_key: &str, bytes: &Bytes) -> Result<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.lock().insert(cache_key.to_string(), bytes.clone());
        Ok(())
    }
}
