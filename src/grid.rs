/// 一辺あたりのタイル数.
pub const TILES_PER_SIDE: u8 = 4;

/// `Pos` は `Grid` 上のタイルの位置を表す.
///
/// フィールドの `u8` の上位 4 ビットに X 座標 (列), 下位 4 ビットに Y 座標 (行) を格納する. それぞれは必ず `TILES_PER_SIDE` 未満になる.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos(u8);

impl std::fmt::Debug for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x(), self.y())
    }
}

impl Pos {
    pub const fn new(x: u8, y: u8) -> Self {
        debug_assert!(x < TILES_PER_SIDE);
        debug_assert!(y < TILES_PER_SIDE);
        Self(x << 4 | y)
    }

    /// 列.
    pub const fn x(&self) -> u8 {
        self.0 >> 4 & 0xf
    }

    /// 行.
    pub const fn y(&self) -> u8 {
        self.0 & 0xf
    }
}

/// `TileStep` はタイルを塗る順番の 1 要素で, 位置 `pos` と段数 `step` を表す.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileStep {
    pub pos: Pos,
    pub step: u8,
}

const fn tile(x: u8, y: u8, step: u8) -> TileStep {
    TileStep {
        pos: Pos::new(x, y),
        step,
    }
}

/// タイルを塗る順番. 偶数行は左から右, 奇数行は右から左へ進み, 段数は 15 から 0 へ減っていく.
///
/// 最初に塗る左上が最も白に近く, 最後に塗る左下が基準色そのものになる.
pub const TRAVERSAL: [TileStep; 16] = [
    tile(0, 0, 15),
    tile(1, 0, 14),
    tile(2, 0, 13),
    tile(3, 0, 12),
    tile(3, 1, 11),
    tile(2, 1, 10),
    tile(1, 1, 9),
    tile(0, 1, 8),
    tile(0, 2, 7),
    tile(1, 2, 6),
    tile(2, 2, 5),
    tile(3, 2, 4),
    tile(3, 3, 3),
    tile(2, 3, 2),
    tile(1, 3, 1),
    tile(0, 3, 0),
];

/// `TileBounds` はタイルが覆うピクセルの矩形を表す. 両端を含む.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileBounds {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl TileBounds {
    pub fn contains(&self, x: u32, y: u32) -> bool {
        self.left <= x && x <= self.right && self.top <= y && y <= self.bottom
    }
}

/// `Grid` は一辺 `side_length` の画像を 4×4 のタイルに分ける分割グリッドを表す.
#[derive(Debug, Clone, Copy)]
pub struct Grid {
    tile: u32,
}

impl Grid {
    /// `side_length` は `AvatarConfig::validate` を通った値でなければならない.
    pub fn new(side_length: u32) -> Self {
        debug_assert!(side_length % TILES_PER_SIDE as u32 == 0);
        Self {
            tile: side_length / TILES_PER_SIDE as u32,
        }
    }

    pub fn tile_size(&self) -> u32 {
        self.tile
    }

    /// `index` 列目 (行目) の範囲. 先頭以外は手前に 1px の隙間を空ける.
    fn span(&self, index: u8) -> (u32, u32) {
        let s = self.tile;
        let i = index as u32;
        let start = if i == 0 { 0 } else { i * s + 1 };
        (start, (i + 1) * s - 1)
    }

    pub fn bounds(&self, pos: Pos) -> TileBounds {
        let (left, right) = self.span(pos.x());
        let (top, bottom) = self.span(pos.y());
        TileBounds {
            left,
            top,
            right,
            bottom,
        }
    }

    /// ピクセル `(x, y)` を含むタイル. 隙間やグリッドの外なら `None`.
    pub fn tile_at(&self, x: u32, y: u32) -> Option<Pos> {
        let index = |v: u32| {
            (0..TILES_PER_SIDE).find(|&i| {
                let (start, end) = self.span(i);
                start <= v && v <= end
            })
        };
        Some(Pos::new(index(x)?, index(y)?))
    }

    pub fn all_pos(&self) -> impl Iterator<Item = Pos> {
        (0..TILES_PER_SIDE).flat_map(|y| (0..TILES_PER_SIDE).map(move |x| Pos::new(x, y)))
    }
}
