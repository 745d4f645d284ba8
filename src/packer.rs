use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{ConfigError, PackError};
use crate::guillotine::GuillotineBin;
use crate::maxrects::MaxRectsBin;
use crate::skyline::SkylineBin;
use crate::types::{FreeRect, Placement, Rect, Spot};

/// Free-space bookkeeping of one sheet. Each packing strategy keeps its own
/// representation; `SheetPacker` drives any of them.
pub trait FreeSpace {
    type Candidate: Copy;

    /// Empty sheet of size `stock`.
    fn new(stock: Rect, kerf: f64) -> Self;

    /// Best position for `piece` on this sheet, or `None` if it does not fit.
    fn find_best(&self, piece: Rect, allow_rotate: bool) -> Option<Self::Candidate>;

    /// Commits a candidate returned by `find_best` for the same `piece`.
    fn place(&mut self, candidate: Self::Candidate, piece: Rect) -> Spot;
}

/// A free rectangle chosen for a piece, with the score that won.
#[derive(Debug, Clone, Copy)]
pub struct ScoredPlacement<S> {
    pub free_idx: usize,
    pub rotated: bool,
    pub score: S,
}

/// Lowest-scoring fit of `piece` over `free_rects`. Rects are tried in list
/// order, unrotated before rotated; only a strictly lower score replaces the
/// current best.
pub(crate) fn best_fit<S, F>(
    free_rects: &[FreeRect],
    piece: Rect,
    allow_rotate: bool,
    score: F,
) -> Option<ScoredPlacement<S>>
where
    S: PartialOrd + Copy,
    F: Fn(Rect, Rect) -> S,
{
    let mut best: Option<ScoredPlacement<S>> = None;
    let orientations: &[bool] = if allow_rotate { &[false, true] } else { &[false] };

    for (idx, free) in free_rects.iter().enumerate() {
        for &rotated in orientations {
            let size = if rotated { piece.rotated() } else { piece };
            if !size.fits_in(&free.rect) {
                continue;
            }
            let s = score(size, free.rect);
            if best.is_none_or(|b| s < b.score) {
                best = Some(ScoredPlacement {
                    free_idx: idx,
                    rotated,
                    score: s,
                });
            }
        }
    }

    best
}

/// A piece together with where it ended up.
#[derive(Debug, Clone)]
pub struct Placed<T> {
    pub piece: T,
    pub placement: Placement,
}

#[derive(Debug, Clone)]
pub struct Sheet<T> {
    pub index: usize,
    pub placements: Vec<Placed<T>>,
}

impl<T> Sheet<T> {
    fn new(index: usize) -> Self {
        Self {
            index,
            placements: Vec::new(),
        }
    }

    pub fn used_area(&self) -> f64 {
        self.placements.iter().map(|p| p.placement.rect.area()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}

/// Common interface of the packing strategies.
pub trait BinPacker<T> {
    /// Places `piece` with rotation allowed.
    fn pack(&mut self, piece: T, width: f64, height: f64) -> Result<Placement, PackError> {
        self.pack_piece(piece, Rect::new(width, height), true)
    }

    fn pack_piece(&mut self, piece: T, size: Rect, allow_rotate: bool)
    -> Result<Placement, PackError>;

    /// All sheets opened so far, in creation order. The last one is active.
    fn sheets(&self) -> &[Sheet<T>];

    fn sheet_count(&self) -> usize {
        self.sheets().len()
    }

    fn stock(&self) -> Rect;

    fn kerf(&self) -> f64;
}

/// Opens sheets on demand and drives one `FreeSpace` strategy.
///
/// Only the last sheet accepts pieces. When a piece does not fit there, one
/// fresh sheet is opened and the search is retried once; if the piece does
/// not fit on the empty sheet either, the call fails and the fresh sheet
/// stays active.
#[derive(Debug, Clone)]
pub struct SheetPacker<S, T> {
    stock: Rect,
    kerf: f64,
    space: S,
    sheets: Vec<Sheet<T>>,
}

pub type GuillotinePacker<T> = SheetPacker<GuillotineBin, T>;
pub type MaxRectsPacker<T> = SheetPacker<MaxRectsBin, T>;
pub type SkylinePacker<T> = SheetPacker<SkylineBin, T>;

impl<S: FreeSpace, T> SheetPacker<S, T> {
    pub fn new(sheet_width: f64, sheet_height: f64, kerf: f64) -> Result<Self, ConfigError> {
        let stock = Rect::new(sheet_width, sheet_height);
        if !stock.is_valid() {
            return Err(ConfigError::InvalidSheet {
                width: sheet_width,
                height: sheet_height,
            });
        }
        if !kerf.is_finite() || kerf < 0.0 {
            return Err(ConfigError::InvalidKerf(kerf));
        }
        Ok(Self {
            stock,
            kerf,
            space: S::new(stock, kerf),
            sheets: vec![Sheet::new(0)],
        })
    }

    /// Free-space state of the active sheet.
    pub fn active_space(&self) -> &S {
        &self.space
    }

    fn start_new_sheet(&mut self) {
        self.space = S::new(self.stock, self.kerf);
        let index = self.sheets.len();
        self.sheets.push(Sheet::new(index));
        debug!(sheet = index, "opened new sheet");
    }
}

impl<S: FreeSpace, T> BinPacker<T> for SheetPacker<S, T> {
    fn pack_piece(
        &mut self,
        piece: T,
        size: Rect,
        allow_rotate: bool,
    ) -> Result<Placement, PackError> {
        if !size.is_valid() {
            return Err(PackError::InvalidPiece {
                width: size.w,
                height: size.h,
            });
        }

        let candidate = match self.space.find_best(size, allow_rotate) {
            Some(candidate) => candidate,
            None => {
                self.start_new_sheet();
                self.space
                    .find_best(size, allow_rotate)
                    .ok_or(PackError::Unplaceable {
                        width: size.w,
                        height: size.h,
                        sheet_width: self.stock.w,
                        sheet_height: self.stock.h,
                    })?
            }
        };

        let spot = self.space.place(candidate, size);
        let sheet_index = self.sheets.len() - 1;
        let placement = Placement::on_sheet(sheet_index, spot);
        trace!(
            sheet = sheet_index,
            x = placement.x,
            y = placement.y,
            rotated = placement.rotated,
            "placed {}",
            placement.rect
        );
        self.sheets[sheet_index]
            .placements
            .push(Placed { piece, placement });
        Ok(placement)
    }

    fn sheets(&self) -> &[Sheet<T>] {
        &self.sheets
    }

    fn stock(&self) -> Rect {
        self.stock
    }

    fn kerf(&self) -> f64 {
        self.kerf
    }
}

/// Packing strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Single straight cut per placement. Fast, fragments space.
    Guillotine,
    /// Maximal free rectangles. Tighter packing, slower.
    #[default]
    MaxRects,
    /// Bottom-left placement on a height profile.
    Skyline,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [Algorithm::Guillotine, Algorithm::MaxRects, Algorithm::Skyline];

    pub fn packer<T: 'static>(
        self,
        stock: Rect,
        kerf: f64,
    ) -> Result<Box<dyn BinPacker<T>>, ConfigError> {
        let packer: Box<dyn BinPacker<T>> = match self {
            Algorithm::Guillotine => Box::new(GuillotinePacker::new(stock.w, stock.h, kerf)?),
            Algorithm::MaxRects => Box::new(MaxRectsPacker::new(stock.w, stock.h, kerf)?),
            Algorithm::Skyline => Box::new(SkylinePacker::new(stock.w, stock.h, kerf)?),
        };
        Ok(packer)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Guillotine => "guillotine",
            Algorithm::MaxRects => "maxrects",
            Algorithm::Skyline => "skyline",
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "guillotine" => Ok(Algorithm::Guillotine),
            "maxrects" => Ok(Algorithm::MaxRects),
            "skyline" => Ok(Algorithm::Skyline),
            _ => Err(ConfigError::UnknownAlgorithm(s.to_string())),
        }
    }
}
