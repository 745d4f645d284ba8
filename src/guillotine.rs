use crate::packer::{FreeSpace, ScoredPlacement, best_fit};
use crate::types::{FreeRect, Rect, Spot};

/// Disjoint free rectangles of one sheet, split with a single straight cut
/// per placement.
#[derive(Debug, Clone)]
pub struct GuillotineBin {
    kerf: f64,
    pub free_rects: Vec<FreeRect>,
}

impl GuillotineBin {
    /// Best Short Side Fit: smallest leftover along either side. Ties keep
    /// the first candidate in free-list order, unrotated before rotated.
    fn score(piece: Rect, free: Rect) -> f64 {
        (free.w - piece.w).min(free.h - piece.h)
    }

    fn split(&mut self, free: FreeRect, placed: Rect) {
        let kerf = self.kerf;
        let leftover_x = free.rect.w - placed.w;
        let leftover_y = free.rect.h - placed.h;
        let right_x = free.x + placed.w + kerf;
        let top_y = free.y + placed.h + kerf;

        if leftover_x > leftover_y {
            // Vertical cut: right remainder spans the full height
            if leftover_x > kerf {
                self.free_rects
                    .push(FreeRect::new(right_x, free.y, leftover_x - kerf, free.rect.h));
            }
            if leftover_y > kerf {
                self.free_rects
                    .push(FreeRect::new(free.x, top_y, placed.w, leftover_y - kerf));
            }
        } else {
            // Horizontal cut: top remainder spans the full width
            if leftover_y > kerf {
                self.free_rects
                    .push(FreeRect::new(free.x, top_y, free.rect.w, leftover_y - kerf));
            }
            if leftover_x > kerf {
                self.free_rects
                    .push(FreeRect::new(right_x, free.y, leftover_x - kerf, placed.h));
            }
        }
    }
}

impl FreeSpace for GuillotineBin {
    type Candidate = ScoredPlacement<f64>;

    fn new(stock: Rect, kerf: f64) -> Self {
        Self {
            kerf,
            free_rects: vec![FreeRect {
                x: 0.0,
                y: 0.0,
                rect: stock,
            }],
        }
    }

    fn find_best(&self, piece: Rect, allow_rotate: bool) -> Option<Self::Candidate> {
        best_fit(&self.free_rects, piece, allow_rotate, Self::score)
    }

    fn place(&mut self, scored: Self::Candidate, piece: Rect) -> Spot {
        let free = self.free_rects.remove(scored.free_idx);
        let placed = if scored.rotated {
            piece.rotated()
        } else {
            piece
        };

        self.split(free, placed);

        Spot {
            x: free.x,
            y: free.y,
            rect: placed,
            rotated: scored.rotated,
        }
    }
}
