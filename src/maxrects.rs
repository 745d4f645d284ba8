use crate::packer::{FreeSpace, ScoredPlacement, best_fit};
use crate::types::{FreeRect, Rect, Spot};

/// Maximal free rectangles of one sheet.
///
/// Members may overlap each other, but none is contained in another. Kerf is
/// carved out only on the right and top of each placed piece; a later piece
/// may sit flush against the left or bottom face of an earlier one.
#[derive(Debug, Clone)]
pub struct MaxRectsBin {
    kerf: f64,
    pub free_rects: Vec<FreeRect>,
}

impl MaxRectsBin {
    fn score(piece: Rect, free: Rect) -> (f64, f64) {
        let leftover_x = free.w - piece.w;
        let leftover_y = free.h - piece.h;
        (leftover_x.min(leftover_y), leftover_x.max(leftover_y))
    }

    /// Pushes the parts of `free` not covered by `used` (plus its right and
    /// top kerf) into `out`.
    fn split(free: &FreeRect, used: &FreeRect, kerf: f64, out: &mut Vec<FreeRect>) {
        let candidates = [
            // left
            FreeRect::new(free.x, free.y, used.x - free.x, free.rect.h),
            // right
            FreeRect::new(
                used.right() + kerf,
                free.y,
                free.right() - (used.right() + kerf),
                free.rect.h,
            ),
            // bottom
            FreeRect::new(free.x, free.y, free.rect.w, used.y - free.y),
            // top
            FreeRect::new(
                free.x,
                used.top() + kerf,
                free.rect.w,
                free.top() - (used.top() + kerf),
            ),
        ];
        out.extend(
            candidates
                .into_iter()
                .filter(|r| r.rect.w > 0.0 && r.rect.h > 0.0),
        );
    }

    /// Drops every rectangle contained in another one. Of two identical
    /// rectangles the later one survives.
    fn prune(&mut self) {
        let rects = &self.free_rects;
        let mut keep = vec![true; rects.len()];
        for i in 0..rects.len() {
            for j in 0..rects.len() {
                if i != j && keep[j] && rects[j].contains(&rects[i]) {
                    keep[i] = false;
                    break;
                }
            }
        }
        let mut keep = keep.into_iter();
        self.free_rects.retain(|_| keep.next().unwrap_or(false));
    }
}

impl FreeSpace for MaxRectsBin {
    type Candidate = ScoredPlacement<(f64, f64)>;

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
        let anchor = self.free_rects[scored.free_idx];
        let placed = if scored.rotated {
            piece.rotated()
        } else {
            piece
        };
        let used = FreeRect {
            x: anchor.x,
            y: anchor.y,
            rect: placed,
        };

        let mut remainders = Vec::new();
        let kerf = self.kerf;
        self.free_rects.retain(|free| {
            if free.overlaps(&used) {
                Self::split(free, &used, kerf, &mut remainders);
                false
            } else {
                true
            }
        });
        self.free_rects.extend(remainders);
        self.prune();

        Spot {
            x: used.x,
            y: used.y,
            rect: placed,
            rotated: scored.rotated,
        }
    }
}
