use crate::packer::FreeSpace;
use crate::types::{Rect, Spot};

/// Heights closer than this are one level.
const EPSILON: f64 = 1e-9;

/// One segment of the height profile: material reaches `y` over `[x, right)`.
///
/// Both edges are stored so neighbouring nodes share the exact same `f64`
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkylineNode {
    pub x: f64,
    pub y: f64,
    pub right: f64,
}

impl SkylineNode {
    pub fn width(&self) -> f64 {
        self.right - self.x
    }
}

/// Height profile of one sheet, ordered by `x`, covering `[0, stock.w)`
/// exactly.
///
/// Every node written for a piece also covers the kerf band to its right
/// and sits one kerf above its top edge.
#[derive(Debug, Clone)]
pub struct SkylineBin {
    stock: Rect,
    kerf: f64,
    pub nodes: Vec<SkylineNode>,
}

#[derive(Debug, Clone, Copy)]
pub struct Landing {
    pub node_idx: usize,
    pub x: f64,
    pub y: f64,
    pub rotated: bool,
}

impl SkylineBin {
    /// Right edge of the material a piece of width `w` at `x` claims: the
    /// piece plus kerf, snapped to the sheet edge when it reaches it.
    fn level_right(&self, x: f64, w: f64) -> f64 {
        let right = x + w + self.kerf;
        if right >= self.stock.w - EPSILON {
            self.stock.w
        } else {
            right
        }
    }

    /// Lowest `y` a piece of size `piece` can rest at with its left edge on
    /// node `idx`.
    fn landing_y(&self, idx: usize, piece: Rect) -> Option<f64> {
        let x = self.nodes[idx].x;
        if x + piece.w > self.stock.w {
            return None;
        }

        let right = self.level_right(x, piece.w);
        let y = self.nodes[idx..]
            .iter()
            .take_while(|node| node.x < right)
            .fold(0.0, |y: f64, node| y.max(node.y));

        if y + piece.h > self.stock.h {
            return None;
        }
        Some(y)
    }

    fn add_level(&mut self, idx: usize, new: SkylineNode) {
        self.nodes.insert(idx, new);

        // Clip or drop the nodes now underneath the new one. A node ending
        // within EPSILON past the new edge is swallowed whole.
        let next = idx + 1;
        while next < self.nodes.len() && self.nodes[next].x < self.nodes[idx].right {
            let right = self.nodes[idx].right;
            let node = self.nodes[next];
            if node.right <= right + EPSILON {
                self.nodes[idx].right = right.max(node.right);
                self.nodes.remove(next);
            } else {
                self.nodes[next].x = right;
                break;
            }
        }

        self.merge();
    }

    /// Joins neighbours at the same height, keeping the higher of the two.
    fn merge(&mut self) {
        let mut i = 0;
        while i + 1 < self.nodes.len() {
            let next = self.nodes[i + 1];
            let node = &mut self.nodes[i];
            if (node.y - next.y).abs() <= EPSILON {
                node.y = node.y.max(next.y);
                node.right = next.right;
                self.nodes.remove(i + 1);
            } else {
                i += 1;
            }
        }
    }
}

impl FreeSpace for SkylineBin {
    type Candidate = Landing;

    fn new(stock: Rect, kerf: f64) -> Self {
        Self {
            stock,
            kerf,
            nodes: vec![SkylineNode {
                x: 0.0,
                y: 0.0,
                right: stock.w,
            }],
        }
    }

    /// Bottom-left: lowest landing height wins; ties go to the lowest node
    /// index, unrotated before rotated.
    fn find_best(&self, piece: Rect, allow_rotate: bool) -> Option<Landing> {
        let mut best: Option<Landing> = None;
        let orientations: &[bool] = if allow_rotate { &[false, true] } else { &[false] };

        for idx in 0..self.nodes.len() {
            for &rotated in orientations {
                let size = if rotated { piece.rotated() } else { piece };
                let Some(y) = self.landing_y(idx, size) else {
                    continue;
                };
                if best.is_none_or(|b| y < b.y) {
                    best = Some(Landing {
                        node_idx: idx,
                        x: self.nodes[idx].x,
                        y,
                        rotated,
                    });
                }
            }
        }

        best
    }

    fn place(&mut self, landing: Landing, piece: Rect) -> Spot {
        let placed = if landing.rotated {
            piece.rotated()
        } else {
            piece
        };

        let level = SkylineNode {
            x: landing.x,
            y: landing.y + placed.h + self.kerf,
            right: self.level_right(landing.x, placed.w),
        };
        self.add_level(landing.node_idx, level);

        Spot {
            x: landing.x,
            y: landing.y,
            rect: placed,
            rotated: landing.rotated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packer::checks::*;
    use crate::packer::{BinPacker, SkylinePacker};
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn node(x: f64, y: f64, w: f64) -> SkylineNode {
        SkylineNode { x, y, right: x + w }
    }

    fn place(bin: &mut SkylineBin, w: f64, h: f64) -> Option<Spot> {
        let piece = Rect::new(w, h);
        let landing = bin.find_best(piece, true)?;
        Some(bin.place(landing, piece))
    }

    fn assert_profile_valid(bin: &SkylineBin) {
        let nodes = &bin.nodes;
        assert!(!nodes.is_empty());
        assert_eq!(nodes[0].x, 0.0);
        for pair in nodes.windows(2) {
            assert_eq!(pair[0].right, pair[1].x, "gap or overlap in {nodes:?}");
            assert!(
                (pair[0].y - pair[1].y).abs() > EPSILON,
                "unmerged equal heights in {nodes:?}"
            );
        }
        for n in nodes {
            assert!(n.width() > 0.0, "empty node in {nodes:?}");
        }
        assert_eq!(nodes[nodes.len() - 1].right, bin.stock.w);
    }

    #[test]
    fn test_first_piece_lands_bottom_left() {
        let mut bin = SkylineBin::new(Rect::new(1000.0, 1000.0), 5.0);
        let spot = place(&mut bin, 300.0, 200.0).unwrap();
        assert_eq!((spot.x, spot.y), (0.0, 0.0));
        assert!(!spot.rotated);
        assert_eq!(bin.nodes, vec![node(0.0, 205.0, 305.0), node(305.0, 0.0, 695.0)]);
    }

    #[test]
    fn test_lowest_landing_wins() {
        let mut bin = SkylineBin::new(Rect::new(1000.0, 1000.0), 0.0);
        bin.nodes = vec![
            node(0.0, 300.0, 400.0),
            node(400.0, 100.0, 300.0),
            node(700.0, 200.0, 300.0),
        ];
        let landing = bin.find_best(Rect::new(250.0, 100.0), false).unwrap();
        assert_eq!(landing.node_idx, 1);
        assert_eq!((landing.x, landing.y), (400.0, 100.0));
    }

    #[test]
    fn test_span_takes_highest_node_underneath() {
        let mut bin = SkylineBin::new(Rect::new(1000.0, 1000.0), 0.0);
        bin.nodes = vec![
            node(0.0, 100.0, 200.0),
            node(200.0, 400.0, 100.0),
            node(300.0, 0.0, 700.0),
        ];
        // Spanning nodes 0 and 1 lands at 400; starting on node 2 lands at 0.
        let landing = bin.find_best(Rect::new(250.0, 100.0), false).unwrap();
        assert_eq!((landing.x, landing.y), (300.0, 0.0));
        assert_eq!(bin.landing_y(0, Rect::new(250.0, 100.0)), Some(400.0));
    }

    #[test]
    fn test_rotation_used_only_when_lower() {
        let mut bin = SkylineBin::new(Rect::new(1000.0, 1000.0), 0.0);
        bin.nodes = vec![node(0.0, 500.0, 900.0), node(900.0, 0.0, 100.0)];
        // 300x100 only fits in the 100-wide gap when turned.
        let landing = bin.find_best(Rect::new(300.0, 100.0), true).unwrap();
        assert!(landing.rotated);
        assert_eq!((landing.x, landing.y), (900.0, 0.0));

        let landing = bin.find_best(Rect::new(300.0, 100.0), false).unwrap();
        assert!(!landing.rotated);
        assert_eq!((landing.x, landing.y), (0.0, 500.0));
    }

    #[test]
    fn test_rejects_past_right_edge_and_top() {
        let mut bin = SkylineBin::new(Rect::new(1000.0, 1000.0), 0.0);
        bin.nodes = vec![node(0.0, 950.0, 800.0), node(800.0, 0.0, 200.0)];
        assert!(bin.find_best(Rect::new(300.0, 100.0), false).is_none());
        assert!(bin.find_best(Rect::new(200.0, 1000.0), false).is_some());
    }

    #[test]
    fn test_new_node_swallows_covered_nodes_and_merges() {
        let mut bin = SkylineBin::new(Rect::new(1000.0, 1000.0), 0.0);
        bin.nodes = vec![
            node(0.0, 100.0, 200.0),
            node(200.0, 50.0, 100.0),
            node(300.0, 20.0, 100.0),
            node(400.0, 300.0, 600.0),
        ];
        let piece = Rect::new(400.0, 200.0);
        let landing = bin.find_best(piece, false).unwrap();
        assert_eq!((landing.x, landing.y), (0.0, 100.0));
        bin.place(landing, piece);
        assert_eq!(bin.nodes, vec![node(0.0, 300.0, 1000.0)]);
    }

    #[test]
    fn test_partial_overlap_clips_next_node() {
        let mut bin = SkylineBin::new(Rect::new(1000.0, 1000.0), 0.0);
        place(&mut bin, 600.0, 100.0).unwrap();
        place(&mut bin, 300.0, 50.0).unwrap();
        assert_eq!(
            bin.nodes,
            vec![node(0.0, 100.0, 600.0), node(600.0, 50.0, 300.0), node(900.0, 0.0, 100.0)]
        );
        assert_profile_valid(&bin);
    }

    #[test]
    fn test_kerf_band_clipped_at_sheet_edge() {
        let mut bin = SkylineBin::new(Rect::new(100.0, 100.0), 3.0);
        let spot = place(&mut bin, 100.0, 10.0).unwrap();
        assert_eq!((spot.x, spot.y), (0.0, 0.0));
        assert_eq!(bin.nodes, vec![node(0.0, 13.0, 100.0)]);
    }

    #[test]
    fn test_profile_invariant_after_every_insertion() {
        for seed in 0..20 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let kerf = (seed % 4) as f64;
            let mut bin = SkylineBin::new(Rect::new(1220.0, 2440.0), kerf);
            for _ in 0..80 {
                let w = rng.random_range(5..500) as f64;
                let h = rng.random_range(5..500) as f64;
                if place(&mut bin, w, h).is_some() {
                    assert_profile_valid(&bin);
                }
            }
        }
    }

    #[test]
    fn test_profile_invariant_with_fractional_sizes() {
        for seed in 0..40 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut bin = SkylineBin::new(Rect::new(1220.0, 2440.0), 3.2);
            for _ in 0..80 {
                let w = rng.random_range(50..5000) as f64 / 10.0;
                let h = rng.random_range(50..5000) as f64 / 10.0;
                if place(&mut bin, w, h).is_some() {
                    assert_profile_valid(&bin);
                }
            }
        }
    }

    #[test]
    fn test_level_reaching_sheet_edge_ends_exactly_there() {
        let mut bin = SkylineBin::new(Rect::new(1220.0, 2440.0), 3.2);
        let edge = 0.1 + 0.2;
        bin.nodes = vec![
            SkylineNode { x: 0.0, y: 842.4, right: edge },
            SkylineNode { x: edge, y: 0.0, right: 1220.0 },
        ];
        // Piece plus kerf reaches the sheet edge up to rounding.
        let spot = place(&mut bin, 1216.5, 100.0).unwrap();
        assert_eq!((spot.x, spot.y), (edge, 0.0));
        assert!(!spot.rotated);
        assert_eq!(bin.nodes.last().unwrap().right, 1220.0);
        assert_profile_valid(&bin);
    }

    #[test]
    fn test_nearly_equal_heights_merge() {
        let mut bin = SkylineBin::new(Rect::new(1000.0, 1000.0), 0.0);
        bin.nodes = vec![node(0.0, 842.4, 300.0), node(300.0, 0.0, 700.0)];
        // Lands at 0 and tops out a rounding step away from 842.4.
        let h = 842.4000000000001;
        let spot = place(&mut bin, 700.0, h).unwrap();
        assert_eq!((spot.x, spot.y), (300.0, 0.0));
        assert_eq!(bin.nodes.len(), 1);
        assert_eq!(bin.nodes[0].right, 1000.0);
        assert_eq!(bin.nodes[0].y, h);
    }

    #[test]
    fn test_equal_landings_keep_lowest_node_index() {
        let mut bin = SkylineBin::new(Rect::new(1000.0, 1000.0), 0.0);
        bin.nodes = vec![
            node(0.0, 300.0, 200.0),
            node(200.0, 100.0, 300.0),
            node(500.0, 400.0, 100.0),
            node(600.0, 100.0, 400.0),
        ];
        // Starting on node 1 or node 3 both land at 100.
        let piece = Rect::new(250.0, 50.0);
        assert_eq!(bin.landing_y(1, piece), Some(100.0));
        assert_eq!(bin.landing_y(3, piece), Some(100.0));
        let landing = bin.find_best(piece, false).unwrap();
        assert_eq!(landing.node_idx, 1);
        assert_eq!((landing.x, landing.y), (200.0, 100.0));
    }

    #[test]
    fn test_packer_keeps_kerf_between_neighbours() {
        let mut packer = SkylinePacker::<usize>::new(1220.0, 2440.0, 3.0).unwrap();
        let sizes = [(800.0, 600.0), (400.0, 300.0), (400.0, 300.0), (600.0, 400.0), (300.0, 200.0)];
        for (i, &(w, h)) in sizes.iter().enumerate() {
            packer.pack(i, w, h).unwrap();
        }
        let placed = all_placements(&packer);
        assert_eq!(packer.sheet_count(), 1);
        assert_in_bounds(packer.stock(), &placed);
        assert_no_overlaps(&placed);
        assert_kerf_clearance(packer.kerf(), &placed);
        assert_profile_valid(packer.active_space());
    }
}
