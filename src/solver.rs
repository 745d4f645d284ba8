use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::PackerConfig;
use crate::error::ConfigError;
use crate::types::{
    CutListEntry, Demand, GroupLayout, LaidOutPiece, Placement, SheetResult, Solution,
    UnplacedPiece,
};

/// Thicknesses closer than this are treated as the same material.
const THICKNESS_SCALE: f64 = 1e6;

/// Lays out a job: one independent packer per material thickness.
pub struct Solver {
    config: PackerConfig,
    demands: Vec<Demand>,
}

impl Solver {
    pub fn new(config: PackerConfig, demands: Vec<Demand>) -> Self {
        Self { config, demands }
    }

    pub fn solve(&self) -> Result<Solution, ConfigError> {
        let groups = self.thickness_groups();
        let groups = groups
            .into_par_iter()
            .map(|(thickness, members)| self.solve_group(thickness, &members))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Solution {
            stock: self.config.stock(),
            kerf: self.config.kerf,
            algorithm: self.config.algorithm,
            groups,
        })
    }

    /// Demand indices by thickness, thinnest first. Zero-quantity demands are
    /// left out.
    fn thickness_groups(&self) -> Vec<(f64, Vec<usize>)> {
        let mut groups: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (idx, d) in self.demands.iter().enumerate() {
            if d.qty == 0 {
                continue;
            }
            let key = (d.thickness * THICKNESS_SCALE).round() as i64;
            groups.entry(key).or_default().push(idx);
        }
        groups
            .into_iter()
            .map(|(key, members)| (key as f64 / THICKNESS_SCALE, members))
            .collect()
    }

    fn solve_group(&self, thickness: f64, members: &[usize]) -> Result<GroupLayout, ConfigError> {
        let stock = self.config.stock();
        let (cut_list, letters) = self.cut_list(members);
        let label_of = |demand: usize| {
            letters
                .get(&self.demands[demand].rect.dimension_key())
                .cloned()
                .unwrap_or_default()
        };

        let pieces = self.expand_demands(members);
        let mut packer = self.config.algorithm.packer::<usize>(stock, self.config.kerf)?;
        let mut unplaced = Vec::new();

        for demand in pieces {
            let d = &self.demands[demand];
            let allow_rotate = self.config.allow_rotate && d.allow_rotate;
            if let Err(e) = packer.pack_piece(demand, d.rect, allow_rotate) {
                warn!(thickness, demand, "{e}");
                unplaced.push(UnplacedPiece {
                    demand,
                    label: label_of(demand),
                    rect: d.rect,
                    reason: e.to_string(),
                });
            }
        }

        // A failed retry can leave an empty sheet behind; those are not
        // reported and the remaining sheets are renumbered.
        let stock_area = stock.area();
        let sheets: Vec<SheetResult> = packer
            .sheets()
            .iter()
            .filter(|sheet| !sheet.is_empty())
            .enumerate()
            .map(|(index, sheet)| SheetResult {
                index,
                placements: sheet
                    .placements
                    .iter()
                    .map(|p| LaidOutPiece {
                        demand: p.piece,
                        label: label_of(p.piece),
                        placement: Placement {
                            sheet_index: index,
                            ..p.placement
                        },
                    })
                    .collect(),
                waste_area: stock_area - sheet.used_area(),
            })
            .collect();

        info!(
            thickness,
            algorithm = %self.config.algorithm,
            sheets = sheets.len(),
            unplaced = unplaced.len(),
            "packed group"
        );

        Ok(GroupLayout {
            thickness,
            sheets,
            unplaced,
            cut_list,
        })
    }

    /// One demand index per piece, largest area first. Equal areas keep
    /// demand order.
    fn expand_demands(&self, members: &[usize]) -> Vec<usize> {
        let mut pieces = Vec::new();
        for &idx in members {
            for _ in 0..self.demands[idx].qty {
                pieces.push(idx);
            }
        }
        pieces.sort_by(|&a, &b| {
            let area_a = self.demands[a].rect.area();
            let area_b = self.demands[b].rect.area();
            area_b.total_cmp(&area_a)
        });
        pieces
    }

    /// Cut list of a group and the letter assigned to each dimension key.
    fn cut_list(&self, members: &[usize]) -> (Vec<CutListEntry>, BTreeMap<String, String>) {
        let mut by_dimension: BTreeMap<String, (u32, Vec<String>)> = BTreeMap::new();
        for &idx in members {
            let d = &self.demands[idx];
            let entry = by_dimension.entry(d.rect.dimension_key()).or_default();
            entry.0 += d.qty;
            if let Some(name) = &d.name {
                entry.1.push(name.clone());
            }
        }

        let mut letters = BTreeMap::new();
        let entries: Vec<CutListEntry> = by_dimension
            .into_iter()
            .enumerate()
            .map(|(i, (dimension, (quantity, names)))| {
                let letter = letter_for(i);
                letters.insert(dimension.clone(), letter.clone());
                CutListEntry {
                    letter,
                    dimension,
                    quantity,
                    names,
                }
            })
            .collect();
        (entries, letters)
    }
}

/// `A`..`Z`, then `AA`, `AB`, ...
pub fn letter_for(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}
