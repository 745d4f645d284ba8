use serde::{Deserialize, Deserializer, Serialize};

use crate::packer::Algorithm;

/// Width and height of a piece or sheet, in the caller's linear unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    pub fn rotated(&self) -> Self {
        Self {
            w: self.h,
            h: self.w,
        }
    }

    pub fn fits_in(&self, other: &Rect) -> bool {
        self.w <= other.w && self.h <= other.h
    }

    pub fn is_valid(&self) -> bool {
        self.w.is_finite() && self.h.is_finite() && self.w > 0.0 && self.h > 0.0
    }

    /// `"{short}x{long}"` rounded to whole units, used to group equal parts.
    pub fn dimension_key(&self) -> String {
        let short = self.w.min(self.h);
        let long = self.w.max(self.h);
        format!("{short:.0}x{long:.0}")
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}

/// Axis-aligned free region in sheet-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreeRect {
    pub x: f64,
    pub y: f64,
    pub rect: Rect,
}

impl FreeRect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            x,
            y,
            rect: Rect::new(w, h),
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.rect.w
    }

    pub fn top(&self) -> f64 {
        self.y + self.rect.h
    }

    pub fn contains(&self, other: &FreeRect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.top() <= self.top()
    }

    /// Shares positive area with `other`.
    pub fn overlaps(&self, other: &FreeRect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.top()
            && other.y < self.top()
    }
}

/// Where a strategy put a piece on its sheet, before the sheet index is known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spot {
    pub x: f64,
    pub y: f64,
    pub rect: Rect,
    pub rotated: bool,
}

/// Final position of a piece. `rect` holds the placed dimensions, i.e. the
/// nominal ones swapped when `rotated` is set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub sheet_index: usize,
    pub x: f64,
    pub y: f64,
    pub rect: Rect,
    pub rotated: bool,
}

impl Placement {
    pub fn on_sheet(sheet_index: usize, spot: Spot) -> Self {
        Self {
            sheet_index,
            x: spot.x,
            y: spot.y,
            rect: spot.rect,
            rotated: spot.rotated,
        }
    }

    pub fn bounds(&self) -> FreeRect {
        FreeRect {
            x: self.x,
            y: self.y,
            rect: self.rect,
        }
    }
}

/// A part to cut, repeated `qty` times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Demand {
    pub rect: Rect,
    #[serde(deserialize_with = "deserialize_qty")]
    pub qty: u32,
    #[serde(default = "default_true")]
    pub allow_rotate: bool,
    #[serde(default)]
    pub thickness: f64,
    #[serde(default)]
    pub name: Option<String>,
}

impl Demand {
    pub fn new(rect: Rect, qty: u32) -> Self {
        Self {
            rect,
            qty,
            allow_rotate: true,
            thickness: 0.0,
            name: None,
        }
    }
}

/// A placed piece as reported for a job.
#[derive(Debug, Clone, Serialize)]
pub struct LaidOutPiece {
    /// Index into the job's demands.
    pub demand: usize,
    /// Cut-list letter of the piece's dimensions.
    pub label: String,
    pub placement: Placement,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnplacedPiece {
    pub demand: usize,
    pub label: String,
    pub rect: Rect,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CutListEntry {
    pub letter: String,
    pub dimension: String,
    pub quantity: u32,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SheetResult {
    pub index: usize,
    pub placements: Vec<LaidOutPiece>,
    pub waste_area: f64,
}

/// Layout of all pieces sharing one material thickness.
#[derive(Debug, Clone, Serialize)]
pub struct GroupLayout {
    pub thickness: f64,
    pub sheets: Vec<SheetResult>,
    pub unplaced: Vec<UnplacedPiece>,
    pub cut_list: Vec<CutListEntry>,
}

impl GroupLayout {
    pub fn placed_count(&self) -> usize {
        self.sheets.iter().map(|s| s.placements.len()).sum()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Solution {
    pub stock: Rect,
    pub kerf: f64,
    pub algorithm: Algorithm,
    pub groups: Vec<GroupLayout>,
}

impl Solution {
    pub fn sheet_count(&self) -> usize {
        self.groups.iter().map(|g| g.sheets.len()).sum()
    }

    pub fn placed_count(&self) -> usize {
        self.groups.iter().map(GroupLayout::placed_count).sum()
    }

    pub fn unplaced_count(&self) -> usize {
        self.groups.iter().map(|g| g.unplaced.len()).sum()
    }

    pub fn total_waste_percent(&self) -> f64 {
        let total_stock_area = self.stock.area() * self.sheet_count() as f64;
        let total_used: f64 = self
            .groups
            .iter()
            .flat_map(|g| &g.sheets)
            .flat_map(|s| &s.placements)
            .map(|p| p.placement.rect.area())
            .sum();
        if total_stock_area == 0.0 {
            return 0.0;
        }
        (total_stock_area - total_used) / total_stock_area * 100.0
    }
}

pub(crate) fn default_true() -> bool {
    true
}

/// Accepts quantities sent as `3` or `3.0`.
pub fn deserialize_qty<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        return Err(serde::de::Error::custom(format!(
            "expected a non-negative whole number, got {value}"
        )));
    }
    Ok(value as u32)
}
