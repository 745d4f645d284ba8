use crate::types::{LaidOutPiece, Rect};

const MAX_WIDTH: f64 = 80.0;
const MAX_HEIGHT: f64 = 40.0;

/// Draws one sheet as ASCII art, sheet width across and length down, scaled
/// to fit in 80x40 characters. Pieces are labelled `"{letter} {w}x{h}"`, or
/// just the letter when that does not fit inside the piece.
pub fn render_sheet(stock: Rect, pieces: &[LaidOutPiece]) -> String {
    if !stock.is_valid() {
        return String::new();
    }
    let scale = f64::min(MAX_WIDTH / stock.w, MAX_HEIGHT / stock.h);
    let grid_w = (stock.w * scale).round() as usize;
    let grid_h = (stock.h * scale).round() as usize;

    if grid_w == 0 || grid_h == 0 {
        return String::new();
    }

    let mut grid = vec![vec![' '; grid_w + 1]; grid_h + 1];

    draw_rect(&mut grid, 0, 0, grid_w, grid_h);

    for piece in pieces {
        let p = &piece.placement;
        let sx = (p.x * scale).round() as usize;
        let sy = (p.y * scale).round() as usize;
        let sw = (p.rect.w * scale).round() as usize;
        let sh = (p.rect.h * scale).round() as usize;

        if sw == 0 || sh == 0 {
            continue;
        }

        draw_rect(&mut grid, sx, sy, sw, sh);

        if sw < 2 || sh < 2 {
            continue;
        }
        let full = format!("{} {}", piece.label, p.rect);
        let label = if full.chars().count() < sw {
            full
        } else {
            piece.label.clone()
        };
        let label_chars: Vec<char> = label.chars().collect();

        let cx = sx + sw / 2;
        let cy = sy + sh / 2;
        let start_x = cx.saturating_sub(label_chars.len() / 2);
        for (i, &ch) in label_chars.iter().enumerate() {
            let x = start_x + i;
            if x > sx && x < sx + sw && cy > sy && cy < sy + sh {
                grid[cy][x] = ch;
            }
        }
    }

    let mut result = String::new();
    for row in &grid {
        let line: String = row.iter().collect();
        result.push_str(line.trim_end());
        result.push('\n');
    }
    result
}

fn edge(current: char, line: char) -> char {
    let crossing = if line == '-' { '|' } else { '-' };
    if current == crossing || current == '+' {
        '+'
    } else {
        line
    }
}

fn draw_rect(grid: &mut [Vec<char>], x: usize, y: usize, w: usize, h: usize) {
    let rows = grid.len();
    let cols = if rows > 0 { grid[0].len() } else { return };

    for i in x..=x + w {
        if i >= cols {
            break;
        }
        for row in [y, y + h] {
            if row < rows {
                grid[row][i] = edge(grid[row][i], '-');
            }
        }
    }

    for j in y..=y + h {
        if j >= rows {
            break;
        }
        for col in [x, x + w] {
            if col < cols {
                grid[j][col] = edge(grid[j][col], '|');
            }
        }
    }

    for cx in [x, x + w] {
        for cy in [y, y + h] {
            if cy < rows && cx < cols {
                grid[cy][cx] = '+';
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Placement;

    fn piece(label: &str, x: f64, y: f64, w: f64, h: f64) -> LaidOutPiece {
        LaidOutPiece {
            demand: 0,
            label: label.to_string(),
            placement: Placement {
                sheet_index: 0,
                x,
                y,
                rect: Rect::new(w, h),
                rotated: false,
            },
        }
    }

    #[test]
    fn test_render_single_piece() {
        let stock = Rect::new(100.0, 50.0);
        let output = render_sheet(stock, &[piece("A", 0.0, 0.0, 100.0, 50.0)]);
        assert!(output.contains('+'));
        assert!(output.contains('-'));
        assert!(output.contains('|'));
        assert!(output.contains("A 100x50"));
    }

    #[test]
    fn test_render_fits_in_80_by_40() {
        let stock = Rect::new(1220.0, 2440.0);
        let output = render_sheet(stock, &[piece("A", 0.0, 0.0, 600.0, 400.0)]);
        let lines: Vec<&str> = output.lines().collect();
        assert!(lines.len() <= 41);
        assert!(lines.iter().all(|l| l.chars().count() <= 81));
    }

    #[test]
    fn test_render_two_pieces() {
        let stock = Rect::new(100.0, 100.0);
        let pieces = [
            piece("A", 0.0, 0.0, 50.0, 100.0),
            piece("A", 50.0, 0.0, 50.0, 100.0),
        ];
        let output = render_sheet(stock, &pieces);
        assert!(output.contains("A 50x100"));
    }

    #[test]
    fn test_narrow_piece_shows_letter_only() {
        let stock = Rect::new(1000.0, 1000.0);
        let output = render_sheet(stock, &[piece("B", 0.0, 0.0, 100.0, 1000.0)]);
        assert!(output.contains('B'));
        assert!(!output.contains("100x1000"));
    }

    #[test]
    fn test_render_empty() {
        let stock = Rect::new(100.0, 100.0);
        let output = render_sheet(stock, &[]);
        // Still draws the sheet border
        assert!(output.contains('+'));
    }
}
