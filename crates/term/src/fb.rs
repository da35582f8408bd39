//! Character framebuffer the board is drawn into before it hits the terminal.

/// 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellStyle {
    pub fg: Rgb,
    pub bold: bool,
    pub dim: bool,
}

impl CellStyle {
    pub const PLAIN: CellStyle = CellStyle {
        fg: Rgb::new(220, 220, 220),
        bold: false,
        dim: false,
    };

    pub const fn fg(fg: Rgb) -> Self {
        Self {
            fg,
            bold: false,
            dim: false,
        }
    }

    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub const fn dim(mut self) -> Self {
        self.dim = true;
        self
    }
}

impl Default for CellStyle {
    fn default() -> Self {
        Self::PLAIN
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub style: CellStyle,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            style: CellStyle::PLAIN,
        }
    }
}

/// Row-major grid of styled cells. Writes outside the grid are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Resize in place, keeping the allocation when it is large enough.
    pub fn resize(&mut self, width: u16, height: u16) {
        if (self.width, self.height) == (width, height) {
            return;
        }
        self.width = width;
        self.height = height;
        self.cells
            .resize(width as usize * height as usize, Cell::default());
    }

    fn index(&self, x: u16, y: u16) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| y as usize * self.width as usize + x as usize)
    }

    pub fn get(&self, x: u16, y: u16) -> Option<Cell> {
        self.index(x, y).map(|i| self.cells[i])
    }

    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = cell;
        }
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }

    /// Write `s` starting at `(x, y)`, clipped at the right edge. Returns the
    /// column after the last character written.
    pub fn put_str(&mut self, x: u16, y: u16, s: &str, style: CellStyle) -> u16 {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width {
                break;
            }
            self.set(cx, y, Cell { ch, style });
            cx += 1;
        }
        cx
    }

    /// Text of row `y` with trailing blanks removed.
    pub fn row_text(&self, y: u16) -> String {
        let Some(start) = self.index(0, y) else {
            return String::new();
        };
        let row: String = self.cells[start..start + self.width as usize]
            .iter()
            .map(|c| c.ch)
            .collect();
        row.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_str_clips_at_edge() {
        let mut fb = FrameBuffer::new(4, 2);
        let end = fb.put_str(2, 1, "abcd", CellStyle::PLAIN);
        assert_eq!(end, 4);
        assert_eq!(fb.row_text(1), "  ab");
        assert_eq!(fb.row_text(0), "");
    }

    #[test]
    fn test_out_of_bounds_is_ignored() {
        let mut fb = FrameBuffer::new(2, 2);
        fb.set(5, 5, Cell { ch: 'x', style: CellStyle::PLAIN });
        assert_eq!(fb.get(5, 5), None);
        assert!(fb.row_text(9).is_empty());
    }

    #[test]
    fn test_resize_resets_extent() {
        let mut fb = FrameBuffer::new(2, 2);
        fb.resize(3, 1);
        assert_eq!((fb.width(), fb.height()), (3, 1));
        assert_eq!(fb.get(2, 0), Some(Cell::default()));
    }
}
