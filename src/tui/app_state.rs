use ratatui::layout::Rect;

/// Width of the highlight symbol column in front of every row.
pub(super) const HIGHLIGHT_WIDTH: u16 = 2;
/// `[+] ` / `[-] ` / blank, right after the highlight symbol.
pub(super) const EXPAND_WIDTH: u16 = 4;
/// `[x] ` / `[-] ` / `[ ] `.
pub(super) const CHECKBOX_WIDTH: u16 = 4;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub(super) enum AppMode {
    Normal,
    Filtering,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub(super) enum HitRegion {
    Expand,
    Checkbox,
    Label,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub(super) enum Hit {
    Row { index: usize, region: HitRegion },
    /// Inside the list but below the last row.
    Background,
    Outside,
}

/// Where the list was last drawn, so mouse events can be mapped back to rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct ListGeometry {
    /// Inner area of the list block (borders excluded).
    pub area: Rect,
    pub scroll_offset: usize,
    pub row_count: usize,
}

pub(super) fn hit_test(geometry: &ListGeometry, column: u16, row: u16) -> Hit {
    let area = geometry.area;
    if column < area.x || column >= area.right() || row < area.y || row >= area.bottom() {
        return Hit::Outside;
    }
    let index = geometry.scroll_offset + (row - area.y) as usize;
    if index >= geometry.row_count {
        return Hit::Background;
    }
    let offset = column - area.x;
    let region = if offset < HIGHLIGHT_WIDTH {
        HitRegion::Label
    } else if offset < HIGHLIGHT_WIDTH + EXPAND_WIDTH {
        HitRegion::Expand
    } else if offset < HIGHLIGHT_WIDTH + EXPAND_WIDTH + CHECKBOX_WIDTH {
        HitRegion::Checkbox
    } else {
        HitRegion::Label
    };
    Hit::Row { index, region }
}
