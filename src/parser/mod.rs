pub mod anchors;
pub mod items;

/// One checklist entry: a device name and the maintenance operation that
/// closed its group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub device: String,
    pub operation: String,
}

/// Structured form of one source document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    pub month: String,
    pub title: String,
    pub warnings: Vec<String>,
    pub closing: Vec<String>,
    pub items: Vec<Item>,
}

/// Anchor-based pipeline: lines → anchors → sections → items. Any marker that
/// fails to match degrades to an empty default; recovery never fails, an
/// empty input yields an empty sheet.
pub fn recover(lines: &[String]) -> Sheet {
    let anchors = anchors::locate(lines);
    let (start, end) = anchors::item_bounds(lines, &anchors);
    Sheet {
        month: lines.first().cloned().unwrap_or_default(),
        title: anchors::title(lines),
        warnings: anchors::warnings(lines, &anchors),
        closing: anchors::closing(lines, &anchors),
        items: items::segment(&lines[start..end]),
    }
}

// ── Tests ──
