//! Marker-substring anchors. The source documents carry no markup for section
//! roles, so fixed phrases and position are the only available signal.

const TITLE_MARKER: &str = "Контрольный лист";
const HEADER_MARKER: &str = "Наименование прибора";
const SIGNATURE_MARKER: &str = "Подпись";
const CLOSING_MARKER: &str = "в целом по окончании работ";
const DEFECTS_MARKER: &str = "Выявленные недостатки";
const RESPONSIBLE_MARKER: &str = "Ответственный";

/// The title only ever appears near the top of the document.
const TITLE_WINDOW: usize = 5;
/// The signature column follows the header row within a few lines.
const SIGNATURE_WINDOW: usize = 6;

/// Signature blocks and boilerplate that sit between the responsible-person
/// line and the column header; never advisory content.
pub const SIGNATURE_NOISE: &[&str] = &[
    "Лица, принимающие участие",
    "Образец подписи",
    "Ответственный за полноту",
    "и точность заполнения КЛ инженер",
];

/// Indices of the structural boundary lines, where found. Duplicated markers
/// resolve to the earliest occurrence.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anchors {
    pub header: Option<usize>,
    pub signature: Option<usize>,
    pub closing: Option<usize>,
    pub defects: Option<usize>,
}

pub fn locate(lines: &[String]) -> Anchors {
    let header = find_containing(lines, HEADER_MARKER);
    let signature = header.and_then(|h| {
        let window = &lines[h..lines.len().min(h + SIGNATURE_WINDOW)];
        find_containing(window, SIGNATURE_MARKER).map(|i| h + i)
    });
    Anchors {
        header,
        signature,
        closing: find_containing(lines, CLOSING_MARKER),
        defects: find_containing(lines, DEFECTS_MARKER),
    }
}

fn find_containing(lines: &[String], marker: &str) -> Option<usize> {
    lines.iter().position(|l| l.contains(marker))
}

/// First title-marker line within the top window, empty when absent.
pub fn title(lines: &[String]) -> String {
    lines
        .iter()
        .take(TITLE_WINDOW)
        .find(|l| l.contains(TITLE_MARKER))
        .cloned()
        .unwrap_or_default()
}

/// Advisory notes preceding the column header. The region starts after the
/// last responsible-person line before the header (or at 0 without one);
/// signature-noise lines are dropped wherever they fall inside it.
pub fn warnings(lines: &[String], anchors: &Anchors) -> Vec<String> {
    let Some(header) = anchors.header else {
        return Vec::new();
    };
    let start = lines[..header]
        .iter()
        .rposition(|l| l.contains(RESPONSIBLE_MARKER))
        .map(|r| r + 1)
        .unwrap_or(0);
    lines[start..header]
        .iter()
        .filter(|l| !SIGNATURE_NOISE.iter().any(|p| l.starts_with(p)))
        .cloned()
        .collect()
}

/// Bounds of the checklist item region: after the signature line (or header,
/// or the start of the document), up to the closing anchor (or deficiencies
/// anchor, or the end). Clamped so the range is never inverted.
pub fn item_bounds(lines: &[String], anchors: &Anchors) -> (usize, usize) {
    let start = anchors
        .signature
        .map(|s| s + 1)
        .or(anchors.header.map(|h| h + 1))
        .unwrap_or(0)
        .min(lines.len());
    let end = anchors
        .closing
        .or(anchors.defects)
        .unwrap_or(lines.len())
        .clamp(start, lines.len());
    (start, end)
}

/// Closing remarks between the closing anchor and the deficiencies block.
/// Both anchors must exist for the region to be well-defined.
pub fn closing(lines: &[String], anchors: &Anchors) -> Vec<String> {
    match (anchors.closing, anchors.defects) {
        (Some(c), Some(d)) if c <= d => lines[c..d].to_vec(),
        _ => Vec::new(),
    }
}

// ── Tests ──
