use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const META_FILE: &str = "checklists_meta.json";
pub const ITEMS_FILE: &str = "checklist_items.csv";

/// One sheet's metadata, keyed by the source document's file stem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRecord {
    pub id: String,
    pub source: String,
    pub month: String,
    pub title: String,
    pub warnings: Vec<String>,
    pub closing: Vec<String>,
}

/// The metadata artifact: all sheets in insertion order, plus an optional
/// engineer roster travelling alongside for form population.
#[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub sheets: Vec<SheetRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub engineers: Vec<String>,
}

/// One denormalized row of the flat item table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRow {
    pub sheet_id: String,
    pub device: String,
    pub operation: String,
}

/// Write both interchange artifacts. Any failure here is fatal for the run;
/// no partial-state recovery is attempted.
pub fn save(dir: &Path, meta: &Meta, items: &[ItemRow]) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create data directory {}", dir.display()))?;

    let meta_path = dir.join(META_FILE);
    let json = serde_json::to_string_pretty(meta)?;
    fs::write(&meta_path, json)
        .with_context(|| format!("Failed to write {}", meta_path.display()))?;

    let items_path = dir.join(ITEMS_FILE);
    let mut writer = csv::Writer::from_path(&items_path)
        .with_context(|| format!("Failed to write {}", items_path.display()))?;
    for row in items {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read both interchange artifacts back, preserving order.
pub fn load(dir: &Path) -> Result<(Meta, Vec<ItemRow>)> {
    let meta_path = dir.join(META_FILE);
    let json = fs::read_to_string(&meta_path)
        .with_context(|| format!("Failed to read {}", meta_path.display()))?;
    let meta: Meta = serde_json::from_str(&json)
        .with_context(|| format!("Malformed metadata in {}", meta_path.display()))?;

    let items_path = dir.join(ITEMS_FILE);
    let mut reader = csv::Reader::from_path(&items_path)
        .with_context(|| format!("Failed to read {}", items_path.display()))?;
    let items = reader
        .deserialize()
        .collect::<Result<Vec<ItemRow>, _>>()
        .with_context(|| format!("Malformed row in {}", items_path.display()))?;
    Ok((meta, items))
}

/// Group item rows by sheet, preserving row order within each sheet.
pub fn group_items(items: Vec<ItemRow>) -> HashMap<String, Vec<ItemRow>> {
    let mut by_sheet: HashMap<String, Vec<ItemRow>> = HashMap::new();
    for row in items {
        by_sheet.entry(row.sheet_id.clone()).or_default().push(row);
    }
    by_sheet
}

/// Engineer roster file: one name per line, blanks skipped.
pub fn load_roster(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read roster {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_meta() -> Meta {
        Meta {
            sheets: vec![
                SheetRecord {
                    id: "kab_215".to_string(),
                    source: "kab_215.docx".to_string(),
                    month: "март 2024 г.".to_string(),
                    title: "Контрольный лист ТО-1".to_string(),
                    warnings: vec!["Внимание: обесточить оборудование".to_string()],
                    closing: vec!["в целом по окончании работ исправно".to_string()],
                },
                SheetRecord {
                    id: "kab_101".to_string(),
                    source: "kab_101.docx".to_string(),
                    month: String::new(),
                    title: String::new(),
                    warnings: vec![],
                    closing: vec![],
                },
            ],
            engineers: vec!["Ефремов Евгений Олегович".to_string()],
        }
    }

    fn sample_items() -> Vec<ItemRow> {
        vec![
            ItemRow {
                sheet_id: "kab_215".to_string(),
                device: "Монитор №3 Клавиатура".to_string(),
                operation: "Проверка работоспособности".to_string(),
            },
            ItemRow {
                sheet_id: "kab_215".to_string(),
                device: "Системный блок".to_string(),
                operation: "Продуть вентилятор".to_string(),
            },
            ItemRow {
                sheet_id: "kab_101".to_string(),
                device: "Проектор".to_string(),
                operation: "Очистка объектива".to_string(),
            },
        ]
    }

    #[test]
    fn round_trip_preserves_fields_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let meta = sample_meta();
        let items = sample_items();
        save(dir.path(), &meta, &items).unwrap();
        let (meta2, items2) = load(dir.path()).unwrap();
        assert_eq!(meta, meta2);
        assert_eq!(items, items2);
    }

    #[test]
    fn cyrillic_text_survives_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        save(dir.path(), &sample_meta(), &sample_items()).unwrap();
        let raw = fs::read_to_string(dir.path().join(META_FILE)).unwrap();
        // Stored as UTF-8 text, not unicode escapes.
        assert!(raw.contains("Контрольный лист ТО-1"));
        let csv_raw = fs::read_to_string(dir.path().join(ITEMS_FILE)).unwrap();
        assert!(csv_raw.starts_with("sheet_id,device,operation"));
        assert!(csv_raw.contains("Монитор №3 Клавиатура"));
    }

    #[test]
    fn empty_engineers_omitted_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let meta = Meta {
            engineers: vec![],
            ..sample_meta()
        };
        save(dir.path(), &meta, &[]).unwrap();
        let raw = fs::read_to_string(dir.path().join(META_FILE)).unwrap();
        assert!(!raw.contains("engineers"));
        let (meta2, items2) = load(dir.path()).unwrap();
        assert!(meta2.engineers.is_empty());
        assert!(items2.is_empty());
    }

    #[test]
    fn grouping_preserves_row_order_per_sheet() {
        let grouped = group_items(sample_items());
        let ops: Vec<&str> = grouped["kab_215"]
            .iter()
            .map(|r| r.operation.as_str())
            .collect();
        assert_eq!(
            ops,
            vec!["Проверка работоспособности", "Продуть вентилятор"]
        );
        assert_eq!(grouped["kab_101"].len(), 1);
    }

    #[test]
    fn load_fails_on_missing_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(dir.path()).is_err());
    }

    #[test]
    fn roster_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.txt");
        fs::write(&path, "Иванов Иван Иванович\n\n  Петров Пётр Петрович  \n").unwrap();
        let roster = load_roster(&path).unwrap();
        assert_eq!(
            roster,
            vec!["Иванов Иван Иванович", "Петров Пётр Петрович"]
        );
    }
}
