use anyhow::Result;
use chrono::{Datelike, NaiveDate};

use crate::store::{ItemRow, Meta, SheetRecord};

/// Fallback roster when the metadata carries no engineers.
pub const DEFAULT_ENGINEERS: &[&str] = &[
    "Ефремов Евгений Олегович, инженер по обслуживанию ИТ-оборудования, систем освещения и мультимедийного оборудования",
];

const RU_MONTHS: [&str; 12] = [
    "январь",
    "февраль",
    "март",
    "апрель",
    "май",
    "июнь",
    "июль",
    "август",
    "сентябрь",
    "октябрь",
    "ноябрь",
    "декабрь",
];

/// "март 2024 г." style label for the sheet header.
pub fn month_label(date: NaiveDate) -> String {
    format!("{} {} г.", RU_MONTHS[date.month0() as usize], date.year())
}

pub fn current_month_label() -> String {
    month_label(chrono::Local::now().date_naive())
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn paragraphs(lines: &[String]) -> String {
    lines
        .iter()
        .filter(|l| !l.is_empty())
        .map(|l| format!("  <p>{}</p>", escape(l)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn checked_rows(items: &[ItemRow]) -> String {
    items
        .iter()
        .map(|item| {
            format!(
                "    <tr>\n      <td class=\"check-col\">&#x2611;</td>\n      <td>{}</td>\n      <td>{}</td>\n    </tr>",
                escape(&item.device),
                escape(&item.operation)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn participants(engineers: &[String]) -> String {
    let roster: Vec<String> = if engineers.is_empty() {
        DEFAULT_ENGINEERS.iter().map(|e| e.to_string()).collect()
    } else {
        engineers.to_vec()
    };
    roster
        .iter()
        .map(|e| format!("  <div>{}</div>", escape(e)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One statically-checked printable sheet. The month label is supplied by the
/// caller: regenerated sheets are stamped with the current month, the
/// recovered month stays advisory in the metadata.
pub fn render_static(
    record: &SheetRecord,
    items: &[ItemRow],
    month: &str,
    engineers: &[String],
) -> String {
    let title = if record.title.is_empty() {
        &record.id
    } else {
        &record.title
    };
    STATIC_TEMPLATE
        .replace("{css}", SHARED_CSS)
        .replace("{rows}", &checked_rows(items))
        .replace("{warnings}", &paragraphs(&record.warnings))
        .replace("{closing}", &paragraphs(&record.closing))
        .replace("{participants}", &participants(engineers))
        .replace("{title}", &escape(title))
        .replace("{month}", &escape(month))
}

/// The combined interactive document: all sheets and items embedded as a JSON
/// payload, with client-side sheet/engineer selection, toggleable checkmarks,
/// free-text deficiency notes, and a print trigger.
pub fn render_interactive(meta: &Meta, items: &[ItemRow], month: &str) -> Result<String> {
    let sheets: Vec<serde_json::Value> = meta
        .sheets
        .iter()
        .map(|s| {
            let rows: Vec<serde_json::Value> = items
                .iter()
                .filter(|r| r.sheet_id == s.id)
                .map(|r| {
                    serde_json::json!({
                        "device": r.device,
                        "operation": r.operation,
                    })
                })
                .collect();
            serde_json::json!({
                "id": s.id,
                "source": s.source,
                "month": s.month,
                "title": s.title,
                "warnings": s.warnings,
                "closing": s.closing,
                "items": rows,
            })
        })
        .collect();
    let engineers: Vec<String> = if meta.engineers.is_empty() {
        DEFAULT_ENGINEERS.iter().map(|e| e.to_string()).collect()
    } else {
        meta.engineers.clone()
    };
    let payload = serde_json::json!({
        "generated": month,
        "engineers": engineers,
        "sheets": sheets,
    });
    // "</" must not terminate the script element early.
    let json = serde_json::to_string(&payload)?.replace("</", "<\\/");
    Ok(INTERACTIVE_TEMPLATE
        .replace("{css}", SHARED_CSS)
        .replace("{payload}", &json))
}

const SHARED_CSS: &str = r#"
:root {
  --paper: #f7f2e9;
  --ink: #1f1a14;
  --muted: #6d6155;
  --accent: #b45d3a;
  --border: #2b241d;
  --line: #c9b9a9;
  --check: #1f1a14;
}
* { box-sizing: border-box; }
body {
  font-family: "PT Serif", "Georgia", serif;
  color: var(--ink);
  margin: 26px 34px;
  background:
    radial-gradient(circle at 12px 12px, rgba(180, 93, 58, 0.08) 1px, transparent 1.5px) 0 0 / 12px 12px,
    linear-gradient(0deg, rgba(0,0,0,0.02), rgba(0,0,0,0.02)),
    var(--paper);
}
.header {
  border: 2px solid var(--border);
  padding: 10px 12px;
  margin-bottom: 12px;
  background: linear-gradient(0deg, rgba(180, 93, 58, 0.08), rgba(180, 93, 58, 0.04));
}
.month { text-align: right; color: var(--muted); font-size: 12px; letter-spacing: 0.2px; }
.title {
  font-weight: 700;
  text-align: center;
  margin: 6px 0 4px;
  font-size: 16px;
}
.subtitle {
  text-align: center;
  color: var(--muted);
  font-size: 12px;
  letter-spacing: 0.4px;
}
.section {
  border: 1px solid var(--line);
  padding: 10px 12px;
  margin: 10px 0;
  background: rgba(255,255,255,0.6);
}
.signature { margin: 6px 0; }
.signature-line { display: inline-block; border-bottom: 1px solid var(--border); min-width: 260px; height: 14px; vertical-align: middle; }
.notes { margin: 8px 0 12px; }
.notes p { margin: 4px 0; }
.checklist { width: 100%; border-collapse: collapse; margin: 8px 0 12px; }
.checklist th {
  text-align: left;
  border-bottom: 2px solid var(--border);
  padding: 8px 8px;
  font-size: 12px;
  text-transform: uppercase;
  letter-spacing: 0.6px;
}
.checklist td {
  border-bottom: 1px solid var(--line);
  padding: 8px 8px;
  vertical-align: top;
}
.check-col { width: 44px; text-align: center; color: var(--check); font-size: 16px; }
.footer { margin-top: 8px; }
.footer p { margin: 4px 0; }
.defects { margin-top: 10px; }
.defects-line { border-bottom: 1px solid var(--border); height: 16px; margin-top: 6px; }
.stamp {
  display: inline-block;
  border: 2px solid var(--accent);
  color: var(--accent);
  padding: 2px 8px;
  font-size: 11px;
  letter-spacing: 0.6px;
  text-transform: uppercase;
}
@media print {
  body { margin: 12mm; }
}
"#;

const STATIC_TEMPLATE: &str = r#"<!doctype html>
<html lang="ru">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>{css}</style>
</head>
<body>
<div class="header">
  <div class="month">{month}</div>
  <div class="title">{title}</div>
  <div class="subtitle">Ежемесячное техническое обслуживание (ТО-1)</div>
</div>

<div class="section">
  <div>Лица, принимающие участие в техническом обслуживании (ФИО, профессия/должность):</div>
{participants}
  <div class="signature"><span class="signature-line"></span> Образец подписи</div>
</div>

<div class="section notes">
{warnings}
</div>

<table class="checklist">
  <thead>
    <tr>
      <th class="check-col">Галочка</th>
      <th>Наименование прибора</th>
      <th>Наименование операции по техническому обслуживанию</th>
    </tr>
  </thead>
  <tbody>
{rows}
  </tbody>
</table>

<div class="section footer">
{closing}
</div>

<div class="defects section">
  <div><span class="stamp">Выявленные недостатки</span></div>
  <div class="defects-line"></div>
  <div class="defects-line"></div>
  <div class="defects-line"></div>
</div>
</body>
</html>
"#;

const INTERACTIVE_TEMPLATE: &str = r#"<!doctype html>
<html lang="ru">
<head>
<meta charset="utf-8">
<title>Контрольные листы ТО-1</title>
<style>{css}
.controls {
  border: 1px solid var(--line);
  padding: 10px 12px;
  margin-bottom: 14px;
  background: rgba(255,255,255,0.75);
  display: flex;
  gap: 16px;
  align-items: center;
  flex-wrap: wrap;
}
.controls label { font-size: 13px; }
.controls select {
  font: inherit;
  font-size: 13px;
  padding: 3px 6px;
  border: 1px solid var(--border);
  background: var(--paper);
}
.controls button {
  font: inherit;
  font-size: 13px;
  padding: 4px 14px;
  border: 1px solid var(--border);
  background: var(--paper);
  cursor: pointer;
}
.check-col { cursor: pointer; user-select: none; }
.defects textarea {
  width: 100%;
  min-height: 64px;
  font: inherit;
  font-size: 13px;
  border: none;
  border-bottom: 1px solid var(--border);
  background: transparent;
  resize: vertical;
  margin-top: 6px;
}
@media print {
  .controls { display: none; }
  .defects textarea { border-bottom: none; }
}
</style>
</head>
<body>
<div class="controls">
  <label>Лист: <select id="sheet-select"></select></label>
  <label>Инженер: <select id="engineer-select"></select></label>
  <button id="print-btn" type="button">Печать</button>
</div>
<div id="sheet-root"></div>
<script>
const DATA = {payload};

const sheetSelect = document.getElementById("sheet-select");
const engineerSelect = document.getElementById("engineer-select");
const root = document.getElementById("sheet-root");

// Per-sheet client state: checkmarks and deficiency notes.
const checks = {};
const notes = {};

function esc(text) {
  const div = document.createElement("div");
  div.textContent = text;
  return div.innerHTML;
}

DATA.sheets.forEach((sheet, i) => {
  const opt = document.createElement("option");
  opt.value = i;
  opt.textContent = sheet.title || sheet.id;
  sheetSelect.appendChild(opt);
  checks[sheet.id] = sheet.items.map(() => true);
  notes[sheet.id] = "";
});

DATA.engineers.forEach((name, i) => {
  const opt = document.createElement("option");
  opt.value = i;
  opt.textContent = name;
  engineerSelect.appendChild(opt);
});

function currentSheet() {
  return DATA.sheets[Number(sheetSelect.value) || 0];
}

function renderSheet() {
  const sheet = currentSheet();
  if (!sheet) {
    root.innerHTML = "<p>Нет данных.</p>";
    return;
  }
  const engineer = DATA.engineers[Number(engineerSelect.value) || 0] || "";
  const month = sheet.month || DATA.generated;
  const rows = sheet.items.map((item, i) => {
    const mark = checks[sheet.id][i] ? "&#x2611;" : "&#x2610;";
    return '<tr><td class="check-col" data-idx="' + i + '">' + mark +
      "</td><td>" + esc(item.device) + "</td><td>" + esc(item.operation) + "</td></tr>";
  }).join("");
  const warnings = sheet.warnings.map(w => "<p>" + esc(w) + "</p>").join("");
  const closing = sheet.closing.map(c => "<p>" + esc(c) + "</p>").join("");

  root.innerHTML =
    '<div class="header">' +
      '<div class="month">' + esc(month) + "</div>" +
      '<div class="title">' + esc(sheet.title || sheet.id) + "</div>" +
      '<div class="subtitle">Ежемесячное техническое обслуживание (ТО-1)</div>' +
    "</div>" +
    '<div class="section">' +
      "<div>Лица, принимающие участие в техническом обслуживании (ФИО, профессия/должность): " + esc(engineer) + "</div>" +
      '<div class="signature"><span class="signature-line"></span> Образец подписи</div>' +
    "</div>" +
    '<div class="section notes">' + warnings + "</div>" +
    '<table class="checklist"><thead><tr>' +
      '<th class="check-col">Галочка</th>' +
      "<th>Наименование прибора</th>" +
      "<th>Наименование операции по техническому обслуживанию</th>" +
    "</tr></thead><tbody>" + rows + "</tbody></table>" +
    '<div class="section footer">' + closing + "</div>" +
    '<div class="defects section">' +
      '<div><span class="stamp">Выявленные недостатки</span></div>' +
      '<textarea id="defects-notes" placeholder="Отсутствуют"></textarea>' +
    "</div>";

  document.getElementById("defects-notes").value = notes[sheet.id];
  document.getElementById("defects-notes").addEventListener("input", (e) => {
    notes[sheet.id] = e.target.value;
  });
  root.querySelectorAll(".check-col[data-idx]").forEach((cell) => {
    cell.addEventListener("click", () => {
      const i = Number(cell.dataset.idx);
      checks[sheet.id][i] = !checks[sheet.id][i];
      cell.innerHTML = checks[sheet.id][i] ? "&#x2611;" : "&#x2610;";
    });
  });
}

sheetSelect.addEventListener("change", renderSheet);
engineerSelect.addEventListener("change", renderSheet);
document.getElementById("print-btn").addEventListener("click", () => window.print());
renderSheet();
</script>
</body>
</html>
"#;

// ── Tests ──
