use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

const DOCUMENT_ENTRY: &str = "word/document.xml";

/// Paragraph texts of a .docx package, in document order. Run texts within a
/// paragraph are concatenated, internal whitespace is collapsed to single
/// spaces, and empty paragraphs are dropped.
pub fn read_paragraphs(path: &Path) -> Result<Vec<String>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("{} is not a valid .docx package", path.display()))?;
    let mut entry = archive
        .by_name(DOCUMENT_ENTRY)
        .with_context(|| format!("{} has no {}", path.display(), DOCUMENT_ENTRY))?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .with_context(|| format!("Failed to read {} from {}", DOCUMENT_ENTRY, path.display()))?;
    parse_paragraphs(&xml)
}

/// Walk the WordprocessingML event stream collecting <w:t> run text per <w:p>.
fn parse_paragraphs(xml: &str) -> Result<Vec<String>> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut in_paragraph = false;
    let mut in_text = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => match e.name().as_ref() {
                b"w:p" => {
                    in_paragraph = true;
                    current.clear();
                }
                b"w:t" if in_paragraph => in_text = true,
                _ => {}
            },
            Ok(quick_xml::events::Event::Text(e)) if in_text => {
                current.push_str(&e.unescape()?);
            }
            Ok(quick_xml::events::Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    in_paragraph = false;
                    let text = WS_RE.replace_all(current.trim(), " ").to_string();
                    if !text.is_empty() {
                        lines.push(text);
                    }
                }
                _ => {}
            },
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }
    Ok(lines)
}

/// All .docx files directly under `dir`, sorted by name. Word's `~$` lock
/// files are skipped.
pub fn collect_docx(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read input directory {}", dir.display()))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("docx"))
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| !n.starts_with("~$"))
        })
        .collect();
    files.sort();
    Ok(files)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_docx(path: &Path, document_xml: &str) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let opt = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        zip.start_file("word/document.xml", opt).unwrap();
        zip.write_all(document_xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }

    const SAMPLE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>март 2024 </w:t></w:r><w:r><w:t>г.</w:t></w:r></w:p>
    <w:p><w:r><w:t xml:space="preserve">  Контрольный   лист ТО-1 </w:t></w:r></w:p>
    <w:p><w:r><w:rPr></w:rPr></w:r></w:p>
    <w:p/>
    <w:p><w:r><w:t>Монитор №3</w:t></w:r></w:p>
  </w:body>
</w:document>"#;

    #[test]
    fn parses_runs_and_normalizes_whitespace() {
        let lines = parse_paragraphs(SAMPLE_XML).unwrap();
        assert_eq!(
            lines,
            vec!["март 2024 г.", "Контрольный лист ТО-1", "Монитор №3"]
        );
    }

    #[test]
    fn reads_paragraphs_from_package() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.docx");
        write_docx(&path, SAMPLE_XML);
        let lines = read_paragraphs(&path).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "март 2024 г.");
    }

    #[test]
    fn rejects_non_zip_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.docx");
        std::fs::write(&path, b"not a zip").unwrap();
        assert!(read_paragraphs(&path).is_err());
    }

    #[test]
    fn rejects_package_without_document_xml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.docx");
        let file = File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let opt = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        zip.start_file("word/other.xml", opt).unwrap();
        zip.write_all(b"<x/>").unwrap();
        zip.finish().unwrap();
        assert!(read_paragraphs(&path).is_err());
    }

    #[test]
    fn collects_sorted_docx_skipping_lock_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.docx", "a.docx", "~$a.docx", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        let files = collect_docx(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.docx", "b.docx"]);
    }
}
