//! .docx 写出
//!
//! 只生成报告需要的最小 Office Open XML 包：
//! `[Content_Types].xml`、`_rels/.rels`、`word/document.xml`、
//! `word/_rels/document.xml.rels`、`word/styles.xml`。

use std::fs;
use std::io::{Cursor, Seek, Write};
use std::path::Path;

use quick_xml::escape::escape;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ExportError;
use crate::render::report::{Block, ReportDocument, Run};

const WORD_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

/// Normal 样式：西文 Times New Roman，中文微软雅黑
const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Times New Roman" w:hAnsi="Times New Roman" w:eastAsia="Microsoft YaHei" w:cs="Times New Roman"/><w:sz w:val="22"/><w:lang w:val="en-US" w:eastAsia="zh-CN"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="120" w:line="276" w:lineRule="auto"/></w:pPr></w:pPrDefault></w:docDefaults>
<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/><w:rPr><w:rFonts w:ascii="Times New Roman" w:hAnsi="Times New Roman" w:eastAsia="Microsoft YaHei"/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="480" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:color w:val="2F5496"/><w:sz w:val="32"/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="240" w:after="80"/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:color w:val="2F5496"/><w:sz w:val="28"/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="Heading3"><w:name w:val="heading 3"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="200" w:after="60"/><w:outlineLvl w:val="2"/></w:pPr><w:rPr><w:b/><w:color w:val="1F3763"/><w:sz w:val="24"/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="ListBullet"><w:name w:val="List Bullet"/><w:basedOn w:val="Normal"/><w:pPr><w:ind w:left="360" w:hanging="360"/></w:pPr></w:style>
<w:style w:type="table" w:styleId="TableGrid"><w:name w:val="Table Grid"/><w:tblPr><w:tblBorders><w:top w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:left w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:bottom w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:right w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideH w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideV w:val="single" w:sz="4" w:space="0" w:color="auto"/></w:tblBorders><w:tblCellMar><w:left w:w="108" w:type="dxa"/><w:right w:w="108" w:type="dxa"/></w:tblCellMar></w:tblPr></w:style>
</w:styles>"#;

/// A4 版心宽度（twips）
const TEXT_WIDTH_TWIPS: usize = 8306;

const BULLET_GLYPH: &str = "•\t";

/// 写出 .docx 文件
///
/// 先在内存中打包，成功后才写入目标路径；打包失败时已有文件保持原样。
pub fn write_docx(doc: &ReportDocument, path: &Path) -> Result<(), ExportError> {
    let mut buf = Cursor::new(Vec::new());
    write_package(doc, &mut buf)?;
    fs::write(path, buf.into_inner()).map_err(|e| ExportError::io(path.display().to_string(), e))
}

/// 把报告打包写入任意可寻址的输出
pub fn write_package<W: Write + Seek>(doc: &ReportDocument, writer: W) -> Result<(), ExportError> {
    let document_xml = render_document_xml(doc);
    debug!("document.xml 长度: {} 字节", document_xml.len());

    let parts: [(&str, &str); 5] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML),
        ("_rels/.rels", PACKAGE_RELS_XML),
        ("word/document.xml", &document_xml),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML),
        ("word/styles.xml", STYLES_XML),
    ];

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(writer);
    for (name, content) in parts {
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())
            .map_err(|e| ExportError::io(name, e))?;
    }
    zip.finish()?;
    Ok(())
}

/// 生成 word/document.xml
pub fn render_document_xml(doc: &ReportDocument) -> String {
    let mut xml = String::with_capacity(4096);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push('\n');
    xml.push_str(&format!(r#"<w:document xmlns:w="{WORD_NS}"><w:body>"#));

    for block in &doc.blocks {
        match block {
            Block::Heading { level, text } => {
                let level = (*level).clamp(1, 3);
                xml.push_str(&format!(
                    r#"<w:p><w:pPr><w:pStyle w:val="Heading{level}"/></w:pPr>"#
                ));
                push_run(&mut xml, &Run::plain(text.as_str()));
                xml.push_str("</w:p>");
            }
            Block::Paragraph { runs } => {
                xml.push_str("<w:p>");
                for run in runs {
                    push_run(&mut xml, run);
                }
                xml.push_str("</w:p>");
            }
            Block::Bullet { text } => {
                xml.push_str(r#"<w:p><w:pPr><w:pStyle w:val="ListBullet"/></w:pPr>"#);
                push_run(&mut xml, &Run::plain(format!("{BULLET_GLYPH}{text}")));
                xml.push_str("</w:p>");
            }
            Block::Table { rows } => push_table(&mut xml, rows),
            Block::PageBreak => xml.push_str(r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#),
        }
    }

    xml.push_str(
        r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:right="1800" w:bottom="1440" w:left="1800" w:header="851" w:footer="992" w:gutter="0"/></w:sectPr>"#,
    );
    xml.push_str("</w:body></w:document>");
    xml
}

fn push_run(xml: &mut String, run: &Run) {
    xml.push_str("<w:r>");

    let mut props = String::new();
    if run.bold {
        props.push_str("<w:b/>");
    }
    if let Some(color) = run.color {
        props.push_str(&format!(r#"<w:color w:val="{color}"/>"#));
    }
    if let Some(pt) = run.size_pt {
        // w:sz 的单位是半磅
        props.push_str(&format!(r#"<w:sz w:val="{}"/><w:szCs w:val="{}"/>"#, pt * 2, pt * 2));
    }
    if !props.is_empty() {
        xml.push_str("<w:rPr>");
        xml.push_str(&props);
        xml.push_str("</w:rPr>");
    }

    // 文本中的换行转为 <w:br/>
    for (i, line) in run.text.split('\n').enumerate() {
        if i > 0 {
            xml.push_str("<w:br/>");
        }
        xml.push_str(r#"<w:t xml:space="preserve">"#);
        xml.push_str(&escape(line.trim_end_matches('\r')));
        xml.push_str("</w:t>");
    }

    xml.push_str("</w:r>");
}

fn push_table(xml: &mut String, rows: &[Vec<String>]) {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0).max(1);
    let col_width = TEXT_WIDTH_TWIPS / columns;

    xml.push_str(
        r#"<w:tbl><w:tblPr><w:tblStyle w:val="TableGrid"/><w:tblW w:w="0" w:type="auto"/><w:tblLook w:val="04A0"/></w:tblPr><w:tblGrid>"#,
    );
    for _ in 0..columns {
        xml.push_str(&format!(r#"<w:gridCol w:w="{col_width}"/>"#));
    }
    xml.push_str("</w:tblGrid>");

    for row in rows {
        xml.push_str("<w:tr>");
        for cell in row {
            xml.push_str(&format!(
                r#"<w:tc><w:tcPr><w:tcW w:w="{col_width}" w:type="dxa"/></w:tcPr><w:p>"#
            ));
            push_run(xml, &Run::plain(cell.as_str()));
            xml.push_str("</w:p></w:tc>");
        }
        xml.push_str("</w:tr>");
    }
    xml.push_str("</w:tbl>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GradingResult, InputFile, Scores};
    use crate::render::report::build_report;
    use std::io::Read;

    /// 按顺序取出 document.xml 中所有 <w:t> 的文本
    fn document_texts(bytes: &[u8]) -> Vec<String> {
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        let mut xml = Vec::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_end(&mut xml)
            .unwrap();

        let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
        let mut buf = Vec::new();
        let mut out = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Start(e)) if e.local_name().as_ref() == b"t" => {
                    if let Ok(quick_xml::events::Event::Text(te)) = reader.read_event_into(&mut buf)
                    {
                        out.push(te.unescape().unwrap().into_owned());
                    }
                }
                Ok(quick_xml::events::Event::Eof) => break,
                Err(e) => panic!("invalid xml: {e}"),
                _ => {}
            }
            buf.clear();
        }
        out
    }

    fn sample_doc() -> ReportDocument {
        let file = InputFile::new("/scans/essay <1>.png");
        let result = GradingResult {
            recognized_text: Some("Dear Chris,\nI am Li Hua & I write.".to_string()),
            scores: Some(Scores {
                dim1_score: Some(4),
                dim2_score: Some(3),
                dim3_score: Some(4),
                total: Some(11),
            }),
            ..GradingResult::default()
        };
        build_report(&[(&file, &result)])
    }

    #[test]
    fn test_package_contains_required_parts() {
        let mut buf = Vec::new();
        write_package(&sample_doc(), std::io::Cursor::new(&mut buf)).unwrap();

        let archive = zip::ZipArchive::new(std::io::Cursor::new(buf.as_slice())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "word/styles.xml",
        ] {
            assert!(names.contains(&part), "missing {part}");
        }
    }

    #[test]
    fn test_document_xml_contains_headings_and_escaped_text() {
        let mut buf = Vec::new();
        write_package(&sample_doc(), std::io::Cursor::new(&mut buf)).unwrap();

        let texts = document_texts(&buf);
        assert!(texts.contains(&"文件：essay <1>.png".to_string()));
        assert!(texts.contains(&"OCR 识别原文".to_string()));
        assert!(texts.contains(&"评分详情".to_string()));
        assert!(texts.contains(&"满分范文参考".to_string()));
        assert!(texts.contains(&"总分：11/15".to_string()));
        assert!(texts.contains(&"I am Li Hua & I write.".to_string()));
    }

    #[test]
    fn test_run_formatting() {
        let xml = render_document_xml(&ReportDocument {
            blocks: vec![Block::Paragraph {
                runs: vec![Run::plain("总分").bold().color("FF0000").size(14)],
            }],
        });
        assert!(xml.contains(r#"<w:rPr><w:b/><w:color w:val="FF0000"/><w:sz w:val="28"/>"#));
    }

    #[test]
    fn test_styles_set_fonts() {
        assert!(STYLES_XML.contains(r#"w:ascii="Times New Roman""#));
        assert!(STYLES_XML.contains(r#"w:eastAsia="Microsoft YaHei""#));
        assert!(STYLES_XML.contains("Table Grid"));
    }

    #[test]
    fn test_write_docx_replaces_existing_file_with_full_package() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.docx");
        std::fs::write(&path, vec![b'x'; 64 * 1024]).unwrap();

        write_docx(&sample_doc(), &path).unwrap();

        let mut expected = Vec::new();
        write_package(&sample_doc(), std::io::Cursor::new(&mut expected)).unwrap();
        let written = std::fs::read(&path).unwrap();
        assert_eq!(written, expected);
        assert!(document_texts(&written).contains(&"OCR 识别原文".to_string()));
    }

    #[test]
    fn test_write_docx_onto_directory_fails_and_keeps_it() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("report.docx");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep.txt"), b"keep").unwrap();

        let err = write_docx(&sample_doc(), &target).unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
        assert_eq!(std::fs::read(target.join("keep.txt")).unwrap(), b"keep");
    }

    #[test]
    fn test_write_docx_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("report.docx");
        let err = write_docx(&sample_doc(), &path).unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }
}
