// uranai_core/src/renderer/pdf.rs

//! Built-in document engine: a minimal paginated PDF writer.
//!
//! Deliberately small: one base font, fixed leading, character-count line
//! wrapping. The `DocumentEngine` trait is the seam for swapping in a real
//! typesetting backend without touching the renderer or the orchestrator.

use async_trait::async_trait;

use crate::renderer::layout::DocumentLayout;

/// Collaborator that turns a layout into artifact bytes.
#[async_trait]
pub trait DocumentEngine: Send + Sync {
  async fn render(&self, layout: &DocumentLayout) -> anyhow::Result<Vec<u8>>;
}

// A4 in points, with the margins the layout assumes.
const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 50.0;
const LEADING: f32 = 16.0;
const BODY_WRAP_CHARS: usize = 46;

#[derive(Debug, Default)]
pub struct PdfEngine;

/// One positioned text line with its font size.
struct Line {
  size: f32,
  text: String,
}

#[async_trait]
impl DocumentEngine for PdfEngine {
  async fn render(&self, layout: &DocumentLayout) -> anyhow::Result<Vec<u8>> {
    let lines = flatten(layout);
    if lines.is_empty() {
      return Err(anyhow::anyhow!("nothing to render"));
    }
    Ok(write_pdf(&paginate(lines)))
  }
}

fn flatten(layout: &DocumentLayout) -> Vec<Line> {
  let mut lines = Vec::new();

  lines.push(Line { size: 22.0, text: layout.header.clone() });
  lines.push(Line { size: 0.0, text: String::new() });
  lines.push(Line { size: 18.0, text: layout.title.clone() });
  lines.push(Line { size: 0.0, text: String::new() });
  for meta in &layout.meta_lines {
    lines.push(Line { size: 10.0, text: meta.clone() });
  }
  lines.push(Line { size: 0.0, text: String::new() });

  for section in &layout.sections {
    if let Some(heading) = &section.heading {
      lines.push(Line { size: 14.0, text: heading.clone() });
    }
    for paragraph in &section.paragraphs {
      for wrapped in wrap(paragraph, BODY_WRAP_CHARS) {
        lines.push(Line { size: 11.0, text: wrapped });
      }
      lines.push(Line { size: 0.0, text: String::new() });
    }
    lines.push(Line { size: 0.0, text: String::new() });
  }

  lines.push(Line { size: 0.0, text: String::new() });
  for footer in &layout.footer_lines {
    lines.push(Line { size: 9.0, text: footer.clone() });
  }

  lines
}

fn wrap(text: &str, max_chars: usize) -> Vec<String> {
  let mut out = Vec::new();
  for raw_line in text.lines() {
    let chars: Vec<char> = raw_line.chars().collect();
    if chars.is_empty() {
      out.push(String::new());
      continue;
    }
    for chunk in chars.chunks(max_chars) {
      out.push(chunk.iter().collect());
    }
  }
  out
}

fn paginate(lines: Vec<Line>) -> Vec<Vec<Line>> {
  let usable = PAGE_HEIGHT - 2.0 * MARGIN;
  let per_page = (usable / LEADING) as usize;

  let mut pages = Vec::new();
  let mut current = Vec::new();
  for line in lines {
    if current.len() >= per_page {
      pages.push(std::mem::take(&mut current));
    }
    current.push(line);
  }
  if !current.is_empty() {
    pages.push(current);
  }
  pages
}

fn escape(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for ch in text.chars() {
    match ch {
      '\\' => out.push_str("\\\\"),
      '(' => out.push_str("\\("),
      ')' => out.push_str("\\)"),
      _ => out.push(ch),
    }
  }
  out
}

fn page_stream(lines: &[Line]) -> String {
  let start_y = PAGE_HEIGHT - MARGIN;
  let mut ops = String::new();
  ops.push_str("BT\n");
  ops.push_str(&format!("{} TL\n", LEADING));
  ops.push_str(&format!("{} {} Td\n", MARGIN, start_y));
  let mut current_size = 0.0_f32;
  for line in lines {
    if !line.text.is_empty() {
      if (line.size - current_size).abs() > f32::EPSILON {
        ops.push_str(&format!("/F1 {} Tf\n", line.size));
        current_size = line.size;
      }
      ops.push_str(&format!("({}) Tj\n", escape(&line.text)));
    }
    ops.push_str("T*\n");
  }
  ops.push_str("ET\n");
  ops
}

/// Assembles the document: catalog, page tree, one base font, then a page
/// object + content stream per page, followed by the xref table.
fn write_pdf(pages: &[Vec<Line>]) -> Vec<u8> {
  let mut buf: Vec<u8> = Vec::new();
  let mut offsets: Vec<usize> = Vec::new();

  buf.extend_from_slice(b"%PDF-1.4\n");

  let page_count = pages.len();
  // Object numbering: 1 catalog, 2 pages, 3 font, then pairs of
  // (page object, content stream) starting at 4.
  let page_obj = |idx: usize| 4 + idx * 2;
  let content_obj = |idx: usize| 5 + idx * 2;

  let push_obj = |buf: &mut Vec<u8>, offsets: &mut Vec<usize>, body: String| {
    offsets.push(buf.len());
    buf.extend_from_slice(body.as_bytes());
  };

  push_obj(&mut buf, &mut offsets, "1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n".to_string());

  let kids: Vec<String> = (0..page_count).map(|i| format!("{} 0 R", page_obj(i))).collect();
  push_obj(
    &mut buf,
    &mut offsets,
    format!("2 0 obj\n<< /Type /Pages /Kids [{}] /Count {} >>\nendobj\n", kids.join(" "), page_count),
  );

  push_obj(
    &mut buf,
    &mut offsets,
    "3 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>\nendobj\n".to_string(),
  );

  for (idx, lines) in pages.iter().enumerate() {
    push_obj(
      &mut buf,
      &mut offsets,
      format!(
        "{} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>\nendobj\n",
        page_obj(idx),
        PAGE_WIDTH,
        PAGE_HEIGHT,
        content_obj(idx)
      ),
    );
    let stream = page_stream(lines);
    push_obj(
      &mut buf,
      &mut offsets,
      format!(
        "{} 0 obj\n<< /Length {} >>\nstream\n{}endstream\nendobj\n",
        content_obj(idx),
        stream.len(),
        stream
      ),
    );
  }

  let xref_offset = buf.len();
  let total_objs = offsets.len() + 1;
  buf.extend_from_slice(format!("xref\n0 {}\n", total_objs).as_bytes());
  buf.extend_from_slice(b"0000000000 65535 f \n");
  for offset in &offsets {
    buf.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
  }
  buf.extend_from_slice(
    format!("trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n", total_objs, xref_offset).as_bytes(),
  );

  buf
}
