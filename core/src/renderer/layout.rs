// uranai_core/src/renderer/layout.rs

//! Structured document content, assembled before any bytes are produced.

/// One body section. A section with a `heading` is styled distinctly by the
/// engine; plain sections are body paragraphs.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
  pub heading: Option<String>,
  pub paragraphs: Vec<String>,
}

/// Everything the engine needs to produce the artifact: service header,
/// personalised title, order metadata, sectioned body, footer disclaimer.
#[derive(Debug, Clone)]
pub struct DocumentLayout {
  pub header: String,
  pub title: String,
  pub meta_lines: Vec<String>,
  pub sections: Vec<Section>,
  pub footer_lines: Vec<String>,
}

/// Splits generated fortune text into sections.
///
/// A paragraph whose first line looks like a heading (numbered like
/// `1. 全体運：…`, or marked with `■`/`#`) opens a new section; everything
/// else accumulates into the current one.
pub fn split_sections(content: &str) -> Vec<Section> {
  let mut sections: Vec<Section> = Vec::new();

  for paragraph in content.split("\n\n") {
    let paragraph = paragraph.trim();
    if paragraph.is_empty() {
      continue;
    }

    let mut lines = paragraph.lines();
    let first = lines.next().unwrap_or_default().trim();

    if is_heading(first) {
      let body: Vec<String> =
        lines.map(|l| l.trim().to_string()).filter(|l| !l.is_empty()).collect();
      sections.push(Section { heading: Some(strip_heading_marker(first)), paragraphs: body });
    } else {
      match sections.last_mut() {
        Some(section) if section.heading.is_some() => {
          section.paragraphs.push(paragraph.to_string());
        }
        _ => {
          sections.push(Section { heading: None, paragraphs: vec![paragraph.to_string()] });
        }
      }
    }
  }

  sections
}

fn is_heading(line: &str) -> bool {
  if line.is_empty() || line.chars().count() > 40 {
    return false;
  }
  if line.starts_with('■') || line.starts_with('#') {
    return true;
  }
  // Numbered heading: "1. 仕事運：…" / "2．転機".
  let mut chars = line.chars();
  match (chars.next(), chars.next()) {
    (Some(first), Some(second)) if first.is_ascii_digit() => {
      matches!(second, '.' | '．' | ':' | '：')
    }
    _ => false,
  }
}

fn strip_heading_marker(line: &str) -> String {
  line.trim_start_matches(['■', '#']).trim().to_string()
}
