// uranai_core/src/renderer/mod.rs

//! Document rendering: fortune text in, durable artifact path out.

pub mod layout;
pub mod pdf;

pub use layout::{DocumentLayout, Section};
pub use pdf::{DocumentEngine, PdfEngine};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Utc};
use tracing::{debug, instrument};

use crate::error::{UranaiError, UranaiResult};

const SERVICE_HEADER: &str = "AI占いサービス";
const FOOTER_DISCLAIMER: &str = "このAI占い結果は、あくまでも参考情報としてお楽しみください。";
const FOOTER_COPYRIGHT: &str = "©︎ AI占いサービス";

pub struct DocumentRenderer {
  engine: Arc<dyn DocumentEngine>,
  output_dir: PathBuf,
  render_timeout: Duration,
}

impl DocumentRenderer {
  pub fn new(engine: Arc<dyn DocumentEngine>, output_dir: impl Into<PathBuf>, render_timeout: Duration) -> Self {
    DocumentRenderer { engine, output_dir: output_dir.into(), render_timeout }
  }

  pub fn output_dir(&self) -> &Path {
    &self.output_dir
  }

  /// Renders the artifact for one order and returns its path.
  ///
  /// The file name carries a millisecond timestamp, so retries (and racing
  /// concurrent renders) each write a distinct path; the order record decides
  /// afterwards which path wins. Bytes go to a temp file first and are
  /// renamed only on success, so a failed render never leaves a partial file
  /// under a publishable name.
  #[instrument(name = "DocumentRenderer::render", skip_all, fields(order_id = %order_id), err(Display))]
  pub async fn render(
    &self,
    order_id: &str,
    content: &str,
    customer_name: &str,
    product_name: Option<&str>,
  ) -> UranaiResult<PathBuf> {
    let layout = self.build_layout(order_id, content, customer_name, product_name);

    let bytes = match tokio::time::timeout(self.render_timeout, self.engine.render(&layout)).await {
      Ok(Ok(bytes)) => bytes,
      Ok(Err(err)) => return Err(UranaiError::Render { source: err.context("document engine failed") }),
      Err(_) => {
        return Err(UranaiError::Render {
          source: anyhow::anyhow!("document engine timed out after {:?}", self.render_timeout),
        });
      }
    };

    tokio::fs::create_dir_all(&self.output_dir)
      .await
      .map_err(|err| UranaiError::Render { source: anyhow::Error::new(err).context("creating output directory") })?;

    let file_name = format!("fortune_{}_{}.pdf", order_id, Utc::now().timestamp_micros());
    let path = self.output_dir.join(&file_name);
    let tmp = self.output_dir.join(format!("{}.tmp", file_name));

    let finalize = async {
      tokio::fs::write(&tmp, &bytes).await?;
      tokio::fs::rename(&tmp, &path).await?;
      Ok::<_, std::io::Error>(())
    };
    finalize
      .await
      .map_err(|err| UranaiError::Render { source: anyhow::Error::new(err).context("finalizing artifact file") })?;

    debug!(path = %path.display(), bytes = bytes.len(), "artifact rendered");
    Ok(path)
  }

  fn build_layout(
    &self,
    order_id: &str,
    content: &str,
    customer_name: &str,
    product_name: Option<&str>,
  ) -> DocumentLayout {
    let today = Utc::now();
    let mut meta_lines = vec![
      format!("鑑定日: {}年{}月{}日", today.year(), today.month(), today.day()),
      format!("注文番号: {}", order_id),
    ];
    if let Some(product) = product_name {
      meta_lines.push(format!("商品: {}", product));
    }

    DocumentLayout {
      header: SERVICE_HEADER.to_string(),
      title: format!("{}様の占い結果", customer_name),
      meta_lines,
      sections: layout::split_sections(content),
      footer_lines: vec![FOOTER_DISCLAIMER.to_string(), FOOTER_COPYRIGHT.to_string()],
    }
  }
}
