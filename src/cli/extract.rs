use std::path::Path;

use anyhow::{Context, Result};

use crate::core::AppConfig;
use crate::pdf::extractor_for;

pub async fn run(path: &Path) -> Result<()> {
    let config = AppConfig::default();
    let extractor = extractor_for(config.extractor_url.as_deref());

    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let text = extractor.extract(bytes).await?;
    print!("{}", text);

    Ok(())
}
