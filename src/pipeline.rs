//! Scrape-then-caption flow as driven by the form UI.
//!
//! Each call runs both steps from scratch; nothing is kept between attempts.

use crate::caption::{CaptionError, CaptionRequest, Captioner, Goal};
use crate::extract::{ExtractionError, Extractor};
use crate::models::PageMetadata;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Extract(#[from] ExtractionError),
    #[error(transparent)]
    Caption(#[from] CaptionError),
}

/// The finished artifact: editable caption plus the lead image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub caption: String,
    pub image: Option<String>,
    pub metadata: PageMetadata,
}

impl PostDraft {
    pub fn edit_caption(&mut self, caption: impl Into<String>) {
        self.caption = caption.into();
    }
}

pub async fn draft_post(
    extractor: &Extractor,
    captioner: &Captioner,
    url: &str,
    goal: Option<&str>,
) -> Result<PostDraft, PipelineError> {
    let metadata = extractor.extract(url).await?;

    let request = CaptionRequest {
        title: metadata.title.clone(),
        description: metadata.description.clone(),
        goal: Goal::resolve(goal),
    };
    let result = captioner.caption(&request).await?;

    Ok(PostDraft {
        caption: result.caption,
        image: metadata.images.first().cloned(),
        metadata,
    })
}
