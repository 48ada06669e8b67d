use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::DrawHub;
use crate::models::{Background, ServerEvent};

impl DrawHub {
    /// Replace the diagram background and tell every connection about it
    pub fn set_background(&self, content_type: String, content: Vec<u8>) -> Arc<Background> {
        let background = Background {
            id: Uuid::new_v4().to_string(),
            content_type,
            content,
        };
        let background = self.diagram.set_background(background, |background| {
            self.dispatcher.to_all(ServerEvent::BackgroundUpdated {
                id: background.id.clone(),
            });
        });
        info!(
            "Background {} set ({} bytes)",
            background.id,
            background.content.len()
        );
        background
    }
}
