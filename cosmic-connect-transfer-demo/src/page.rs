//! HTML page holding every rendered frame of the chat log

use anyhow::Context;
use std::path::Path;

const STYLE: &str = "\
body { font-family: sans-serif; max-width: 40em; margin: 1em auto; }
h2 { font-size: 0.9em; color: #666; }
div.silver { background-color: #e0e0e0; padding: 4px; }
div.red { background-color: #f4c7c3; padding: 4px; }
div.green { background-color: #c8e6c9; padding: 4px; }
div.button img { display: block; }
";

/// One captured chat log state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub caption: String,
    pub markup: String,
}

/// Frames captured while the transfer ran
#[derive(Debug, Default)]
pub struct FrameLog {
    frames: Vec<Frame>,
}

impl FrameLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capture(&mut self, caption: impl Into<String>, markup: String) {
        self.frames.push(Frame {
            caption: caption.into(),
            markup,
        });
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn to_html(&self, title: &str) -> String {
        let mut html = format!(
            "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">\n<title>{}</title>\n<style>\n{}</style></head><body>\n",
            title, STYLE
        );
        for (index, frame) in self.frames.iter().enumerate() {
            html.push_str(&format!("<h2>{}. {}</h2>\n", index + 1, frame.caption));
            html.push_str(&frame.markup);
        }
        html.push_str("</body></html>\n");
        html
    }

    pub fn write_to(&self, path: &Path, title: &str) -> anyhow::Result<()> {
        std::fs::write(path, self.to_html(title))
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}
