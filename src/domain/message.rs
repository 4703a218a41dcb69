use html_escape::{encode_double_quoted_attribute, encode_text};

/// Body used when an entry carries no description at all.
pub const NO_DESCRIPTION: &str = "No description available.";

/// A feed entry ready to be sent: title and link verbatim, body sanitized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    /// Id of the entry this message was built from; becomes the cursor once
    /// the message is delivered.
    pub entry_id: String,
    pub title: String,
    pub link: String,
    pub body: String,
}

impl NotificationMessage {
    /// Renders the HTML-formatted text handed to the transport.
    ///
    /// ```text
    /// <b>title</b>
    /// <a href="link">link</a>
    ///
    /// body
    /// ```
    pub fn render(&self) -> String {
        let mut text = format!("<b>{}</b>\n", encode_text(&self.title));
        if !self.link.is_empty() {
            text.push_str(&format!(
                "<a href=\"{}\">{}</a>\n",
                encode_double_quoted_attribute(&self.link),
                encode_text(&self.link)
            ));
        }
        text.push('\n');
        text.push_str(&self.body);
        text
    }
}
