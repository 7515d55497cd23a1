//! Message domain types and body extraction.
//!
//! A raw RFC 5322 message is reduced to a [`DecodedMessage`]: a decoded
//! subject line and a body that can be handed to a browser as-is.
//! Decoding never fails; malformed input degrades to placeholder content.

use mailparse::{DispositionType, MailHeaderMap, ParsedMail};
use serde::{Deserialize, Serialize};

use super::Uid;

/// Body rendered when a message has neither an HTML nor a plain-text part.
pub const EMPTY_BODY_HTML: &str = "<html><body>(No body content)</body></html>";

/// A message located by a mailbox search, once its subject is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    /// Server-assigned UID.
    pub uid: Uid,
    /// Decoded subject line.
    pub subject: String,
}

/// Subject and printable body extracted from a raw message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMessage {
    /// Decoded, trimmed subject line.
    pub subject: String,
    /// HTML ready to be written to an artifact.
    pub body_html: String,
}

impl DecodedMessage {
    /// Decodes a raw message.
    ///
    /// Encoded-word subjects are decoded by `mailparse`, which substitutes
    /// replacement characters for undecodable bytes. If the MIME structure
    /// cannot be parsed at all, the headers are still tried for a subject
    /// and the body falls back to [`EMPTY_BODY_HTML`].
    pub fn parse(raw: &[u8]) -> Self {
        match mailparse::parse_mail(raw) {
            Ok(mail) => Self {
                subject: decode_subject(&mail),
                body_html: best_body(&mail),
            },
            Err(e) => {
                tracing::debug!(error = %e, "MIME parse failed, using header-only decode");
                let subject = mailparse::parse_headers(raw)
                    .ok()
                    .and_then(|(headers, _)| headers.get_first_value("Subject"))
                    .map(|s| s.trim().to_string())
                    .unwrap_or_default();
                Self {
                    subject,
                    body_html: EMPTY_BODY_HTML.to_string(),
                }
            }
        }
    }

    /// Returns whether this message's subject starts with `prefix`.
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        subject_matches_prefix(&self.subject, prefix)
    }
}

/// Case-insensitive "starts with" on the trimmed subject and trimmed prefix.
///
/// `"Re: [PRINT] Order"` does not match `"[PRINT]"`: forwarded and replied
/// copies of an order must not be printed twice.
pub fn subject_matches_prefix(subject: &str, prefix: &str) -> bool {
    let subject = subject.trim().to_uppercase();
    let prefix = prefix.trim().to_uppercase();
    subject.starts_with(&prefix)
}

/// Escapes the characters that would otherwise be interpreted as markup.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wraps plain text in a minimal HTML document, preserving line breaks.
pub fn plain_text_shell(text: &str) -> String {
    format!("<html><body><pre>{}</pre></body></html>", escape_html(text))
}

fn decode_subject(mail: &ParsedMail<'_>) -> String {
    mail.headers
        .get_first_value("Subject")
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn is_multipart(part: &ParsedMail<'_>) -> bool {
    part.ctype.mimetype.to_lowercase().starts_with("multipart/")
}

fn best_body(mail: &ParsedMail<'_>) -> String {
    let mut html = None;
    let mut plain = None;
    collect_text_parts(mail, &mut html, &mut plain);

    match (html, plain) {
        (Some(html), _) if !html.is_empty() => html,
        (_, Some(plain)) if !plain.is_empty() => plain_text_shell(&plain),
        _ => EMPTY_BODY_HTML.to_string(),
    }
}

/// Depth-first walk keeping the first `text/html` and first `text/plain` leaf.
///
/// Attachment disposition only excludes leaves found inside a multipart
/// container; a single-part message is used whatever its disposition, and
/// containers are always descended into.
fn collect_text_parts(part: &ParsedMail<'_>, html: &mut Option<String>, plain: &mut Option<String>) {
    if is_multipart(part) {
        for sub in &part.subparts {
            if !is_multipart(sub)
                && sub.get_content_disposition().disposition == DispositionType::Attachment
            {
                continue;
            }
            collect_text_parts(sub, html, plain);
        }
        return;
    }

    let mimetype = part.ctype.mimetype.to_lowercase();
    let slot = match mimetype.as_str() {
        "text/html" => html,
        "text/plain" => plain,
        _ => return,
    };
    if slot.is_some() {
        return;
    }

    match part.get_body() {
        Ok(body) => *slot = Some(body),
        Err(e) => tracing::debug!(mimetype = %mimetype, error = %e, "skipping undecodable part"),
    }
}

/// What happened to a message the orchestrator finished with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOutcome {
    /// Sent to the engine in silent mode.
    AutoPrinted,
    /// Engine launched with its print dialog for the operator.
    DialogOpened,
    /// Subject did not start with the prefix; recorded without printing.
    Skipped,
}

impl JobOutcome {
    /// Short human-readable label for status displays.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AutoPrinted => "Auto-printed",
            Self::DialogOpened => "Print dialog opened",
            Self::Skipped => "Skipped (prefix mismatch)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MULTIPART: &str = "From: shop@example.com\r\n\
Subject: [PRINT] Order #123\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/alternative; boundary=\"b1\"\r\n\
\r\n\
--b1\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Plain order\r\n\
--b1\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<html><body><h1>Order #123</h1></body></html>\r\n\
--b1--\r\n";

    #[test]
    fn prefix_match_is_anchored_and_case_insensitive() {
        assert!(subject_matches_prefix("[PRINT] Order #123", "[PRINT]"));
        assert!(subject_matches_prefix("  [print] order #123", " [PRINT] "));
        assert!(!subject_matches_prefix("Re: [PRINT] Order #123", "[PRINT]"));
        assert!(!subject_matches_prefix("", "[PRINT]"));
    }

    #[test]
    fn html_part_is_selected_verbatim() {
        let decoded = DecodedMessage::parse(MULTIPART.as_bytes());
        assert_eq!(decoded.subject, "[PRINT] Order #123");
        assert!(decoded
            .body_html
            .starts_with("<html><body><h1>Order #123</h1></body></html>"));
        assert!(!decoded.body_html.contains("<pre>"));
    }

    #[test]
    fn plain_text_is_escaped_into_shell() {
        let raw = "Subject: [PRINT] Plain\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Hello\n<world>";
        let decoded = DecodedMessage::parse(raw.as_bytes());
        assert!(decoded.body_html.starts_with("<html><body><pre>"));
        assert!(decoded.body_html.contains("Hello"));
        assert!(decoded.body_html.contains("&lt;world&gt;"));
        assert!(decoded.body_html.ends_with("</pre></body></html>"));
    }

    #[test]
    fn attachments_are_ignored() {
        let raw = "Subject: [PRINT] With attachment\r\n\
Content-Type: multipart/mixed; boundary=\"m\"\r\n\
\r\n\
--m\r\n\
Content-Type: text/html\r\n\
Content-Disposition: attachment; filename=\"invoice.html\"\r\n\
\r\n\
<p>attached</p>\r\n\
--m\r\n\
Content-Type: text/plain\r\n\
\r\n\
inline text\r\n\
--m--\r\n";
        let decoded = DecodedMessage::parse(raw.as_bytes());
        assert!(!decoded.body_html.contains("attached"));
        assert!(decoded.body_html.contains("inline text"));
    }

    #[test]
    fn single_part_attachment_is_still_printed() {
        let raw = "Subject: [PRINT] x\r\n\
Content-Type: text/html\r\n\
Content-Disposition: attachment; filename=order.html\r\n\
\r\n\
<p>order</p>";
        let decoded = DecodedMessage::parse(raw.as_bytes());
        assert_eq!(decoded.body_html, "<p>order</p>");
    }

    #[test]
    fn container_marked_attachment_is_descended_into() {
        let raw = "Subject: [PRINT] forwarded\r\n\
Content-Type: multipart/mixed; boundary=\"outer\"\r\n\
\r\n\
--outer\r\n\
Content-Type: multipart/alternative; boundary=\"inner\"\r\n\
Content-Disposition: attachment\r\n\
\r\n\
--inner\r\n\
Content-Type: text/html\r\n\
\r\n\
<b>inside</b>\r\n\
--inner--\r\n\
--outer--\r\n";
        let decoded = DecodedMessage::parse(raw.as_bytes());
        assert!(decoded.body_html.contains("<b>inside</b>"));
    }

    #[test]
    fn nested_multipart_is_walked_depth_first() {
        let raw = "Subject: nested\r\n\
Content-Type: multipart/mixed; boundary=\"outer\"\r\n\
\r\n\
--outer\r\n\
Content-Type: multipart/alternative; boundary=\"inner\"\r\n\
\r\n\
--inner\r\n\
Content-Type: text/html\r\n\
\r\n\
<b>first</b>\r\n\
--inner--\r\n\
--outer\r\n\
Content-Type: text/html\r\n\
\r\n\
<b>second</b>\r\n\
--outer--\r\n";
        let decoded = DecodedMessage::parse(raw.as_bytes());
        assert!(decoded.body_html.contains("first"));
        assert!(!decoded.body_html.contains("second"));
    }

    #[test]
    fn no_text_parts_yields_placeholder() {
        let raw = "Subject: image only\r\n\
Content-Type: image/png\r\n\
\r\n\
xyz";
        let decoded = DecodedMessage::parse(raw.as_bytes());
        assert_eq!(decoded.body_html, EMPTY_BODY_HTML);
    }

    #[test]
    fn encoded_word_subject_is_decoded() {
        let raw = "Subject: =?UTF-8?B?W1BSSU5UXSBCZXN0ZWxsdW5n?= =?UTF-8?Q?_f=C3=BCr_Anna?=\r\n\
Content-Type: text/plain\r\n\
\r\n\
body";
        let decoded = DecodedMessage::parse(raw.as_bytes());
        assert!(decoded.subject.starts_with("[PRINT] Bestellung"));
        assert!(decoded.subject.ends_with("für Anna"));
        assert!(decoded.matches_prefix("[print]"));
    }

    #[test]
    fn escape_html_handles_ampersand_first() {
        assert_eq!(escape_html("a & <b>"), "a &amp; &lt;b&gt;");
    }

    #[test]
    fn outcome_serialization() {
        let json = serde_json::to_string(&JobOutcome::AutoPrinted).unwrap();
        assert_eq!(json, "\"auto_printed\"");
    }
}
