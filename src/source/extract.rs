//! HTML text extraction

use scraper::{ElementRef, Html, Selector};

/// Extract readable text from an HTML page.
///
/// With a container selector, the paragraphs inside the first matching
/// container are joined line by line. Without one, or when the container is
/// missing, common content containers are tried before falling back to the
/// whole `<body>`.
pub fn extract_text(html: &str, container: Option<&str>, max_chars: usize) -> String {
    let document = Html::parse_document(html);

    if let Some(selector_str) = container {
        match Selector::parse(selector_str) {
            Ok(selector) => {
                if let Some(element) = document.select(&selector).next() {
                    let text = paragraphs(&element);
                    if !text.is_empty() {
                        return truncate_content(&text, max_chars);
                    }
                }
                tracing::debug!("Container {:?} not found, using fallback", selector_str);
            }
            Err(_) => tracing::warn!("Invalid content selector {:?}", selector_str),
        }
    }

    let selectors = ["article", "main", "[role='main']", "#content", ".content"];
    for selector_str in selectors {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(element) = document.select(&selector).next() {
                let cleaned = clean_text(&element_text(&element));
                if cleaned.len() > 200 {
                    return truncate_content(&cleaned, max_chars);
                }
            }
        }
    }

    body_text(&document, max_chars)
}

/// Non-empty `<p>` texts inside an element, one per line
fn paragraphs(element: &ElementRef) -> String {
    let Ok(p) = Selector::parse("p") else {
        return String::new();
    };
    element
        .select(&p)
        .map(|para| clean_text(&element_text(&para)))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect::<Vec<_>>().join(" ")
}

fn body_text(document: &Html, max_chars: usize) -> String {
    let Ok(body) = Selector::parse("body") else {
        return String::new();
    };
    let Ok(noise) = Selector::parse("script, style, noscript, nav, footer, header") else {
        return String::new();
    };

    match document.select(&body).next() {
        Some(body) => {
            // Skip text nodes that live under noise elements
            let noisy: Vec<_> = body.select(&noise).map(|e| e.id()).collect();
            let text = body
                .descendants()
                .filter_map(|node| node.value().as_text().map(|t| (node, t)))
                .filter(|(node, _)| !node.ancestors().any(|a| noisy.contains(&a.id())))
                .map(|(_, t)| String::from(&**t))
                .collect::<Vec<_>>()
                .join(" ");
            truncate_content(&clean_text(&text), max_chars)
        }
        None => String::new(),
    }
}

/// Collapse whitespace runs into single spaces
fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max_chars` characters, preferring a word boundary
pub fn truncate_content(text: &str, max_chars: usize) -> String {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };

    let truncated = &text[..cut];
    match truncated.rfind(char::is_whitespace) {
        Some(last_space) if last_space > 0 => format!("{}...", &truncated[..last_space]),
        _ => format!("{}...", truncated),
    }
}
