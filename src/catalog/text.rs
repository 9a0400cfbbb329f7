//! Plain-text extraction from heterogeneous text-bearing elements.
use super::model::UNKNOWN_AUTHOR;
use super::xml::Element;

/// Trimmed text of an optional element.
///
/// Covers every shape a text field takes in OPDS feeds: absent (`""`), bare
/// text, text on an attributed element (`<title type="text">`), and nested
/// markup (`<content type="xhtml"><div>…</div></content>`), which is
/// flattened to its text.
pub fn text(node: Option<&Element>) -> String {
    node.map(|element| element.text_content().trim().to_string())
        .unwrap_or_default()
}

/// Author line for an entry.
///
/// One `<author>` yields its `<name>` (or its bare text when it has no child
/// elements); several are joined with `", "`. Anything else is
/// [`UNKNOWN_AUTHOR`].
pub fn author(entry: &Element) -> String {
    let authors: Vec<&Element> = entry.children_named("author").collect();

    let extracted = match authors.as_slice() {
        [] => String::new(),
        [single] => single_author(single),
        many => many
            .iter()
            .map(|author| text(author.child("name")))
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
    };

    if extracted.is_empty() {
        UNKNOWN_AUTHOR.to_string()
    } else {
        extracted
    }
}

fn single_author(author: &Element) -> String {
    match author.child("name") {
        Some(name) => text(Some(name)),
        None if !author.has_child_elements() => author.own_text().trim().to_string(),
        None => String::new(),
    }
}

/// Summary text, falling back to `<content>`, then to `""`.
pub fn summary(entry: &Element) -> String {
    let summary = text(entry.child("summary"));
    if summary.is_empty() {
        text(entry.child("content"))
    } else {
        summary
    }
}

/// Raw text of an optional element, or `None` when absent or blank.
pub fn optional_text(node: Option<&Element>) -> Option<String> {
    Some(text(node)).filter(|value| !value.is_empty())
}
