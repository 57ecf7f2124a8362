use html5ever::tendril::TendrilSink;
use html5ever::{ParseOpts, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// Parse an HTML string (document or fragment) into an rcdom tree and return
/// the document root.
pub fn parse(html: &str) -> Handle {
    let dom = parse_document(RcDom::default(), ParseOpts::default()).one(html);
    dom.document
}

pub fn tag_name(node: &Handle) -> Option<&str> {
    match node.data {
        NodeData::Element { ref name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

pub fn attr(node: &Handle, attr_name: &str) -> Option<String> {
    match node.data {
        NodeData::Element { ref attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| a.name.local.as_ref() == attr_name)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

pub fn has_class(node: &Handle, class: &str) -> bool {
    attr(node, "class")
        .map(|value| value.split_whitespace().any(|c| c == class))
        .unwrap_or(false)
}

pub fn classes(node: &Handle) -> Vec<String> {
    attr(node, "class")
        .map(|value| value.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Concatenated text of all descendant text nodes.
pub fn text_content(node: &Handle) -> String {
    let mut out = String::new();
    collect_text(node, &mut out);
    out
}

fn collect_text(node: &Handle, out: &mut String) {
    if let NodeData::Text { ref contents } = node.data {
        out.push_str(&contents.borrow());
    }
    for child in node.children.borrow().iter() {
        collect_text(child, out);
    }
}

/// Depth-first search for the first element with the given tag.
pub fn find_first(node: &Handle, tag: &str) -> Option<Handle> {
    if tag_name(node) == Some(tag) {
        return Some(node.clone());
    }
    for child in node.children.borrow().iter() {
        if let Some(found) = find_first(child, tag) {
            return Some(found);
        }
    }
    None
}

/// The `<body>` of a parsed document, or the root when there is none.
pub fn body(document: &Handle) -> Handle {
    find_first(document, "body").unwrap_or_else(|| document.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_nested_elements_and_text() {
        let root = parse("<div><h2>Sub</h2><h1>Main <em>Title</em></h1><h1>Second</h1></div>");
        let h1 = find_first(&root, "h1").unwrap();
        assert_eq!(text_content(&h1), "Main Title");
    }

    #[test]
    fn reads_class_list() {
        let root = parse("<fieldset class=\"character-box red\"><legend>Hya</legend></fieldset>");
        let fieldset = find_first(&root, "fieldset").unwrap();
        assert!(has_class(&fieldset, "character-box"));
        assert!(!has_class(&fieldset, "blue"));
        assert_eq!(classes(&fieldset), vec!["character-box", "red"]);
    }
}
