// Host nodes mounted in the render root

use serde::Serialize;

/// A built UI node: components are already expanded, only host tags and
/// text remain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RenderNode {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        children: Vec<RenderNode>,
    },
    Text {
        text: String,
    },
}

impl RenderNode {
    pub fn text(text: impl Into<String>) -> Self {
        RenderNode::Text { text: text.into() }
    }

    pub fn element(tag: impl Into<String>, attributes: Vec<(String, String)>, children: Vec<RenderNode>) -> Self {
        RenderNode::Element {
            tag: tag.into(),
            attributes,
            children,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            RenderNode::Element { tag, .. } => Some(tag),
            RenderNode::Text { .. } => None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        match self {
            RenderNode::Element { attributes, .. } => attributes
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            RenderNode::Text { .. } => None,
        }
    }

    pub fn children(&self) -> &[RenderNode] {
        match self {
            RenderNode::Element { children, .. } => children,
            RenderNode::Text { .. } => &[],
        }
    }

    /// Concatenated text of this subtree
    pub fn text_content(&self) -> String {
        match self {
            RenderNode::Text { text } => text.clone(),
            RenderNode::Element { children, .. } => children.iter().map(RenderNode::text_content).collect(),
        }
    }

    /// First element with `tag` in this subtree, depth first
    pub fn find(&self, tag: &str) -> Option<&RenderNode> {
        if self.tag() == Some(tag) {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queries() {
        let tree = RenderNode::element(
            "div",
            vec![("id".to_string(), "main".to_string())],
            vec![
                RenderNode::text("a "),
                RenderNode::element("b", Vec::new(), vec![RenderNode::text("bold")]),
            ],
        );
        assert_eq!(tree.attribute("id"), Some("main"));
        assert_eq!(tree.text_content(), "a bold");
        assert_eq!(tree.find("b").map(RenderNode::text_content).as_deref(), Some("bold"));
        assert!(tree.find("p").is_none());
    }
}
