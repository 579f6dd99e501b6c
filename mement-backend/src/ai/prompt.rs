//! Plain structured-data prompt builder: a tree of named fields rendered to
//! tagged text. Keeps prompt shape declarative without any templating layer.

pub struct PromptNode {
    name: String,
    text: Option<String>,
    children: Vec<PromptNode>,
}

impl PromptNode {
    pub fn group(name: &str) -> Self {
        Self {
            name: name.to_string(),
            text: None,
            children: Vec::new(),
        }
    }

    pub fn text(name: &str, body: &str) -> Self {
        Self {
            name: name.to_string(),
            text: Some(body.to_string()),
            children: Vec::new(),
        }
    }

    pub fn child(mut self, node: PromptNode) -> Self {
        self.children.push(node);
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        match (&self.text, self.children.is_empty()) {
            (Some(text), _) => {
                out.push_str(&format!("{}<{}>{}</{}>\n", indent, self.name, text, self.name));
            }
            (None, true) => {
                out.push_str(&format!("{}<{}/>\n", indent, self.name));
            }
            (None, false) => {
                out.push_str(&format!("{}<{}>\n", indent, self.name));
                for child in &self.children {
                    child.render_into(out, depth + 1);
                }
                out.push_str(&format!("{}</{}>\n", indent, self.name));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_nested_fields() {
        let tree = PromptNode::group("user")
            .child(PromptNode::text("situation", "You are a gardener."))
            .child(PromptNode::text("question", "When to plant?"));

        let rendered = tree.render();
        assert!(rendered.contains("<user>"));
        assert!(rendered.contains("<situation>You are a gardener.</situation>"));
        assert!(rendered.contains("<question>When to plant?</question>"));
        assert!(rendered.trim_end().ends_with("</user>"));
    }

    #[test]
    fn test_render_empty_group() {
        assert_eq!(PromptNode::group("context").render(), "<context/>\n");
    }
}
