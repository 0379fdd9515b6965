// Document access used by the controller

use crate::selector::Selector;

/// The slice of a DOM the language controller reads and writes.
///
/// Queries scoped to a node search its descendants only, like
/// `Element.querySelector`. Mutations never fail: a node the backend cannot
/// update is left as it was.
pub trait Page {
    type Node: Clone;

    /// The `<html>` element.
    fn root(&self) -> Option<Self::Node>;

    fn body(&self) -> Option<Self::Node>;

    fn select_first(&self, scope: Option<&Self::Node>, selector: &Selector) -> Option<Self::Node>;

    fn select_all(&self, scope: Option<&Self::Node>, selector: &Selector) -> Vec<Self::Node>;

    fn matches(&self, node: &Self::Node, selector: &Selector) -> bool;

    fn attr(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn set_attr(&mut self, node: &Self::Node, name: &str, value: &str);

    fn remove_attr(&mut self, node: &Self::Node, name: &str);

    /// Replaces all children with a single text node.
    fn set_text(&mut self, node: &Self::Node, text: &str);

    /// Creates a detached element.
    fn create_element(&mut self, tag: &str) -> Option<Self::Node>;

    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node);

    fn element_by_id(&self, id: &str) -> Option<Self::Node> {
        self.select_first(None, &Selector::id(id))
    }

    fn has_class(&self, node: &Self::Node, class: &str) -> bool {
        self.attr(node, "class")
            .map(|list| list.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    fn set_class(&mut self, node: &Self::Node, class: &str, on: bool) {
        if self.has_class(node, class) == on {
            return;
        }
        let current = self.attr(node, "class").unwrap_or_default();
        let mut classes: Vec<&str> = current
            .split_whitespace()
            .filter(|c| *c != class)
            .collect();
        if on {
            classes.push(class);
        }
        self.set_attr(node, "class", &classes.join(" "));
    }
}
