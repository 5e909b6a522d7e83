//! Radix tree node implementation.
//!
//! Each node is one path segment. Parameter nodes are anonymous: the names
//! live on the [`MethodRouter`] entries at the leaf, so patterns of the same
//! shape with different parameter names can coexist.

use crate::method_router::MethodRouter;
use crate::path::param_name;

/// Type of path segment in the radix tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SegmentKind {
    /// Static path segment (e.g. `orders`)
    Static,
    /// Named parameter (`:id` or `{id}`)
    Param,
    /// Catch-all wildcard (`*path`), only valid as the last segment
    Wildcard,
}

/// A node in the radix tree.
#[derive(Debug, Clone)]
pub(crate) struct Node<T> {
    pub(crate) segment: String,
    pub(crate) kind: SegmentKind,
    pub(crate) methods: Option<MethodRouter<T>>,
    /// Sorted by segment for binary search.
    pub(crate) static_children: Vec<Node<T>>,
    pub(crate) param_child: Option<Box<Node<T>>>,
    pub(crate) wildcard_child: Option<Box<Node<T>>>,
}

impl<T> Node<T> {
    fn new(segment: impl Into<String>, kind: SegmentKind) -> Self {
        Self {
            segment: segment.into(),
            kind,
            methods: None,
            static_children: Vec::new(),
            param_child: None,
            wildcard_child: None,
        }
    }

    /// Creates a root node for the tree.
    pub(crate) fn root() -> Self {
        Self::new("", SegmentKind::Static)
    }

    /// Splits a pattern into classified segments. Empty segments are dropped,
    /// which makes trailing slashes insignificant when matching.
    pub(crate) fn parse_path(path: &str) -> Vec<(&str, SegmentKind)> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if param_name(s).is_some() {
                    (s, SegmentKind::Param)
                } else if s.starts_with('*') {
                    (s, SegmentKind::Wildcard)
                } else {
                    (s, SegmentKind::Static)
                }
            })
            .collect()
    }

    /// Walks to (creating as needed) the node for `segments` and returns its
    /// method router.
    pub(crate) fn leaf_mut(&mut self, segments: &[(&str, SegmentKind)]) -> &mut MethodRouter<T> {
        let Some(((segment, kind), remaining)) = segments.split_first() else {
            return self.methods.get_or_insert_with(MethodRouter::new);
        };

        let child = match kind {
            SegmentKind::Static => {
                let index = match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(segment))
                {
                    Ok(index) => index,
                    Err(index) => {
                        self.static_children
                            .insert(index, Node::new(*segment, SegmentKind::Static));
                        index
                    }
                };
                &mut self.static_children[index]
            }
            SegmentKind::Param => self
                .param_child
                .get_or_insert_with(|| Box::new(Node::new(":", SegmentKind::Param)))
                .as_mut(),
            SegmentKind::Wildcard => self
                .wildcard_child
                .get_or_insert_with(|| Box::new(Node::new("*", SegmentKind::Wildcard)))
                .as_mut(),
        };
        child.leaf_mut(remaining)
    }

    /// Matches a request path, returning the leaf and the captured values in
    /// path order.
    pub(crate) fn match_path<'a>(&'a self, path: &str) -> Option<(&'a MethodRouter<T>, Vec<String>)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut values = Vec::new();
        self.match_segments(&segments, &mut values)
            .map(|methods| (methods, values))
    }

    fn match_segments<'a>(
        &'a self,
        segments: &[&str],
        values: &mut Vec<String>,
    ) -> Option<&'a MethodRouter<T>> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self.methods.as_ref();
        };

        // static beats param beats wildcard
        if let Some(child) = self.find_static_child(segment) {
            if let Some(found) = child.match_segments(remaining, values) {
                return Some(found);
            }
        }

        if let Some(child) = &self.param_child {
            values.push((*segment).to_string());
            if let Some(found) = child.match_segments(remaining, values) {
                return Some(found);
            }
            values.pop();
        }

        if let Some(child) = &self.wildcard_child {
            if let Some(methods) = &child.methods {
                values.push(segments.join("/"));
                return Some(methods);
            }
        }

        None
    }

    fn find_static_child(&self, segment: &str) -> Option<&Node<T>> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method_router::MethodEntry;
    use http::Method;

    fn insert(root: &mut Node<&'static str>, path: &str, target: &'static str) {
        let segments = Node::<&str>::parse_path(path);
        root.leaf_mut(&segments)
            .insert(MethodEntry {
                method: Method::GET,
                target,
                param_names: crate::path::param_names(path),
                pattern: path.to_string(),
            })
            .unwrap();
    }

    #[test]
    fn test_parse_path_kinds() {
        let segments = Node::<()>::parse_path("/orders/:id/{line}/*rest");
        let kinds: Vec<_> = segments.iter().map(|(_, k)| k.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                SegmentKind::Static,
                SegmentKind::Param,
                SegmentKind::Param,
                SegmentKind::Wildcard
            ]
        );
    }

    #[test]
    fn test_static_children_stay_sorted() {
        let mut root = Node::root();
        insert(&mut root, "/zeta", "z");
        insert(&mut root, "/alpha", "a");
        insert(&mut root, "/mid", "m");
        let order: Vec<_> = root
            .static_children
            .iter()
            .map(|c| c.segment.as_str())
            .collect();
        assert_eq!(order, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_match_param_values() {
        let mut root = Node::root();
        insert(&mut root, "/orgs/:org/users/{user}", "orgUser");

        let (methods, values) = root.match_path("/orgs/acme/users/7").unwrap();
        assert_eq!(methods.get(&Method::GET), Some(&"orgUser"));
        assert_eq!(values, vec!["acme", "7"]);
    }

    #[test]
    fn test_backtracking_drops_failed_param() {
        let mut root = Node::root();
        insert(&mut root, "/a/:x/b", "param");
        insert(&mut root, "/a/*rest", "wild");

        let (methods, values) = root.match_path("/a/1/c").unwrap();
        assert_eq!(methods.get(&Method::GET), Some(&"wild"));
        assert_eq!(values, vec!["1/c"]);
    }

    #[test]
    fn test_static_priority_over_param() {
        let mut root = Node::root();
        insert(&mut root, "/users/me", "me");
        insert(&mut root, "/users/:id", "byId");

        let (methods, values) = root.match_path("/users/me").unwrap();
        assert_eq!(methods.get(&Method::GET), Some(&"me"));
        assert!(values.is_empty());

        let (methods, values) = root.match_path("/users/9").unwrap();
        assert_eq!(methods.get(&Method::GET), Some(&"byId"));
        assert_eq!(values, vec!["9"]);
    }

    #[test]
    fn test_no_match() {
        let mut root = Node::root();
        insert(&mut root, "/users", "list");
        assert!(root.match_path("/posts").is_none());
        assert!(root.match_path("/users/1").is_none());
    }
}
