//! The radix tree behind [`Router`](crate::Router).
//!
//! Each node owns a run of literal path bytes. Static children are indexed by
//! their first byte; a node may instead have a single named parameter child
//! (`:name`, matching up to the next `/`) or a single catch-all child
//! (`*name`, matching the rest of the path). Mixing those at one position is
//! rejected, so a request path can only ever match one route.

use std::collections::HashSet;
use std::mem;
use std::ops::Range;
use std::sync::Arc;

use crate::error::InsertError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    Static,
    Param,
    CatchAll,
}

/// Deduplicates parameter names while routes are being registered.
#[derive(Debug, Default)]
pub(crate) struct Interner {
    names: HashSet<Arc<str>>,
}

impl Interner {
    pub(crate) fn intern(&mut self, name: &str) -> Arc<str> {
        if let Some(name) = self.names.get(name) {
            return Arc::clone(name);
        }
        let name: Arc<str> = Arc::from(name);
        self.names.insert(Arc::clone(&name));
        name
    }
}

#[derive(Debug)]
pub(crate) struct Node<T> {
    segment: Vec<u8>,
    kind: Kind,
    indices: Vec<u8>,
    children: Vec<Node<T>>,
    param: Option<Box<Node<T>>>,
    catch_all: Option<Box<Node<T>>>,
    name: Option<Arc<str>>,
    value: Option<T>,
    priority: u32,
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Node::new(Kind::Static, Vec::new(), None)
    }
}

impl<T> Node<T> {
    fn new(kind: Kind, segment: Vec<u8>, name: Option<Arc<str>>) -> Self {
        Self {
            segment,
            kind,
            indices: Vec::new(),
            children: Vec::new(),
            param: None,
            catch_all: None,
            name,
            value: None,
            priority: 0,
        }
    }

    /// Inserts `value` at `route`, returning the value it replaced.
    pub(crate) fn insert(
        &mut self,
        route: &str,
        value: T,
        names: &mut Interner,
    ) -> Result<Option<T>, InsertError> {
        if !route.starts_with('/') {
            return Err(InsertError::MissingLeadingSlash(route.to_owned()));
        }
        // nodes are created on the way down, so a bad route must fail first
        validate(route)?;

        self.priority += 1;
        self.insert_static(route, route.as_bytes(), value, names)
    }

    fn insert_static(
        &mut self,
        route: &str,
        path: &[u8],
        value: T,
        names: &mut Interner,
    ) -> Result<Option<T>, InsertError> {
        let common = common_prefix(path, &self.segment);
        if common < self.segment.len() {
            self.split(common);
        }

        let rest = &path[common..];
        if rest.is_empty() {
            return Ok(self.value.replace(value));
        }

        self.insert_child(route, rest, value, names)
    }

    // moves everything past `at` into a single new child
    fn split(&mut self, at: usize) {
        let child = Node {
            segment: self.segment.split_off(at),
            kind: Kind::Static,
            indices: mem::take(&mut self.indices),
            children: mem::take(&mut self.children),
            param: self.param.take(),
            catch_all: self.catch_all.take(),
            name: None,
            value: self.value.take(),
            priority: self.priority.saturating_sub(1),
        };

        self.indices = vec![child.segment[0]];
        self.children = vec![child];
    }

    fn insert_child(
        &mut self,
        route: &str,
        path: &[u8],
        value: T,
        names: &mut Interner,
    ) -> Result<Option<T>, InsertError> {
        match path[0] {
            b':' => {
                let end = path
                    .iter()
                    .position(|&c| c == b'/')
                    .unwrap_or(path.len());
                let name = param_name(route, &path[1..end])?;

                if let Some(existing) = self.first_static().or(self.catch_all.as_deref()) {
                    return Err(existing.conflict(route));
                }
                if let Some(param) = &self.param {
                    if param.name.as_deref() != Some(name.as_str()) {
                        return Err(param.conflict(route));
                    }
                }

                let param = self.param.get_or_insert_with(|| {
                    Box::new(Node::new(
                        Kind::Param,
                        path[..end].to_vec(),
                        Some(names.intern(&name)),
                    ))
                });
                param.priority += 1;

                let rest = &path[end..];
                if rest.is_empty() {
                    Ok(param.value.replace(value))
                } else {
                    param.insert_child(route, rest, value, names)
                }
            }
            b'*' => {
                if path.contains(&b'/') {
                    return Err(InsertError::CatchAllNotLast(route.to_owned()));
                }
                let name = param_name(route, &path[1..])?;

                if let Some(existing) = self.first_static().or(self.param.as_deref()) {
                    return Err(existing.conflict(route));
                }
                if let Some(catch_all) = &self.catch_all {
                    if catch_all.name.as_deref() != Some(name.as_str()) {
                        return Err(catch_all.conflict(route));
                    }
                }

                let catch_all = self.catch_all.get_or_insert_with(|| {
                    Box::new(Node::new(
                        Kind::CatchAll,
                        path.to_vec(),
                        Some(names.intern(&name)),
                    ))
                });
                catch_all.priority += 1;
                Ok(catch_all.value.replace(value))
            }
            c => {
                if let Some(i) = self.indices.iter().position(|&index| index == c) {
                    self.children[i].priority += 1;
                    let replaced = self.children[i].insert_static(route, path, value, names);
                    self.promote(i);
                    return replaced;
                }

                if let Some(existing) = self.param.as_deref().or(self.catch_all.as_deref()) {
                    return Err(existing.conflict(route));
                }

                let end = path
                    .iter()
                    .position(|&c| c == b':' || c == b'*')
                    .unwrap_or(path.len());

                let mut child = Node::new(Kind::Static, path[..end].to_vec(), None);
                child.priority = 1;
                if end == path.len() {
                    child.value = Some(value);
                } else {
                    child.insert_child(route, &path[end..], value, names)?;
                }

                self.indices.push(c);
                self.children.push(child);
                Ok(None)
            }
        }
    }

    // keeps static children sorted by how many routes run through them
    fn promote(&mut self, mut i: usize) {
        while i > 0 && self.children[i - 1].priority < self.children[i].priority {
            self.children.swap(i - 1, i);
            self.indices.swap(i - 1, i);
            i -= 1;
        }
    }

    fn first_static(&self) -> Option<&Node<T>> {
        self.children.first()
    }

    fn conflict(&self, route: &str) -> InsertError {
        InsertError::Conflict {
            route: route.to_owned(),
            existing: String::from_utf8_lossy(&self.segment).into_owned(),
        }
    }

    /// Walks the tree for `path`, reporting every parameter binding to `bind`.
    ///
    /// The descent is single-pass: at each node a static child is preferred,
    /// then the parameter child, then the catch-all. Nothing is undone on a
    /// miss, so callers must discard whatever `bind` collected.
    pub(crate) fn at<F>(&self, path: &[u8], mut bind: F) -> Option<&T>
    where
        F: FnMut(&Arc<str>, Range<usize>),
    {
        let mut node = self;
        let mut offset = 0;

        loop {
            let rest = &path[offset..];
            match node.kind {
                Kind::Static => {
                    if !rest.starts_with(&node.segment) {
                        return None;
                    }
                    offset += node.segment.len();
                }
                Kind::Param => {
                    let end = rest.iter().position(|&c| c == b'/').unwrap_or(rest.len());
                    if end == 0 {
                        return None;
                    }
                    bind(node.name.as_ref()?, offset..offset + end);
                    offset += end;
                }
                Kind::CatchAll => {
                    bind(node.name.as_ref()?, offset..path.len());
                    return node.value.as_ref();
                }
            }

            let next = match path.get(offset) {
                Some(&next) => next,
                None => return node.value.as_ref(),
            };

            if let Some(i) = node.indices.iter().position(|&c| c == next) {
                node = &node.children[i];
            } else if let Some(param) = &node.param {
                node = param;
            } else if let Some(catch_all) = &node.catch_all {
                node = catch_all;
            } else {
                return None;
            }
        }
    }
}

fn validate(route: &str) -> Result<(), InsertError> {
    let mut rest = route.as_bytes();

    while let Some(start) = rest.iter().position(|&c| c == b':' || c == b'*') {
        let wildcard = &rest[start..];
        if wildcard[0] == b'*' {
            if wildcard.contains(&b'/') {
                return Err(InsertError::CatchAllNotLast(route.to_owned()));
            }
            return param_name(route, &wildcard[1..]).map(drop);
        }

        let end = wildcard
            .iter()
            .position(|&c| c == b'/')
            .unwrap_or(wildcard.len());
        param_name(route, &wildcard[1..end])?;
        rest = &wildcard[end..];
    }

    Ok(())
}

fn param_name(route: &str, name: &[u8]) -> Result<String, InsertError> {
    if name.is_empty() {
        return Err(InsertError::UnnamedParam(route.to_owned()));
    }
    if name.iter().any(|&c| c == b':' || c == b'*') {
        return Err(InsertError::InvalidParamName(route.to_owned()));
    }
    Ok(String::from_utf8_lossy(name).into_owned())
}

fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(a, b)| a == b).count()
}
