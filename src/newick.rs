//! Minimal Newick reader: topology, labels and branch lengths.
//!
//! Handles quoted labels (`'a b'`, with `''` as an escaped quote), bracketed comments and
//! internal node labels or support values. Only the first tree of a file is read.

use anyhow::{anyhow, Context, Result};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    pub name: Option<String>,
    pub branch_length: Option<f64>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn is_tip(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of terminal nodes.
    pub fn tip_count(&self) -> usize {
        if self.is_tip() {
            1
        } else {
            self.children.iter().map(Node::tip_count).sum()
        }
    }

    /// Branch lengths of every node that has one, root included, in preorder.
    pub fn branch_lengths(&self) -> Vec<f64> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if let Some(len) = node.branch_length {
                out.push(len);
            }
            stack.extend(node.children.iter().rev());
        }
        out
    }
}

struct Parser<'a> {
    text: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, msg: &str) -> anyhow::Error {
        anyhow!("Invalid Newick at byte {}: {}", self.pos, msg)
    }

    /// Skip whitespace and `[...]` comments.
    fn skip_blank(&mut self) -> Result<()> {
        loop {
            match self.text.get(self.pos) {
                Some(b) if b.is_ascii_whitespace() => self.pos += 1,
                Some(b'[') => {
                    let close = self.text[self.pos..]
                        .iter()
                        .position(|&b| b == b']')
                        .ok_or_else(|| self.error("unterminated comment"))?;
                    self.pos += close + 1;
                }
                _ => return Ok(()),
            }
        }
    }

    fn peek(&mut self) -> Result<Option<u8>> {
        self.skip_blank()?;
        Ok(self.text.get(self.pos).copied())
    }

    fn label(&mut self) -> Result<Option<String>> {
        match self.peek()? {
            Some(b'\'') => {
                self.pos += 1;
                let mut out = Vec::new();
                loop {
                    match self.text.get(self.pos) {
                        None => return Err(self.error("unterminated quoted label")),
                        Some(b'\'') if self.text.get(self.pos + 1) == Some(&b'\'') => {
                            out.push(b'\'');
                            self.pos += 2;
                        }
                        Some(b'\'') => {
                            self.pos += 1;
                            break;
                        }
                        Some(&b) => {
                            out.push(b);
                            self.pos += 1;
                        }
                    }
                }
                Ok(Some(String::from_utf8_lossy(&out).into_owned()))
            }
            _ => {
                let start = self.pos;
                while let Some(&b) = self.text.get(self.pos) {
                    if b"():,;[".contains(&b) || b.is_ascii_whitespace() {
                        break;
                    }
                    self.pos += 1;
                }
                if self.pos == start {
                    Ok(None)
                } else {
                    // unquoted underscores stand for spaces
                    Ok(Some(String::from_utf8_lossy(&self.text[start..self.pos]).replace('_', " ")))
                }
            }
        }
    }

    fn branch_length(&mut self) -> Result<Option<f64>> {
        if self.peek()? != Some(b':') {
            return Ok(None);
        }
        self.pos += 1;
        self.skip_blank()?;
        let start = self.pos;
        while let Some(&b) = self.text.get(self.pos) {
            if b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E') {
                self.pos += 1;
            } else {
                break;
            }
        }
        let raw = std::str::from_utf8(&self.text[start..self.pos]).unwrap_or("");
        raw.parse::<f64>()
            .map(Some)
            .map_err(|_| self.error(&format!("bad branch length '{}'", raw)))
    }

    fn subtree(&mut self) -> Result<Node> {
        let mut node = Node::default();
        if self.peek()? == Some(b'(') {
            self.pos += 1;
            loop {
                node.children.push(self.subtree()?);
                match self.peek()? {
                    Some(b',') => self.pos += 1,
                    Some(b')') => {
                        self.pos += 1;
                        break;
                    }
                    _ => return Err(self.error("expected ',' or ')'")),
                }
            }
        }
        node.name = self.label()?;
        node.branch_length = self.branch_length()?;
        Ok(node)
    }
}

/// Parse the first tree in a Newick string.
pub fn parse_newick(text: &str) -> Result<Node> {
    let mut p = Parser { text: text.as_bytes(), pos: 0 };
    if p.peek()?.is_none() {
        return Err(anyhow!("Empty Newick input"));
    }
    let root = p.subtree()?;
    match p.peek()? {
        Some(b';') | None => Ok(root),
        Some(_) => Err(p.error("expected ';'")),
    }
}

pub fn read_newick(path: &Path) -> Result<Node> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read tree {}", path.display()))?;
    parse_newick(&text).with_context(|| format!("Failed to parse tree {}", path.display()))
}
