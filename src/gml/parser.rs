//! GML reader for atlases.
//!
//! Parsing happens in two passes: the document is first read into a generic
//! tree of `key value` pairs, where a value is either a scalar or a
//! bracketed list, and the tree is then mapped onto the atlas schema of one
//! `graph` block holding `node` and `edge` blocks. Nested lists inside nodes
//! and edges (such as `graphics`) are not part of the schema and are dropped.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::CharIndices;

use color_eyre::eyre::{eyre, Result};
use log::debug;

/// A node block with its `id` split out
#[derive(Debug, Clone)]
pub struct GmlNode {
    pub id: usize,
    pub attributes: HashMap<String, String>,
}

impl GmlNode {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Parse a numeric attribute, `None` when absent
    pub fn get_parsed<T: std::str::FromStr>(&self, key: &str) -> Result<Option<T>> {
        parse_attribute(&self.attributes, key, || format!("node {}", self.id))
    }
}

/// An edge block with its endpoints split out
#[derive(Debug, Clone)]
pub struct GmlEdge {
    pub source: usize,
    pub target: usize,
    pub attributes: HashMap<String, String>,
}

impl GmlEdge {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Parse a numeric attribute, `None` when absent
    pub fn get_parsed<T: std::str::FromStr>(&self, key: &str) -> Result<Option<T>> {
        parse_attribute(&self.attributes, key, || format!("edge {} -> {}", self.source, self.target))
    }
}

fn parse_attribute<T: std::str::FromStr>(
    attributes: &HashMap<String, String>,
    key: &str,
    owner: impl Fn() -> String,
) -> Result<Option<T>> {
    match attributes.get(key) {
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| eyre!("Invalid value '{}' for attribute '{}' of {}", value, key, owner())),
        None => Ok(None),
    }
}

/// A parsed atlas graph
#[derive(Debug, Clone)]
pub struct GmlGraph {
    pub nodes: Vec<GmlNode>,
    pub edges: Vec<GmlEdge>,
    /// Scalar attributes of the `graph` block, such as `directed`
    pub attributes: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    /// Unquoted word: a key, a number or a bare value
    Word(&'a str),
    Quoted(String),
    Open,
    Close,
}

#[derive(Debug)]
enum Value {
    Scalar(String),
    List(Vec<(String, Value)>),
}

/// Splits a GML document into tokens, tracking byte offsets for errors
struct Tokenizer<'a> {
    src: &'a str,
    chars: std::iter::Peekable<CharIndices<'a>>,
}

impl<'a> Tokenizer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().peekable(),
        }
    }

    fn is_word_char(ch: char) -> bool {
        ch.is_alphanumeric() || matches!(ch, '_' | '.' | '-' | '+')
    }

    fn next_token(&mut self) -> Result<Option<(usize, Token<'a>)>> {
        while let Some(&(offset, ch)) = self.chars.peek() {
            match ch {
                c if c.is_whitespace() => {
                    self.chars.next();
                }
                '#' => {
                    while self.chars.next_if(|&(_, c)| c != '\n').is_some() {}
                }
                '[' => {
                    self.chars.next();
                    return Ok(Some((offset, Token::Open)));
                }
                ']' => {
                    self.chars.next();
                    return Ok(Some((offset, Token::Close)));
                }
                '"' => {
                    self.chars.next();
                    return Ok(Some((offset, Token::Quoted(self.quoted(offset)?))));
                }
                c if Self::is_word_char(c) => {
                    let mut end = offset;
                    while let Some((i, c)) = self.chars.next_if(|&(_, c)| Self::is_word_char(c)) {
                        end = i + c.len_utf8();
                    }
                    let src = self.src;
                    return Ok(Some((offset, Token::Word(&src[offset..end]))));
                }
                other => return Err(eyre!("Unexpected character '{}' at offset {}", other, offset)),
            }
        }
        Ok(None)
    }

    /// Read the rest of a quoted string whose opening quote was at `start`
    fn quoted(&mut self, start: usize) -> Result<String> {
        let mut text = String::new();
        while let Some((_, ch)) = self.chars.next() {
            match ch {
                '"' => return Ok(text),
                '\\' => match self.chars.next() {
                    Some((_, 'n')) => text.push('\n'),
                    Some((_, 't')) => text.push('\t'),
                    Some((_, 'r')) => text.push('\r'),
                    Some((_, c @ ('\\' | '"'))) => text.push(c),
                    Some((_, c)) => {
                        text.push('\\');
                        text.push(c);
                    }
                    None => break,
                },
                c => text.push(c),
            }
        }
        Err(eyre!("Unterminated string starting at offset {}", start))
    }
}

/// Read `key value` pairs until the closing `]`, or until end of input at
/// the top level
fn read_list(tokens: &mut Tokenizer<'_>, closed: bool) -> Result<Vec<(String, Value)>> {
    let mut entries = Vec::new();
    loop {
        let (offset, key) = match tokens.next_token()? {
            None if closed => return Err(eyre!("Unexpected end of input inside '[ ... ]'")),
            None => return Ok(entries),
            Some((_, Token::Close)) if closed => return Ok(entries),
            Some((offset, Token::Word(key))) if key.starts_with(|c: char| c.is_alphabetic() || c == '_') => {
                (offset, key)
            }
            Some((offset, token)) => return Err(eyre!("Expected attribute name at offset {}, found {:?}", offset, token)),
        };

        let value = match tokens.next_token()? {
            Some((_, Token::Word(word))) => Value::Scalar(word.to_string()),
            Some((_, Token::Quoted(text))) => Value::Scalar(text),
            Some((_, Token::Open)) => Value::List(read_list(tokens, true)?),
            _ => return Err(eyre!("Missing value for '{}' at offset {}", key, offset)),
        };
        entries.push((key.to_string(), value));
    }
}

/// Keep the scalar entries of a block
fn scalars(entries: Vec<(String, Value)>, block: &str) -> HashMap<String, String> {
    entries
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Scalar(text) => Some((key, text)),
            Value::List(_) => {
                debug!("Ignoring nested '{}' list in {} block", key, block);
                None
            }
        })
        .collect()
}

fn take_index(attributes: &mut HashMap<String, String>, key: &str, block: &str) -> Result<usize> {
    let value = attributes
        .remove(key)
        .ok_or_else(|| eyre!("{} missing required '{}' attribute", block, key))?;
    value
        .parse::<usize>()
        .map_err(|_| eyre!("Invalid {} '{}': {}", block.to_lowercase(), key, value))
}

fn graph_from(entries: Vec<(String, Value)>) -> Result<GmlGraph> {
    let mut graph = GmlGraph {
        nodes: Vec::new(),
        edges: Vec::new(),
        attributes: HashMap::new(),
    };

    for (key, value) in entries {
        match value {
            Value::List(block) if key == "node" => {
                let mut attributes = scalars(block, "node");
                let id = take_index(&mut attributes, "id", "Node")?;
                graph.nodes.push(GmlNode { id, attributes });
            }
            Value::List(block) if key == "edge" => {
                let mut attributes = scalars(block, "edge");
                let source = take_index(&mut attributes, "source", "Edge")?;
                let target = take_index(&mut attributes, "target", "Edge")?;
                graph.edges.push(GmlEdge { source, target, attributes });
            }
            Value::Scalar(_) if key == "node" || key == "edge" => {
                return Err(eyre!("'{}' must be a [ ... ] block", key))
            }
            Value::Scalar(text) => {
                graph.attributes.insert(key, text);
            }
            Value::List(_) => debug!("Ignoring nested '{}' list in graph block", key),
        }
    }

    Ok(graph)
}

/// Parse a GML document holding a single `graph` block
pub fn parse_gml_str(content: &str) -> Result<GmlGraph> {
    let document = read_list(&mut Tokenizer::new(content), false)?;

    let mut graphs = document.into_iter().filter_map(|(key, value)| match value {
        Value::List(entries) if key == "graph" => Some(entries),
        _ => None,
    });
    let entries = graphs.next().ok_or_else(|| eyre!("Document has no 'graph [ ... ]' block"))?;
    if graphs.next().is_some() {
        return Err(eyre!("Document has more than one 'graph' block"));
    }

    graph_from(entries)
}

/// Parse a GML file
pub fn parse_gml_file(path: &Path) -> Result<GmlGraph> {
    let content = fs::read_to_string(path)
        .map_err(|e| eyre!("Failed to read GML file '{}': {}", path.display(), e))?;

    parse_gml_str(&content)
}
