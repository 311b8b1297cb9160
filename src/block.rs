//! Block parser for `avlistassettags` output.
//!
//! The listing is a sequence of blocks separated by blank lines. Each block
//! starts with a `Node:<name>` header followed by one tag per line:
//!
//! ```text
//! Node:web01
//! Production
//! Windows
//!
//! Node:db01
//! Linux
//!
//! ```
//!
//! Parsing is permissive: empty names, empty blocks and stray lines are
//! accepted and only counted in [`ParseStats`].
use log::{debug, warn};

use crate::tagmap::TagMapping;

/// Literal marker that opens a block.
pub const HEADER_PREFIX: &str = "Node:";

/// Counters collected during a single parse pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParseStats {
    /// Header lines seen.
    pub blocks: usize,
    /// Tag lines committed to a node.
    pub tags: usize,
    /// Blocks still open when the stream ended (their tags are not committed).
    pub unterminated: usize,
    /// Non-blank lines seen outside any block.
    pub orphans: usize,
}

#[derive(Debug, Clone)]
pub struct BlockParser {
    prefix: String,
}

impl Default for BlockParser {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockParser {
    pub fn new() -> Self {
        Self::with_prefix(HEADER_PREFIX)
    }

    /// Parser recognising a different header marker.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the node name if `line` is a header line.
    pub fn header_name<'l>(&self, line: &'l str) -> Option<&'l str> {
        line.strip_prefix(self.prefix.as_str())
    }

    /// Parse a full line sequence into a mapping.
    pub fn parse<I, S>(&self, lines: I) -> TagMapping
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.parse_with_stats(lines).0
    }

    /// Parse a full line sequence, also returning counters for degenerate input.
    pub fn parse_with_stats<I, S>(&self, lines: I) -> (TagMapping, ParseStats)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut mapping = TagMapping::new();
        let mut stats = ParseStats::default();
        let mut current: Option<String> = None;
        let mut values: Vec<String> = Vec::new();

        for line in lines {
            let line = line.as_ref();
            if let Some(name) = self.header_name(line) {
                if let Some(prev) = current.as_deref() {
                    debug!("block for {:?} interrupted by header {:?}", prev, name);
                }
                stats.blocks += 1;
                // Placeholder so a block without tags still yields an entry.
                mapping.insert(name, Vec::new());
                current = Some(name.to_string());
                values = Vec::new();
            } else if !line.is_empty() {
                if current.is_some() {
                    values.push(line.to_string());
                } else {
                    stats.orphans += 1;
                    debug!("ignoring line outside any block: {:?}", line);
                }
            } else if let Some(node) = current.take() {
                stats.tags += values.len();
                mapping.insert(node, std::mem::take(&mut values));
            }
        }

        if let Some(node) = current {
            stats.unterminated += 1;
            warn!(
                "listing ended inside the block for {:?}; {} tag(s) not recorded",
                node,
                values.len()
            );
        }

        (mapping, stats)
    }
}

/// Parse with the default `Node:` header marker.
pub fn parse_tag_blocks<I, S>(lines: I) -> TagMapping
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    BlockParser::new().parse(lines)
}

/// Parse a whole listing held in memory.
pub fn parse_tag_contents(contents: &str) -> TagMapping {
    parse_tag_blocks(contents.lines())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_line_detection() {
        let parser = BlockParser::new();
        assert_eq!(parser.header_name("Node:web01"), Some("web01"));
        assert_eq!(parser.header_name("Node: spaced "), Some(" spaced "));
        assert_eq!(parser.header_name("Node:"), Some(""));
        assert_eq!(parser.header_name("node:web01"), None);
        assert_eq!(parser.header_name(" Node:web01"), None);
        assert_eq!(BlockParser::with_prefix("Asset:").header_name("Asset:pc1"), Some("pc1"));
    }

    #[test]
    fn counts_one_key_per_terminated_block() {
        let lines = ["Node:a", "t1", "", "Node:b", "t2", "t3", "", "Node:c", ""];
        let m = parse_tag_blocks(lines);
        assert_eq!(m.len(), 3);
        assert_eq!(m.get("a").unwrap(), ["t1"]);
        assert_eq!(m.get("b").unwrap(), ["t2", "t3"]);
        assert!(m.get("c").unwrap().is_empty());
    }

    #[test]
    fn captures_values_in_order_with_duplicates() {
        let m = parse_tag_blocks(["Node:X", "b", "a", "b", ""]);
        assert_eq!(m.get("X").unwrap(), ["b", "a", "b"]);
    }

    #[test]
    fn empty_block_yields_entry_without_tags() {
        let m = parse_tag_blocks(["Node:lonely", ""]);
        assert_eq!(m.len(), 1);
        assert!(m.get("lonely").unwrap().is_empty());
    }

    #[test]
    fn empty_input_yields_empty_mapping() {
        let m = parse_tag_blocks(Vec::<String>::new());
        assert!(m.is_empty());
    }

    #[test]
    fn empty_node_name_is_kept() {
        let m = parse_tag_blocks(["Node:", "tag", ""]);
        assert_eq!(m.get("").unwrap(), ["tag"]);
    }

    #[test]
    fn unterminated_trailing_block_keeps_placeholder_only() {
        let (m, stats) =
            BlockParser::new().parse_with_stats(["Node:a", "x", "", "Node:b", "y"]);
        assert_eq!(m.get("a").unwrap(), ["x"]);
        assert!(m.get("b").unwrap().is_empty());
        assert_eq!(stats.unterminated, 1);
        assert_eq!(stats.tags, 1);
    }

    #[test]
    fn lines_outside_blocks_are_counted_not_attached() {
        let (m, stats) =
            BlockParser::new().parse_with_stats(["stray", "Node:a", "x", "", "late", "", ""]);
        assert_eq!(m.len(), 1);
        assert_eq!(m.get("a").unwrap(), ["x"]);
        assert_eq!(stats.orphans, 2);
        assert_eq!(stats.blocks, 1);
    }

    #[test]
    fn repeated_header_replaces_entry() {
        let m = parse_tag_blocks(["Node:a", "old", "", "Node:a", "new", ""]);
        assert_eq!(m.len(), 1);
        assert_eq!(m.get("a").unwrap(), ["new"]);
    }

    #[test]
    fn header_without_blank_separator_starts_fresh_block() {
        // The first block is never terminated, so only its placeholder survives.
        let m = parse_tag_blocks(["Node:a", "x", "Node:b", "y", ""]);
        assert!(m.get("a").unwrap().is_empty());
        assert_eq!(m.get("b").unwrap(), ["y"]);
    }

    #[test]
    fn whitespace_only_line_is_a_tag() {
        let m = parse_tag_blocks(["Node:a", " ", ""]);
        assert_eq!(m.get("a").unwrap(), [" "]);
    }

    #[test]
    fn custom_prefix() {
        let parser = BlockParser::with_prefix("Asset:");
        let m = parser.parse(["Asset:pc1", "Node:not-a-header", ""]);
        assert_eq!(parser.prefix(), "Asset:");
        assert_eq!(m.get("pc1").unwrap(), ["Node:not-a-header"]);
    }

    #[test]
    fn parses_in_memory_listing() {
        let m = parse_tag_contents("Node:alpha\ntagB\ntagA\n\nNode:beta\n\n");
        assert_eq!(m.len(), 2);
        assert_eq!(m.get("alpha").unwrap(), ["tagB", "tagA"]);
    }
}
