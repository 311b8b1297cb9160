//! Engine: fetches one customer's tag listing and parses it into a
//! [`TagMapping`].
//!
//! Typical usage:
//!
//! ```no_run
//! use taglist::customer::Customer;
//! use taglist::engine::Engine;
//! use taglist::source::TeCommander;
//! # fn main() -> anyhow::Result<()> {
//! let customer = Customer::new("Acme", r"C:\auth\acme.xml");
//! let mut engine = Engine::new();
//! engine.load_from_source(&TeCommander::default(), &customer, "Monitoring Enabled")?;
//! println!("{} nodes", engine.tags.len());
//! # Ok(())
//! # }
//! ```
use std::io;

use log::{debug, info};

use crate::block::{BlockParser, ParseStats};
use crate::customer::Customer;
use crate::source::{SourceError, TagSource};
use crate::tagmap::TagMapping;

#[derive(Debug, Default)]
pub struct Engine {
    pub tags: TagMapping,
    pub parse_stats: Option<ParseStats>,
    parser: BlockParser,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_parser(BlockParser::new())
    }

    pub fn with_parser(parser: BlockParser) -> Self {
        Self {
            tags: TagMapping::new(),
            parse_stats: None,
            parser,
        }
    }

    /// Parse lines already in memory, replacing any previous result.
    pub fn load_from_lines<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (tags, stats) = self.parser.parse_with_stats(lines);
        debug!(
            "parsed {} block(s), {} tag(s), {} orphan line(s)",
            stats.blocks, stats.tags, stats.orphans
        );
        self.tags = tags;
        self.parse_stats = Some(stats);
    }

    /// Convenience for tests and small integrations.
    pub fn load_from_strings(&mut self, contents: &str) {
        self.load_from_lines(contents.lines());
    }

    /// Fetch the complete listing from `source`, then parse it. Nothing is
    /// parsed if the listing cannot be read to the end.
    pub fn load_from_source(
        &mut self,
        source: &dyn TagSource,
        customer: &Customer,
        node_group: &str,
    ) -> Result<(), SourceError> {
        let lines = source
            .fetch(customer, node_group)?
            .collect::<io::Result<Vec<String>>>()
            .map_err(SourceError::Read)?;
        info!("received {} line(s) for {}", lines.len(), customer.name);
        self.load_from_lines(&lines);
        Ok(())
    }
}
