//! Interactive prompts used when the command line leaves something out.
//!
//! Both prompts take their input and output streams as parameters so the CLI
//! can pass stdin/stdout and tests can pass buffers.
use std::io::{self, BufRead, Write};

/// Node group used when the user just presses enter.
pub const DEFAULT_NODE_GROUP: &str = "Monitoring Enabled";

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("invalid selection! {0:?} is not in the list")]
    InvalidSelection(String),
    #[error("nothing to choose from")]
    NoChoices,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Show a numbered menu of `names` and return the chosen one.
///
/// Choices are 1-based; anything that is not a number in `1..=names.len()`
/// is rejected.
pub fn select_customer<'a, R: BufRead, W: Write>(
    names: &[&'a str],
    mut input: R,
    mut output: W,
) -> Result<&'a str, PromptError> {
    if names.is_empty() {
        return Err(PromptError::NoChoices);
    }
    writeln!(output, "Please select the number of the customer:")?;
    for (i, name) in names.iter().enumerate() {
        writeln!(output, "\t{:>4}. {}", i + 1, name)?;
    }
    write!(output, "Your choice: ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let choice = line.trim();
    match choice.parse::<usize>() {
        Ok(n) if (1..=names.len()).contains(&n) => Ok(names[n - 1]),
        _ => Err(PromptError::InvalidSelection(choice.to_string())),
    }
}

/// Ask for the SmartNode group, falling back to [`DEFAULT_NODE_GROUP`].
pub fn prompt_node_group<R: BufRead, W: Write>(
    mut input: R,
    mut output: W,
) -> Result<String, PromptError> {
    write!(output, "Node Group [{}]: ", DEFAULT_NODE_GROUP)?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(normalize_node_group(&line))
}

/// Trim whitespace and surrounding double quotes; empty means the default.
pub fn normalize_node_group(raw: &str) -> String {
    let group = raw.trim().trim_matches('"');
    if group.is_empty() {
        DEFAULT_NODE_GROUP.to_string()
    } else {
        group.to_string()
    }
}
