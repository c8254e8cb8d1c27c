use once_cell::sync::Lazy;
use regex::Regex;

use crate::dispatch::TOOL_NAME;
use crate::error::{AgentError, Result};

// \b keeps my_paper_search_tool from matching; the explicit paren keeps
// paper_search_tools from matching.
static CALL_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"\b{TOOL_NAME}\s*\(")).expect("call pattern"));

/// A tool invocation as written by the model, before validation. Argument
/// values are kept as raw text; the dispatcher parses them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallRequest {
    pub tool_name: String,
    pub arguments: Vec<(String, String)>,
}

/// Scans model output for a `paper_search_tool(...)` invocation.
///
/// Only the registered tool name is ever matched (strict allow-list);
/// calls to any other identifier and plain text both return `Ok(None)`.
/// Commentary around the call is tolerated and discarded, including
/// parentheticals like "(as requested)" before the call itself. Broken
/// syntax inside a recognized call is an error, never dropped.
pub fn extract(raw: &str) -> Result<Option<ToolCallRequest>> {
    let Some(found) = CALL_START.find(raw) else {
        return Ok(None);
    };
    let body = read_call_body(&raw[found.end()..])?;
    let arguments = parse_arguments(body)?;
    Ok(Some(ToolCallRequest {
        tool_name: TOOL_NAME.to_string(),
        arguments,
    }))
}

/// Returns the argument text up to the closing paren that balances the
/// already-consumed opening one. Quoted literals may contain parens.
fn read_call_body(rest: &str) -> Result<&str> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (idx, ch) in rest.char_indices() {
        match quote {
            Some(open) => {
                if ch == open {
                    quote = None;
                }
            }
            None => match ch {
                '\'' | '"' => quote = Some(ch),
                '(' => depth += 1,
                ')' => {
                    if depth == 0 {
                        return Ok(&rest[..idx]);
                    }
                    depth -= 1;
                }
                _ => {}
            },
        }
    }
    // Ran out of text with the call still open: unbalanced paren or quote.
    Err(AgentError::MalformedCall {
        fragment: rest.trim().to_string(),
    })
}

fn parse_arguments(body: &str) -> Result<Vec<(String, String)>> {
    let mut arguments = Vec::new();
    for piece in split_top_level(body)? {
        let piece = piece.trim();
        if piece.is_empty() {
            // Tolerates an empty body and a trailing comma.
            continue;
        }
        let Some((name, value)) = piece.split_once('=') else {
            return Err(AgentError::MalformedCall {
                fragment: piece.to_string(),
            });
        };
        let name = name.trim();
        if !is_identifier(name) {
            return Err(AgentError::MalformedCall {
                fragment: piece.to_string(),
            });
        }
        let value = strip_quotes(value.trim(), piece)?;
        arguments.push((name.to_string(), value.to_string()));
    }
    Ok(arguments)
}

/// Splits on commas outside quoted literals.
fn split_top_level(body: &str) -> Result<Vec<&str>> {
    let mut pieces = Vec::new();
    let mut start = 0usize;
    let mut quote: Option<char> = None;
    for (idx, ch) in body.char_indices() {
        match quote {
            Some(open) => {
                if ch == open {
                    quote = None;
                }
            }
            None => match ch {
                '\'' | '"' => quote = Some(ch),
                ',' => {
                    pieces.push(&body[start..idx]);
                    start = idx + 1;
                }
                _ => {}
            },
        }
    }
    if quote.is_some() {
        return Err(AgentError::MalformedCall {
            fragment: body.trim().to_string(),
        });
    }
    pieces.push(&body[start..]);
    Ok(pieces)
}

fn strip_quotes<'a>(value: &'a str, context: &str) -> Result<&'a str> {
    let mut chars = value.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open @ ('\'' | '"')), Some(close)) if value.len() >= 2 => {
            if close != open {
                return Err(AgentError::MalformedCall {
                    fragment: context.to_string(),
                });
            }
            Ok(&value[1..value.len() - 1])
        }
        (Some('\'' | '"'), _) => Err(AgentError::MalformedCall {
            fragment: context.to_string(),
        }),
        _ => Ok(value),
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        }
        _ => false,
    }
}
