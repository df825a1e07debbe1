//! Content templates for geometry fields.
//!
//! A template is literal text with `{placeholder}` tokens naming
//! [`RecordField`]s, e.g. `"MRP: ₹{mrp} (Incl. of all taxes)"`. `{{` and `}}`
//! produce literal braces.

use crate::record::{LabelRecord, RecordField};

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
    Unterminated(&'a str),
}

fn tokenize(template: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = template;
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("{{") {
            tokens.push(Token::Literal("{"));
            rest = after;
        } else if let Some(after) = rest.strip_prefix("}}") {
            tokens.push(Token::Literal("}"));
            rest = after;
        } else if let Some(after) = rest.strip_prefix('{') {
            match after.find('}') {
                Some(end) => {
                    tokens.push(Token::Placeholder(&after[..end]));
                    rest = &after[end + 1..];
                }
                None => {
                    tokens.push(Token::Unterminated(rest));
                    rest = "";
                }
            }
        } else {
            let end = rest.find(['{', '}']).unwrap_or(rest.len());
            // A lone '}' is kept as literal text.
            let end = if end == 0 { 1 } else { end };
            tokens.push(Token::Literal(&rest[..end]));
            rest = &rest[end..];
        }
    }
    tokens
}

/// Check that every placeholder in `template` names a record field.
pub fn check_template(template: &str) -> Result<(), String> {
    for token in tokenize(template) {
        match token {
            Token::Literal(_) => {}
            Token::Placeholder(name) => {
                name.parse::<RecordField>()?;
            }
            Token::Unterminated(text) => {
                return Err(format!("unterminated placeholder in '{text}'"));
            }
        }
    }
    Ok(())
}

/// Fields referenced by `template`, in order of appearance.
pub fn template_fields(template: &str) -> Vec<RecordField> {
    tokenize(template)
        .into_iter()
        .filter_map(|t| match t {
            Token::Placeholder(name) => name.parse().ok(),
            _ => None,
        })
        .collect()
}

/// Substitute record values into `template`.
///
/// Unknown or unterminated placeholders are copied through verbatim;
/// [`check_template`] rejects them when a geometry is validated.
pub fn render_template(template: &str, record: &LabelRecord) -> String {
    let mut out = String::with_capacity(template.len() + 32);
    for token in tokenize(template) {
        match token {
            Token::Literal(text) | Token::Unterminated(text) => out.push_str(text),
            Token::Placeholder(name) => match name.parse::<RecordField>() {
                Ok(field) => out.push_str(record.field(field)),
                Err(_) => {
                    out.push('{');
                    out.push_str(name);
                    out.push('}');
                }
            },
        }
    }
    out
}
