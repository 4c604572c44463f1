use super::Segment;
use crate::error::InternalError;

// Split pattern text into segments.
pub(super) fn parse_segments(pattern: &str) -> Result<Vec<Segment>, InternalError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        match ch {
            '{' => {
                let placeholder = match chars.next() {
                    Some((_, '{')) => {
                        literal.push('{');
                        continue;
                    }
                    Some((_, '}')) => Segment::Direct,
                    Some((_, '.')) if matches!(chars.peek(), Some((_, '}'))) => {
                        chars.next();
                        Segment::Deref
                    }
                    _ => {
                        return Err(InternalError::template_unsupported(format!(
                            "invalid placeholder at byte {pos} in key pattern '{pattern}'"
                        )));
                    }
                };

                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(placeholder);
            }
            '}' => {
                if matches!(chars.next(), Some((_, '}'))) {
                    literal.push('}');
                } else {
                    return Err(InternalError::template_unsupported(format!(
                        "unmatched '}}' at byte {pos} in key pattern '{pattern}'"
                    )));
                }
            }
            ch => literal.push(ch),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    Ok(segments)
}
