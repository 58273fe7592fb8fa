//! Pairs an opening tag with its closing partner (and vice versa) using a
//! depth counter so nested tags of the same name are skipped.

use std::ops::Range;

use crate::token::TagToken;

/// Which side of a pair the cursor sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairSide {
    Opening,
    Closing,
}

/// A matched opening/closing tag pair.
/// （成對的開始與結束標籤。）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagPair<'a> {
    pub opening: &'a TagToken,
    pub closing: &'a TagToken,
}

impl<'a> TagPair<'a> {
    pub fn name(&self) -> &'a str {
        &self.opening.name
    }

    /// Character range spanned by the element, tags included.
    pub fn outer_range(&self) -> Range<usize> {
        self.opening.start_offset..self.closing.end_offset
    }

    /// Character range of the element content between the two tags.
    pub fn inner_range(&self) -> Range<usize> {
        self.opening.end_offset..self.closing.start_offset
    }
}

/// Result of a cursor query against the token list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome<'a> {
    /// The cursor does not touch any tag.
    NoTagAtCursor,
    /// The tag under the cursor ends in `/>` and has no partner.
    SelfClosing(&'a TagToken),
    /// No partner exists in the document (malformed markup).
    Unmatched(&'a TagToken),
    Paired { pair: TagPair<'a>, anchor: PairSide },
}

impl<'a> MatchOutcome<'a> {
    /// Token under the cursor, if any.
    pub fn anchor_token(&self) -> Option<&'a TagToken> {
        match *self {
            MatchOutcome::NoTagAtCursor => None,
            MatchOutcome::SelfClosing(token) | MatchOutcome::Unmatched(token) => Some(token),
            MatchOutcome::Paired { pair, anchor } => Some(match anchor {
                PairSide::Opening => pair.opening,
                PairSide::Closing => pair.closing,
            }),
        }
    }

    /// The token on the other side of the pair, used for "jump to partner".
    pub fn partner(&self) -> Option<&'a TagToken> {
        match *self {
            MatchOutcome::Paired { pair, anchor } => Some(match anchor {
                PairSide::Opening => pair.closing,
                PairSide::Closing => pair.opening,
            }),
            _ => None,
        }
    }

    pub fn pair(&self) -> Option<TagPair<'a>> {
        match *self {
            MatchOutcome::Paired { pair, .. } => Some(pair),
            _ => None,
        }
    }

    /// Zero, one or two character ranges to highlight, in document order.
    pub fn highlight_ranges(&self) -> Vec<Range<usize>> {
        match *self {
            MatchOutcome::NoTagAtCursor => Vec::new(),
            MatchOutcome::SelfClosing(token) | MatchOutcome::Unmatched(token) => {
                vec![token.span()]
            }
            MatchOutcome::Paired { pair, .. } => vec![pair.opening.span(), pair.closing.span()],
        }
    }
}

/// Finds the token containing `offset` (end inclusive). Tokens are sorted and
/// disjoint, so the first token whose end is at or past the offset is the only
/// candidate; at a shared boundary that is the token ending there.
pub fn token_at(tokens: &[TagToken], offset: usize) -> Option<usize> {
    let index = tokens.partition_point(|token| token.end_offset < offset);
    tokens
        .get(index)
        .filter(|token| token.contains(offset))
        .map(|_| index)
}

/// Finds the partner of `tokens[index]` without mutating the list.
pub fn find_partner(tokens: &[TagToken], index: usize) -> Option<usize> {
    let anchor = tokens.get(index)?;
    if anchor.is_self_closing {
        return None;
    }

    let mut depth = 0usize;
    if anchor.is_closing {
        for (candidate, token) in tokens[..index].iter().enumerate().rev() {
            if token.name != anchor.name || token.is_self_closing {
                continue;
            }
            if token.is_closing {
                depth += 1;
            } else if depth == 0 {
                return Some(candidate);
            } else {
                depth -= 1;
            }
        }
    } else {
        for (offset, token) in tokens[index + 1..].iter().enumerate() {
            if token.name != anchor.name || token.is_self_closing {
                continue;
            }
            if !token.is_closing {
                depth += 1;
            } else if depth == 0 {
                return Some(index + 1 + offset);
            } else {
                depth -= 1;
            }
        }
    }
    None
}

/// Resolves the tag under `offset` and its partner.
pub fn match_at(tokens: &[TagToken], offset: usize) -> MatchOutcome<'_> {
    let Some(index) = token_at(tokens, offset) else {
        return MatchOutcome::NoTagAtCursor;
    };
    let token = &tokens[index];
    if token.is_self_closing {
        return MatchOutcome::SelfClosing(token);
    }

    match find_partner(tokens, index) {
        Some(partner) if token.is_closing => MatchOutcome::Paired {
            pair: TagPair {
                opening: &tokens[partner],
                closing: token,
            },
            anchor: PairSide::Closing,
        },
        Some(partner) => MatchOutcome::Paired {
            pair: TagPair {
                opening: token,
                closing: &tokens[partner],
            },
            anchor: PairSide::Opening,
        },
        None => MatchOutcome::Unmatched(token),
    }
}
