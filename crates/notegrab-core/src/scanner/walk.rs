//! The token walk: a pure step function from (state, token) to (state, items).
//!
//! The current category lives in [`ScanState`] and is threaded through every
//! step, so a walk can be replayed over a canned token sequence.

use std::collections::VecDeque;

use super::token::PageToken;
use super::DiscoveredItem;
use crate::url_model::{normalize_category, normalize_text, LinkPattern};

/// Walk state between tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanState {
    /// Category of the most recent heading; empty before the first one.
    pub category: String,
    heading_pending: bool,
    anchor: Option<OpenAnchor>,
}

/// An `<a>` that has been opened but not closed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct OpenAnchor {
    /// Remote ids still waiting for a title, in attribute order.
    pending: VecDeque<String>,
    last_title: Option<String>,
}

impl ScanState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while an anchor match is waiting for its title.
    pub fn has_pending_match(&self) -> bool {
        self.anchor.as_ref().is_some_and(|a| !a.pending.is_empty())
    }
}

/// Advance the walk by one token.
pub fn step(
    mut state: ScanState,
    token: &PageToken,
    links: &LinkPattern,
) -> (ScanState, Vec<DiscoveredItem>) {
    let mut items = Vec::new();
    match token {
        PageToken::HeadingOpen => state.heading_pending = true,
        PageToken::HeadingClose => state.heading_pending = false,
        PageToken::AnchorOpen { values } => {
            // An unclosed previous anchor ends here.
            close_anchor(&mut state, &mut items);
            let pending: VecDeque<String> = values
                .iter()
                .filter_map(|v| links.remote_id(v))
                .map(str::to_string)
                .collect();
            state.anchor = Some(OpenAnchor {
                pending,
                last_title: None,
            });
        }
        PageToken::AnchorClose => close_anchor(&mut state, &mut items),
        PageToken::Text(raw) => {
            let text = normalize_text(raw);
            if text.is_empty() {
                return (state, items);
            }
            let category = state.category.clone();
            match state.anchor.as_mut() {
                Some(anchor) if !anchor.pending.is_empty() => {
                    if let Some(remote_id) = anchor.pending.pop_front() {
                        items.push(DiscoveredItem {
                            category,
                            title: text.clone(),
                            remote_id,
                        });
                    }
                    anchor.last_title = Some(text);
                }
                _ if state.heading_pending => {
                    state.category = normalize_category(&text);
                    state.heading_pending = false;
                }
                _ => {}
            }
        }
        PageToken::End => {
            close_anchor(&mut state, &mut items);
            state.heading_pending = false;
        }
    }
    (state, items)
}

/// Emit leftover matches of the open anchor under its last title; without any
/// title the matches are dropped.
fn close_anchor(state: &mut ScanState, items: &mut Vec<DiscoveredItem>) {
    let Some(anchor) = state.anchor.take() else {
        return;
    };
    match anchor.last_title {
        Some(title) => items.extend(anchor.pending.into_iter().map(|remote_id| DiscoveredItem {
            category: state.category.clone(),
            title: title.clone(),
            remote_id,
        })),
        None if !anchor.pending.is_empty() => {
            tracing::debug!(
                dropped = anchor.pending.len(),
                "document link without title text skipped"
            );
        }
        None => {}
    }
}
