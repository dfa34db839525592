//! The deterministic dialogue state machine.
//!
//! Resolves one user action (button click or free text) against the
//! published catalog and produces the next bot turn. Owns no I/O: logging
//! and AI routing live above this layer.

use std::sync::Arc;

use parla_core::{ChatTurn, Session};

use crate::catalog::{FlowCatalog, FlowNode, OptionAction};
use crate::error::FlowError;

/// Shown when free text matches no keyword of the current node. The current
/// options are re-offered and the cursor stays put, so a session can never
/// deadlock.
pub const NO_MATCH_TEXT: &str =
    "Desculpe, não entendi. Você pode escolher uma das opções abaixo:";

/// One user action, as the UI reports it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    /// A button click; the option id is already known.
    Option(String),
    /// Typed free text.
    Text(String),
}

/// Resolves user input to the next bot turn over a published catalog.
///
/// States are flow ids; the initial state is `initial`; there is no terminal
/// state — the tree is circular by design.
#[derive(Clone)]
pub struct FlowEngine {
    catalog: Arc<FlowCatalog>,
}

impl FlowEngine {
    pub fn new(catalog: Arc<FlowCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &FlowCatalog {
        &self.catalog
    }

    /// The opening bot turn: the `initial` node's prompt and options.
    pub fn greeting(&self) -> ChatTurn {
        let node = self.catalog.initial();
        ChatTurn::bot(node.prompt_text.clone(), node.option_refs())
    }

    /// Resolve one user action, mutating the session cursor as the catalog
    /// dictates.
    ///
    /// Button clicks on redirect options move the cursor and emit the target
    /// node; clicks on response options emit canned text and leave the menu
    /// valid. Free text resolves first-match-wins over the node's keyword
    /// table; no match re-offers the current options without advancing.
    pub fn resolve(&self, session: &mut Session, input: Input) -> Result<ChatTurn, FlowError> {
        let node = self
            .catalog
            .get(&session.flow_id)
            .ok_or_else(|| FlowError::UnknownFlow(session.flow_id.clone()))?;

        match input {
            Input::Option(option_id) => {
                let option =
                    node.find_option(&option_id)
                        .ok_or_else(|| FlowError::UnknownOption {
                            flow: session.flow_id.clone(),
                            option_id: option_id.clone(),
                        })?;
                self.apply(session, node, option.action.clone())
            }
            Input::Text(text) => match match_keyword(node, &text) {
                Some(action) => self.apply(session, node, action),
                None => Ok(ChatTurn::bot(NO_MATCH_TEXT, node.option_refs())),
            },
        }
    }

    fn apply(
        &self,
        session: &mut Session,
        current: &FlowNode,
        action: OptionAction,
    ) -> Result<ChatTurn, FlowError> {
        match action {
            OptionAction::Redirect { target } => {
                let next = self
                    .catalog
                    .get(&target)
                    .ok_or_else(|| FlowError::UnknownFlow(target.clone()))?;
                session.flow_id = target;
                Ok(ChatTurn::bot(next.prompt_text.clone(), next.option_refs()))
            }
            // Canned answer; the menu is not consumed.
            OptionAction::Respond { text } => Ok(ChatTurn::bot(text, current.option_refs())),
        }
    }
}

/// Case-insensitive substring match over the node's keyword table, in source
/// order. First matching keyword wins; publish-time validation keeps the
/// sets mutually exclusive.
fn match_keyword(node: &FlowNode, text: &str) -> Option<OptionAction> {
    let lowered = text.to_lowercase();
    for rule in &node.keywords {
        for keyword in &rule.keywords {
            if lowered.contains(&keyword.to_lowercase()) {
                return Some(rule.action.clone());
            }
        }
    }
    None
}

// =============================================================================
// Tests
// =============================================================================
