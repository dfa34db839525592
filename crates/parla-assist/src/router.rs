//! Routing of free-text input to the generation service.
//!
//! Used only when a session has AI mode enabled. The hard requirement here
//! is that a generation failure never leaves the conversation without a next
//! action: the router returns a static apology turn with recovery options
//! instead of propagating the error.

use std::time::Instant;

use tracing::warn;

use parla_core::{ChatTurn, OptionRef, Product};

use crate::generator::TextGenerator;

/// Apology shown when the generation call fails for any reason.
pub const APOLOGY_TEXT: &str =
    "Desculpe, não consegui gerar uma resposta agora. Você pode tentar novamente ou voltar ao menu.";

/// Recovery option labels offered with the apology.
pub const RETRY_LABEL: &str = "Tentar novamente";
pub const BACK_TO_MENU_LABEL: &str = "Voltar ao menu";
pub const DISABLE_AI_LABEL: &str = "Desativar IA";

/// Control option ids the orchestrator recognizes while AI mode is on.
pub const OPTION_RETRY: &str = "ai:retry";
pub const OPTION_BACK_TO_MENU: &str = "ai:menu";
pub const OPTION_DISABLE: &str = "ai:disable";

/// Context threaded into every generation call: who is asking and what the
/// portal sells.
#[derive(Clone, Debug, Default)]
pub struct RouteContext {
    pub user_name: String,
    pub products: Vec<Product>,
}

impl RouteContext {
    /// The context string handed to the generation service.
    pub fn build(&self) -> String {
        let names: Vec<&str> = self.products.iter().map(|p| p.name.as_str()).collect();
        format!(
            "Você é o assistente de um portal de parceiros. Produtos disponíveis: {}. \
             Você está falando com {}.",
            if names.is_empty() {
                "nenhum".to_string()
            } else {
                names.join(", ")
            },
            self.user_name,
        )
    }
}

/// A routed bot turn plus the usage figures threaded into its metric event.
#[derive(Clone, Debug)]
pub struct RoutedTurn {
    pub turn: ChatTurn,
    pub tokens_used: u32,
    pub response_time_ms: u32,
}

/// Routes free text to the generation service with a local fallback.
pub struct AssistRouter<G> {
    generator: G,
}

impl<G: TextGenerator> AssistRouter<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    /// The fixed buttons shown while AI mode is on.
    pub fn control_options() -> Vec<OptionRef> {
        vec![
            OptionRef {
                id: OPTION_BACK_TO_MENU.to_string(),
                label: BACK_TO_MENU_LABEL.to_string(),
            },
            OptionRef {
                id: OPTION_DISABLE.to_string(),
                label: DISABLE_AI_LABEL.to_string(),
            },
        ]
    }

    /// The recovery buttons offered with the apology turn.
    pub fn recovery_options() -> Vec<OptionRef> {
        vec![
            OptionRef {
                id: OPTION_RETRY.to_string(),
                label: RETRY_LABEL.to_string(),
            },
            OptionRef {
                id: OPTION_BACK_TO_MENU.to_string(),
                label: BACK_TO_MENU_LABEL.to_string(),
            },
        ]
    }

    /// Route one free-text message. Infallible by contract: any generation
    /// failure degrades to the apology turn.
    pub async fn route(&self, message: &str, context: &RouteContext) -> RoutedTurn {
        let started = Instant::now();
        let result = self.generator.generate(message, &context.build()).await;
        let elapsed_ms = started.elapsed().as_millis().min(u128::from(u32::MAX)) as u32;

        match result {
            Ok(generated) => {
                let mut turn = ChatTurn::bot(generated.text, Self::control_options());
                turn.generated = true;
                RoutedTurn {
                    turn,
                    tokens_used: generated.tokens_used,
                    response_time_ms: elapsed_ms,
                }
            }
            Err(e) => {
                warn!(error = %e, "Generation failed, serving apology turn");
                RoutedTurn {
                    turn: ChatTurn::bot(APOLOGY_TEXT, Self::recovery_options()),
                    tokens_used: 0,
                    response_time_ms: elapsed_ms,
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
