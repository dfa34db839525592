//! Session orchestrator: central coordinator wiring the flow engine, the AI
//! fallback router, and the interaction logger.
//!
//! Owns the live sessions for one process. Every user action produces a
//! user/bot turn pair, and both turns are logged fire-and-forget.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use parla_assist::router::{
    AssistRouter, RouteContext, OPTION_BACK_TO_MENU, OPTION_DISABLE, OPTION_RETRY,
};
use parla_assist::TextGenerator;
use parla_core::config::ChatConfig;
use parla_core::{ChatMetricEvent, ChatTurn, Identity, Product, Session};
use parla_telemetry::InteractionLogger;

use crate::catalog::FlowCatalog;
use crate::engine::{FlowEngine, Input};
use crate::error::FlowError;

/// Shown when AI mode is switched on.
const AI_ENABLED_TEXT: &str =
    "Modo IA ativado! Pode escrever sua pergunta que eu respondo por aqui.";

/// Shown when AI mode is switched off and the menu comes back.
const AI_DISABLED_TEXT: &str = "Modo IA desativado. Voltando às opções do menu:";

/// Central coordinator for live conversations.
pub struct Orchestrator<G> {
    engine: FlowEngine,
    router: AssistRouter<G>,
    logger: InteractionLogger,
    products: Vec<Product>,
    sessions: Mutex<HashMap<Uuid, Session>>,
    config: ChatConfig,
    assist_enabled: bool,
}

impl<G: TextGenerator> Orchestrator<G> {
    pub fn new(
        catalog: Arc<FlowCatalog>,
        router: AssistRouter<G>,
        logger: InteractionLogger,
        products: Vec<Product>,
        config: ChatConfig,
        assist_enabled: bool,
    ) -> Self {
        Self {
            engine: FlowEngine::new(catalog),
            router,
            logger,
            products,
            sessions: Mutex::new(HashMap::new()),
            config,
            assist_enabled,
        }
    }

    /// Start a conversation for `identity` and return the greeting turn.
    pub fn start_session(&self, identity: Identity) -> Result<(Uuid, ChatTurn), FlowError> {
        if !self.config.enabled {
            return Err(FlowError::Disabled);
        }

        let mut session = Session::new(identity);
        let greeting = self.engine.greeting();
        session.turns.push(greeting.clone());
        self.logger
            .log(ChatMetricEvent::for_turn(&session, &greeting));

        let id = session.id;
        self.lock_sessions()?.insert(id, session);
        tracing::debug!(session_id = %id, "Session started");
        Ok((id, greeting))
    }

    /// Handle typed free text: AI route when the session has AI mode on,
    /// keyword resolution over the rule tree otherwise.
    pub async fn handle_text(
        &self,
        session_id: Uuid,
        text: &str,
    ) -> Result<ChatTurn, FlowError> {
        if !self.config.enabled {
            return Err(FlowError::Disabled);
        }
        if text.is_empty() {
            return Err(FlowError::EmptyMessage);
        }
        if text.len() > self.config.max_message_length {
            return Err(FlowError::MessageTooLong(self.config.max_message_length));
        }

        let (ai_mode, user_name) = {
            let mut sessions = self.lock_sessions()?;
            let session = sessions
                .get_mut(&session_id)
                .ok_or(FlowError::SessionNotFound(session_id))?;

            let user_turn = ChatTurn::user(text);
            self.logger
                .log(ChatMetricEvent::for_turn(session, &user_turn));
            session.turns.push(user_turn);

            (
                session.ai_mode && self.assist_enabled,
                session.identity.user_name.clone(),
            )
        };

        if ai_mode {
            self.route_to_ai(session_id, text, user_name).await
        } else {
            let mut sessions = self.lock_sessions()?;
            let session = sessions
                .get_mut(&session_id)
                .ok_or(FlowError::SessionNotFound(session_id))?;
            let bot_turn = self
                .engine
                .resolve(session, Input::Text(text.to_string()))?;
            session.turns.push(bot_turn.clone());
            self.logger
                .log(ChatMetricEvent::for_turn(session, &bot_turn));
            Ok(bot_turn)
        }
    }

    /// Handle a button click. In AI mode only the fixed control options are
    /// valid; otherwise the click resolves against the current node.
    pub async fn handle_option(
        &self,
        session_id: Uuid,
        option_id: &str,
    ) -> Result<ChatTurn, FlowError> {
        if !self.config.enabled {
            return Err(FlowError::Disabled);
        }

        // AI-mode control options short-circuit the rule tree.
        let control = {
            let sessions = self.lock_sessions()?;
            let session = sessions
                .get(&session_id)
                .ok_or(FlowError::SessionNotFound(session_id))?;
            session.ai_mode
                && matches!(option_id, OPTION_RETRY | OPTION_BACK_TO_MENU | OPTION_DISABLE)
        };
        if control {
            return self.handle_control_option(session_id, option_id).await;
        }

        let mut sessions = self.lock_sessions()?;
        let session = sessions
            .get_mut(&session_id)
            .ok_or(FlowError::SessionNotFound(session_id))?;

        // Capture the label before resolving so the click event can carry it.
        let label = self
            .engine
            .catalog()
            .get(&session.flow_id)
            .and_then(|node| node.find_option(option_id))
            .map(|o| o.label.clone())
            .ok_or_else(|| FlowError::UnknownOption {
                flow: session.flow_id.clone(),
                option_id: option_id.to_string(),
            })?;

        let user_turn = ChatTurn::user(label.clone());
        let mut click_event = ChatMetricEvent::for_turn(session, &user_turn);
        click_event.selected_option = Some(label);
        self.logger.log(click_event);
        session.turns.push(user_turn);

        let bot_turn = self
            .engine
            .resolve(session, Input::Option(option_id.to_string()))?;
        session.turns.push(bot_turn.clone());
        self.logger
            .log(ChatMetricEvent::for_turn(session, &bot_turn));
        Ok(bot_turn)
    }

    /// Toggle AI mode for a session, returning the transition turn.
    pub fn set_ai_mode(&self, session_id: Uuid, enabled: bool) -> Result<ChatTurn, FlowError> {
        if enabled && !self.assist_enabled {
            return Err(FlowError::Disabled);
        }

        let mut sessions = self.lock_sessions()?;
        let session = sessions
            .get_mut(&session_id)
            .ok_or(FlowError::SessionNotFound(session_id))?;

        session.ai_mode = enabled;
        let bot_turn = if enabled {
            ChatTurn::bot(AI_ENABLED_TEXT, AssistRouter::<G>::control_options())
        } else {
            let node = self
                .engine
                .catalog()
                .get(&session.flow_id)
                .ok_or_else(|| FlowError::UnknownFlow(session.flow_id.clone()))?;
            ChatTurn::bot(
                format!("{} {}", AI_DISABLED_TEXT, node.prompt_text),
                node.option_refs(),
            )
        };

        session.turns.push(bot_turn.clone());
        self.logger
            .log(ChatMetricEvent::for_turn(session, &bot_turn));
        Ok(bot_turn)
    }

    /// Record a helpfulness vote on a bot turn. Appends a new event (the log
    /// is append-only); nothing is mutated.
    pub fn record_feedback(
        &self,
        session_id: Uuid,
        turn_id: Uuid,
        helpful: bool,
    ) -> Result<(), FlowError> {
        let sessions = self.lock_sessions()?;
        let session = sessions
            .get(&session_id)
            .ok_or(FlowError::SessionNotFound(session_id))?;

        let turn = session
            .turns
            .iter()
            .find(|t| t.id == turn_id)
            .ok_or_else(|| {
                FlowError::SessionState(format!("turn not found: {}", turn_id))
            })?;

        let mut event = ChatMetricEvent::for_turn(session, turn);
        event.id = Uuid::new_v4();
        event.was_helpful = Some(helpful);
        self.logger.log(event);
        Ok(())
    }

    /// Snapshot of one session.
    pub fn session(&self, session_id: Uuid) -> Option<Session> {
        self.lock_sessions().ok()?.get(&session_id).cloned()
    }

    /// Drop a session when its UI surface unmounts. In-flight log appends
    /// are not aborted.
    pub fn end_session(&self, session_id: Uuid) -> Result<(), FlowError> {
        self.lock_sessions()?
            .remove(&session_id)
            .map(|_| tracing::debug!(session_id = %session_id, "Session ended"))
            .ok_or(FlowError::SessionNotFound(session_id))
    }

    pub fn session_count(&self) -> usize {
        self.lock_sessions().map(|s| s.len()).unwrap_or(0)
    }

    // -- Private helpers --

    async fn handle_control_option(
        &self,
        session_id: Uuid,
        option_id: &str,
    ) -> Result<ChatTurn, FlowError> {
        match option_id {
            OPTION_BACK_TO_MENU => self.back_to_menu(session_id),
            OPTION_DISABLE => self.set_ai_mode(session_id, false),
            OPTION_RETRY => {
                let (last_user_text, user_name) = {
                    let sessions = self.lock_sessions()?;
                    let session = sessions
                        .get(&session_id)
                        .ok_or(FlowError::SessionNotFound(session_id))?;
                    let last = session
                        .turns
                        .iter()
                        .rev()
                        .find(|t| t.role == parla_core::Role::User)
                        .map(|t| t.content.clone());
                    (last, session.identity.user_name.clone())
                };

                match last_user_text {
                    Some(text) => self.route_to_ai(session_id, &text, user_name).await,
                    // Nothing to retry; fall back to the menu.
                    None => self.back_to_menu(session_id),
                }
            }
            other => Err(FlowError::SessionState(format!(
                "unknown control option: {}",
                other
            ))),
        }
    }

    /// Leave AI mode and put the conversation back at the menu root.
    fn back_to_menu(&self, session_id: Uuid) -> Result<ChatTurn, FlowError> {
        let mut sessions = self.lock_sessions()?;
        let session = sessions
            .get_mut(&session_id)
            .ok_or(FlowError::SessionNotFound(session_id))?;
        session.ai_mode = false;
        session.flow_id = parla_core::FlowId::initial();
        let greeting = self.engine.greeting();
        session.turns.push(greeting.clone());
        self.logger
            .log(ChatMetricEvent::for_turn(session, &greeting));
        Ok(greeting)
    }

    /// Route text to the generation service and record the routed turn. The
    /// sessions lock is not held across the await.
    async fn route_to_ai(
        &self,
        session_id: Uuid,
        text: &str,
        user_name: String,
    ) -> Result<ChatTurn, FlowError> {
        let context = RouteContext {
            user_name,
            products: self.products.clone(),
        };
        let routed = self.router.route(text, &context).await;

        let mut sessions = self.lock_sessions()?;
        let session = sessions
            .get_mut(&session_id)
            .ok_or(FlowError::SessionNotFound(session_id))?;

        session.turns.push(routed.turn.clone());
        let mut event = ChatMetricEvent::for_turn(session, &routed.turn);
        event.tokens_used = routed.tokens_used;
        event.response_time_ms = routed.response_time_ms;
        self.logger.log(event);
        Ok(routed.turn)
    }

    fn lock_sessions(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, Session>>, FlowError> {
        self.sessions
            .lock()
            .map_err(|e| FlowError::SessionState(format!("session lock poisoned: {}", e)))
    }
}

// =============================================================================
// Tests
// =============================================================================
