//! The versioned flow catalog: the ground truth the engine traverses.
//!
//! A catalog is edited as a [`CatalogDraft`] and becomes a [`FlowCatalog`]
//! only through [`CatalogDraft::publish`], which validates referential
//! integrity and keyword exclusivity up front. A published catalog is
//! immutable; traversal never re-validates.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use parla_core::{FlowId, OptionRef, ParlaError, Product};

// =============================================================================
// Node building blocks
// =============================================================================

/// What selecting an option (or matching a keyword) does.
///
/// Exactly one of the two, by construction: a redirect moves the cursor, a
/// response shows canned text and leaves the cursor where it is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionAction {
    /// Move the conversation to another flow.
    Redirect { target: FlowId },
    /// Show canned text without changing flow.
    Respond { text: String },
}

/// One button on a dialogue node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowOption {
    /// Unique within the owning node.
    pub id: String,
    /// Display text; also what option-popularity analytics group by.
    pub label: String,
    pub action: OptionAction,
}

impl FlowOption {
    pub fn redirect(id: &str, label: &str, target: impl Into<FlowId>) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            action: OptionAction::Redirect {
                target: target.into(),
            },
        }
    }

    pub fn respond(id: &str, label: &str, text: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            action: OptionAction::Respond {
                text: text.to_string(),
            },
        }
    }

    /// The id/label pair shown to the UI.
    pub fn to_ref(&self) -> OptionRef {
        OptionRef {
            id: self.id.clone(),
            label: self.label.clone(),
        }
    }
}

/// One row of a node's free-text recognition table.
///
/// Keywords are matched case-insensitively as substrings of the user input,
/// in source order. Publish-time validation guarantees the keyword sets of a
/// node are mutually exclusive, so order only decides cosmetics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub keywords: Vec<String>,
    pub action: OptionAction,
}

impl KeywordRule {
    pub fn new(keywords: &[&str], action: OptionAction) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            action,
        }
    }
}

/// One node of the dialogue decision tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: FlowId,
    /// Shown verbatim when the conversation arrives at this node.
    pub prompt_text: String,
    pub options: Vec<FlowOption>,
    #[serde(default)]
    pub keywords: Vec<KeywordRule>,
}

impl FlowNode {
    pub fn new(id: impl Into<FlowId>, prompt_text: &str) -> Self {
        Self {
            id: id.into(),
            prompt_text: prompt_text.to_string(),
            options: Vec::new(),
            keywords: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: Vec<FlowOption>) -> Self {
        self.options = options;
        self
    }

    pub fn with_keywords(mut self, keywords: Vec<KeywordRule>) -> Self {
        self.keywords = keywords;
        self
    }

    /// Find an option by id.
    pub fn find_option(&self, option_id: &str) -> Option<&FlowOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    /// The id/label pairs shown to the UI.
    pub fn option_refs(&self) -> Vec<OptionRef> {
        self.options.iter().map(FlowOption::to_ref).collect()
    }
}

// =============================================================================
// Publish-time validation
// =============================================================================

/// Rejections produced when publishing a draft.
///
/// Validation happens at publish time so that traversal can assume a
/// well-formed catalog.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog has no `initial` node")]
    MissingInitial,
    #[error("duplicate node id: {0}")]
    DuplicateNode(FlowId),
    #[error("node {node}: duplicate option id {option_id}")]
    DuplicateOptionId { node: FlowId, option_id: String },
    #[error("node {node}: option {option_id} redirects to unknown flow {target}")]
    DanglingTarget {
        node: FlowId,
        option_id: String,
        target: FlowId,
    },
    #[error("node {node}: keyword rule redirects to unknown flow {target}")]
    DanglingKeywordTarget { node: FlowId, target: FlowId },
    #[error("node {node}: keyword {keyword:?} appears in more than one rule")]
    OverlappingKeywords { node: FlowId, keyword: String },
    #[error("node {node}: empty keyword")]
    EmptyKeyword { node: FlowId },
}

impl From<CatalogError> for ParlaError {
    fn from(err: CatalogError) -> Self {
        ParlaError::Catalog(err.to_string())
    }
}

// =============================================================================
// Draft -> published catalog
// =============================================================================

/// An editable node set. Becomes a [`FlowCatalog`] via [`publish`].
///
/// [`publish`]: CatalogDraft::publish
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CatalogDraft {
    nodes: Vec<FlowNode>,
    /// Version the published catalog will carry.
    version: u32,
}

impl CatalogDraft {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            version: 1,
        }
    }

    /// Add or replace the node with the same id.
    pub fn upsert(&mut self, node: FlowNode) -> &mut Self {
        if let Some(existing) = self.nodes.iter_mut().find(|n| n.id == node.id) {
            *existing = node;
        } else {
            self.nodes.push(node);
        }
        self
    }

    pub fn remove(&mut self, id: &FlowId) -> Option<FlowNode> {
        let idx = self.nodes.iter().position(|n| &n.id == id)?;
        Some(self.nodes.remove(idx))
    }

    /// Validate the draft and freeze it into an immutable catalog.
    ///
    /// Checks, in order: `initial` exists, node ids unique, option ids unique
    /// within each node, every redirect target (options and keyword rules)
    /// resolves, and keyword sets within a node are mutually exclusive
    /// (case-insensitive).
    pub fn publish(self) -> Result<FlowCatalog, CatalogError> {
        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();

        if !ids.contains(FlowId::INITIAL) {
            return Err(CatalogError::MissingInitial);
        }
        if ids.len() != self.nodes.len() {
            let mut seen = HashSet::new();
            for node in &self.nodes {
                if !seen.insert(node.id.as_str()) {
                    return Err(CatalogError::DuplicateNode(node.id.clone()));
                }
            }
        }

        for node in &self.nodes {
            let mut option_ids = HashSet::new();
            for option in &node.options {
                if !option_ids.insert(option.id.as_str()) {
                    return Err(CatalogError::DuplicateOptionId {
                        node: node.id.clone(),
                        option_id: option.id.clone(),
                    });
                }
                if let OptionAction::Redirect { target } = &option.action {
                    if !ids.contains(target.as_str()) {
                        return Err(CatalogError::DanglingTarget {
                            node: node.id.clone(),
                            option_id: option.id.clone(),
                            target: target.clone(),
                        });
                    }
                }
            }

            let mut seen_keywords: HashSet<String> = HashSet::new();
            for rule in &node.keywords {
                if let OptionAction::Redirect { target } = &rule.action {
                    if !ids.contains(target.as_str()) {
                        return Err(CatalogError::DanglingKeywordTarget {
                            node: node.id.clone(),
                            target: target.clone(),
                        });
                    }
                }
                for keyword in &rule.keywords {
                    let normalized = keyword.trim().to_lowercase();
                    if normalized.is_empty() {
                        return Err(CatalogError::EmptyKeyword {
                            node: node.id.clone(),
                        });
                    }
                    if !seen_keywords.insert(normalized) {
                        return Err(CatalogError::OverlappingKeywords {
                            node: node.id.clone(),
                            keyword: keyword.clone(),
                        });
                    }
                }
            }
        }

        let nodes = self
            .nodes
            .into_iter()
            .map(|n| (n.id.as_str().to_string(), n))
            .collect();

        Ok(FlowCatalog {
            version: self.version,
            nodes,
        })
    }
}

/// A published, immutable catalog. The only way to change it is to revise
/// into a new draft and publish again, which bumps the version.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlowCatalog {
    version: u32,
    nodes: HashMap<String, FlowNode>,
}

impl FlowCatalog {
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn get(&self, id: &FlowId) -> Option<&FlowNode> {
        self.nodes.get(id.as_str())
    }

    /// Guaranteed present by publish-time validation.
    pub fn initial(&self) -> &FlowNode {
        &self.nodes[FlowId::INITIAL]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Start a new draft from this catalog's nodes, to be published as the
    /// next version.
    pub fn revise(&self) -> CatalogDraft {
        let mut nodes: Vec<FlowNode> = self.nodes.values().cloned().collect();
        nodes.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        CatalogDraft {
            nodes,
            version: self.version + 1,
        }
    }
}

// =============================================================================
// Default catalog
// =============================================================================

/// Build the stock Portuguese-language catalog from the injected product
/// list: menu root, dúvidas, and one pitch node per product.
///
/// Every leaf offers a way back to the menu, so the tree is circular and no
/// node is terminal.
pub fn default_catalog(products: &[Product]) -> FlowCatalog {
    let mut draft = CatalogDraft::new();

    let menu_options = vec![
        FlowOption::redirect("duvidas", "Tirar uma dúvida", "duvidas"),
        FlowOption::redirect("pitch", "Pedir um pitch", "pitch"),
        FlowOption::respond(
            "indicacoes",
            "Como funcionam as indicações?",
            "Você indica um cliente pelo portal e acompanha o status da \
             indicação na aba Indicações. A comissão é creditada quando o \
             contrato é assinado.",
        ),
    ];
    let menu_keywords = vec![
        KeywordRule::new(
            &["dúvida", "duvida", "ajuda"],
            OptionAction::Redirect {
                target: FlowId::new("duvidas"),
            },
        ),
        KeywordRule::new(
            &["pitch", "apresenta"],
            OptionAction::Redirect {
                target: FlowId::new("pitch"),
            },
        ),
        KeywordRule::new(
            &["indica"],
            OptionAction::Respond {
                text: "Você indica um cliente pelo portal e acompanha o status \
                       da indicação na aba Indicações."
                    .to_string(),
            },
        ),
    ];

    draft.upsert(
        FlowNode::new(
            FlowId::initial(),
            "Olá! Sou o assistente do portal de parceiros. Como posso ajudar?",
        )
        .with_options(menu_options)
        .with_keywords(menu_keywords),
    );

    draft.upsert(
        FlowNode::new(
            "duvidas",
            "Claro! Escolha o assunto da sua dúvida:",
        )
        .with_options(vec![
            FlowOption::respond(
                "comissao",
                "Comissões",
                "As comissões são calculadas sobre o valor do contrato e \
                 pagas até o dia 10 do mês seguinte à assinatura.",
            ),
            FlowOption::respond(
                "cadastro",
                "Cadastro de clientes",
                "Para cadastrar um cliente, acesse Indicações > Nova \
                 indicação e preencha os dados da empresa.",
            ),
            FlowOption::redirect("voltar", "Voltar", FlowId::initial()),
        ])
        .with_keywords(vec![
            KeywordRule::new(
                &["comiss"],
                OptionAction::Respond {
                    text: "As comissões são pagas até o dia 10 do mês seguinte \
                           à assinatura do contrato."
                        .to_string(),
                },
            ),
            KeywordRule::new(
                &["voltar", "menu"],
                OptionAction::Redirect {
                    target: FlowId::initial(),
                },
            ),
        ]),
    );

    // One pitch node per product, reachable from the pitch chooser.
    let mut pitch_options = Vec::new();
    let mut pitch_keywords = Vec::new();
    for (i, product) in products.iter().enumerate() {
        let node_id = format!("pitch:{}", product.id);
        pitch_options.push(FlowOption::redirect(
            &format!("p{}", i + 1),
            &product.name,
            node_id.as_str(),
        ));
        pitch_keywords.push(KeywordRule::new(
            &[product.name.to_lowercase().as_str()],
            OptionAction::Redirect {
                target: FlowId::new(node_id.clone()),
            },
        ));

        draft.upsert(
            FlowNode::new(
                node_id.as_str(),
                &format!(
                    "{}: {} Quer ver o pitch de outro produto?",
                    product.name, product.description
                ),
            )
            .with_options(vec![
                FlowOption::redirect("outro", "Outro produto", "pitch"),
                FlowOption::redirect("voltar", "Voltar ao menu", FlowId::initial()),
            ])
            .with_keywords(vec![KeywordRule::new(
                &["voltar", "menu"],
                OptionAction::Redirect {
                    target: FlowId::initial(),
                },
            )]),
        );
    }
    pitch_keywords.push(KeywordRule::new(
        &["voltar", "menu"],
        OptionAction::Redirect {
            target: FlowId::initial(),
        },
    ));
    pitch_options.push(FlowOption::redirect(
        "voltar",
        "Voltar",
        FlowId::initial(),
    ));

    draft.upsert(
        FlowNode::new("pitch", "Sobre qual produto você quer um pitch?")
            .with_options(pitch_options)
            .with_keywords(pitch_keywords),
    );

    // The stock catalog is curated; a publish failure here is a bug.
    draft.publish().expect("default catalog is valid")
}

// =============================================================================
// Tests
// =============================================================================
