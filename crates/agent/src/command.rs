use classifier::category::{
    DELETE_CATEGORIES_DIRECTIVE, LOAD_SNAPSHOT_DIRECTIVE, PURGE_TOKENS_DIRECTIVE, UNTRAIN_PREFIX,
};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainingTarget {
    Train(String),
    Untrain(String),
}

impl TrainingTarget {
    pub fn category(&self) -> &str {
        match self {
            Self::Train(category) | Self::Untrain(category) => category,
        }
    }
}

/// What an event asks for, decoded from its `nb_cats` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    LoadSnapshot,
    DeleteCategories,
    PurgeTokens,
    Train(Vec<TrainingTarget>),
    Classify,
}

impl Command {
    pub fn decode(categories: &str) -> Self {
        let mut fields = categories.split_whitespace();
        let Some(first) = fields.next() else {
            return Self::Classify;
        };

        let directive = match first {
            LOAD_SNAPSHOT_DIRECTIVE => Some(Self::LoadSnapshot),
            DELETE_CATEGORIES_DIRECTIVE => Some(Self::DeleteCategories),
            PURGE_TOKENS_DIRECTIVE => Some(Self::PurgeTokens),
            _ => None,
        };
        if let Some(directive) = directive {
            let ignored = fields.count();
            if ignored > 0 {
                warn!(directive = first, ignored, "ignoring fields after directive");
            }
            return directive;
        }

        let targets = categories
            .split_whitespace()
            .map(|field| match field.strip_prefix(UNTRAIN_PREFIX) {
                Some(category) => TrainingTarget::Untrain(category.to_string()),
                None => TrainingTarget::Train(field.to_string()),
            })
            .collect();
        Self::Train(targets)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadSnapshot => "load_snapshot",
            Self::DeleteCategories => "delete_categories",
            Self::PurgeTokens => "purge_tokens",
            Self::Train(_) => "train",
            Self::Classify => "classify",
        }
    }
}
