// ── Dashboard view description ──
//
// Declarative output consumed by the rendering host: sections hold
// cards, cards hold either a heading with action buttons or a reference
// to one resource. The serialized field names are the host contract.

use serde::{Deserialize, Serialize};

use crate::action::ActionDescriptor;

/// Width of every generated section, in host grid columns.
pub const SECTION_COLUMN_SPAN: u8 = 4;

/// A synthesized dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardView {
    pub sections: Vec<Section>,
}

impl DashboardView {
    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.sections.iter().flat_map(Section::cards)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Section {
    Grid { column_span: u8, cards: Vec<Card> },
}

impl Section {
    pub fn grid(cards: Vec<Card>) -> Self {
        Self::Grid {
            column_span: SECTION_COLUMN_SPAN,
            cards,
        }
    }

    pub fn cards(&self) -> &[Card] {
        match self {
            Self::Grid { cards, .. } => cards,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Card {
    #[serde(rename = "custom:docker-title-card")]
    Title {
        heading: String,
        #[serde(default)]
        actions: Vec<HeadingAction>,
    },
    #[serde(rename = "heading")]
    Heading {
        heading: String,
        #[serde(default)]
        actions: Vec<HeadingAction>,
    },
    #[serde(rename = "custom:docker-container-card")]
    Container { container_id: String, name: String },
    #[serde(rename = "custom:docker-image-card")]
    Image { entity_id: String, name: String },
    #[serde(rename = "custom:docker-volume-card")]
    Volume { entity_id: String, name: String },
}

/// A button in a heading card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HeadingAction {
    Button {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        icon: Option<String>,
        action: ActionDescriptor,
    },
}

impl HeadingAction {
    pub fn button(name: &str, icon: Option<&str>, action: ActionDescriptor) -> Self {
        Self::Button {
            name: name.into(),
            icon: icon.map(String::from),
            action,
        }
    }

    pub fn action(&self) -> &ActionDescriptor {
        match self {
            Self::Button { action, .. } => action,
        }
    }
}
