use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role the local participant plays in the room
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    /// Presenter recording or editing a walkthrough
    #[default]
    Edit,
    /// Passive viewer replaying a walkthrough
    View,
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentRole::Edit => write!(f, "edit"),
            AgentRole::View => write!(f, "view"),
        }
    }
}

impl FromStr for AgentRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "edit" => Ok(AgentRole::Edit),
            "view" => Ok(AgentRole::View),
            other => anyhow::bail!("unknown agent type '{}' (expected edit or view)", other),
        }
    }
}

/// Identifiers for one presentation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionParams {
    pub brdge_id: Option<String>,
    pub num_slides: u32,
    pub api_base_url: Option<String>,
    /// 1-based
    pub current_slide: u32,
    pub user_id: String,
}

impl SessionParams {
    pub fn new(
        brdge_id: impl Into<String>,
        num_slides: u32,
        api_base_url: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            brdge_id: Some(brdge_id.into()),
            num_slides,
            api_base_url: Some(api_base_url.into()),
            current_slide: 1,
            user_id: user_id.into(),
        }
    }

    /// Id, a positive slide count and an asset base URL are all present
    pub fn has_required(&self) -> bool {
        self.brdge_id.as_deref().is_some_and(|id| !id.is_empty())
            && self.num_slides > 0
            && self.api_base_url.as_deref().is_some_and(|url| !url.is_empty())
    }

    /// Asset URL for a slide, empty when parameters are missing
    pub fn slide_url(&self, slide: u32) -> String {
        match (&self.api_base_url, &self.brdge_id) {
            (Some(base), Some(id)) if slide > 0 => {
                format!("{}/brdges/{}/slides/{}", base.trim_end_matches('/'), id, slide)
            }
            _ => String::new(),
        }
    }

    pub fn current_slide_url(&self) -> String {
        self.slide_url(self.current_slide)
    }

    /// Move to `slide`, clamped to `1..=num_slides`. Returns whether it changed.
    pub fn go_to(&mut self, slide: u32) -> bool {
        let target = if self.num_slides == 0 {
            1
        } else {
            slide.clamp(1, self.num_slides)
        };
        let changed = target != self.current_slide;
        self.current_slide = target;
        changed
    }

    pub fn next(&mut self) -> bool {
        if self.current_slide < self.num_slides {
            self.go_to(self.current_slide + 1)
        } else {
            false
        }
    }

    pub fn prev(&mut self) -> bool {
        if self.current_slide > 1 {
            self.go_to(self.current_slide - 1)
        } else {
            false
        }
    }
}
