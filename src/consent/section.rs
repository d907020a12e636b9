//! Consent sections as served by the backend, plus their view state.

use crate::base::consenterror::ConsentError;
use serde::{Deserialize, Serialize};

pub const ICON_EXPANDED: &str = "utility:chevrondown";
pub const ICON_COLLAPSED: &str = "utility:chevronright";

/// One cookie category the visitor can opt in or out of.
///
/// Read-only: nothing in here is ever sent back to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConsentSection {
    #[serde(rename = "SectionName")]
    pub section_id: String,
    #[serde(rename = "SectionDescription", default)]
    pub label: String,
    #[serde(rename = "RelatedAuthorizationFormId", default)]
    pub related_form_id: Option<String>,
    #[serde(rename = "DefaultValue", default)]
    pub default_value: Option<bool>,
    /// Cookies grouped under this section.
    #[serde(rename = "Children", default)]
    pub children: Vec<SectionCookie>,
}

/// A cookie listed under a section.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SectionCookie {
    pub name: String,
    pub description: String,
    pub domain: String,
}

impl ConsentSection {
    pub fn new(section_id: impl Into<String>, form_id: impl Into<String>, default: bool) -> Self {
        Self {
            section_id: section_id.into(),
            related_form_id: Some(form_id.into()),
            default_value: Some(default),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>) -> Self {
        self.children.push(SectionCookie {
            name: name.into(),
            ..Default::default()
        });
        self
    }

    /// The form id and default the preference store is seeded with.
    pub fn seed(&self) -> Result<(&str, bool), ConsentError> {
        let form_id = self
            .related_form_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ConsentError::malformed_section(&self.section_id, "related form id"))?;
        let default = self
            .default_value
            .ok_or_else(|| ConsentError::malformed_section(&self.section_id, "default value"))?;
        Ok((form_id, default))
    }

    pub fn cookie_names(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(|c| c.name.as_str())
    }
}

/// A section as rendered: data plus the local expand/collapse flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionView {
    pub section: ConsentSection,
    pub expanded: bool,
}

impl SectionView {
    pub fn new(section: ConsentSection) -> Self {
        Self {
            section,
            expanded: false,
        }
    }

    pub fn toggle(&mut self) {
        self.expanded = !self.expanded;
    }

    pub fn icon(&self) -> &'static str {
        if self.expanded {
            ICON_EXPANDED
        } else {
            ICON_COLLAPSED
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        let raw = r#"[{
            "SectionName": "Analytics",
            "SectionDescription": "Usage statistics",
            "RelatedAuthorizationFormId": "0cI000001",
            "DefaultValue": false,
            "Children": [{ "Name": "_ga", "Description": "Google", "Domain": ".acme.com" }]
        }]"#;
        let sections: Vec<ConsentSection> = serde_json::from_str(raw).unwrap();
        assert_eq!(sections[0].section_id, "Analytics");
        assert_eq!(sections[0].seed().unwrap(), ("0cI000001", false));
        assert_eq!(sections[0].cookie_names().collect::<Vec<_>>(), vec!["_ga"]);
    }

    #[test]
    fn test_missing_fields_are_malformed() {
        let sections: Vec<ConsentSection> =
            serde_json::from_str(r#"[{ "SectionName": "Ads", "DefaultValue": true }]"#).unwrap();
        assert_eq!(
            sections[0].seed(),
            Err(ConsentError::malformed_section("Ads", "related form id"))
        );

        let no_default = ConsentSection {
            section_id: "Ads".into(),
            related_form_id: Some("f".into()),
            ..Default::default()
        };
        assert!(matches!(
            no_default.seed(),
            Err(ConsentError::MalformedSection { field: "default value", .. })
        ));
    }

    #[test]
    fn test_toggle_icon() {
        let mut view = SectionView::new(ConsentSection::new("Ads", "f", true));
        assert_eq!(view.icon(), ICON_COLLAPSED);
        view.toggle();
        assert_eq!(view.icon(), ICON_EXPANDED);
    }
}
