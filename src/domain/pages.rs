//! Editable page documents, one typed shape per page key.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{collections::ensure_unique, error::DomainError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKey {
    Homepage,
    About,
    Contact,
    Footer,
}

impl PageKey {
    pub const ALL: [PageKey; 4] = [
        PageKey::Homepage,
        PageKey::About,
        PageKey::Contact,
        PageKey::Footer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PageKey::Homepage => "homepage",
            PageKey::About => "about",
            PageKey::Contact => "contact",
            PageKey::Footer => "footer",
        }
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageKey {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "homepage" => Ok(PageKey::Homepage),
            "about" => Ok(PageKey::About),
            "contact" => Ok(PageKey::Contact),
            "footer" => Ok(PageKey::Footer),
            _ => Err(DomainError::not_found("page")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct HomepageContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub hero: HeroSection,
    pub features: Vec<Feature>,
    pub carousel: CarouselSection,
    pub customers: CustomersSection,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct HeroSection {
    pub title: String,
    pub subtitle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Feature {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct CarouselSection {
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct CustomersSection {
    pub title: String,
    pub logos: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct AboutContent {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ContactContent {
    pub address: String,
    pub phone: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_url: Option<String>,
    pub hours: Vec<OpeningHours>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OpeningHours {
    pub days: String,
    pub hours: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct FooterContent {
    pub tagline: String,
    pub copyright: String,
    pub social: Vec<SocialLink>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SocialLink {
    pub label: String,
    pub url: String,
}

/// Content of one page, validated against the field set of its key.
#[derive(Debug, Clone, PartialEq)]
pub enum PageContent {
    Homepage(HomepageContent),
    About(AboutContent),
    Contact(ContactContent),
    Footer(FooterContent),
}

impl PageContent {
    pub fn key(&self) -> PageKey {
        match self {
            PageContent::Homepage(_) => PageKey::Homepage,
            PageContent::About(_) => PageKey::About,
            PageContent::Contact(_) => PageKey::Contact,
            PageContent::Footer(_) => PageKey::Footer,
        }
    }

    /// Interpret a raw JSON document as the content of `key`.
    pub fn from_value(key: PageKey, value: Value) -> Result<Self, DomainError> {
        if !value.is_object() {
            return Err(DomainError::validation(format!(
                "{key} content must be a JSON object"
            )));
        }

        let invalid =
            |err: serde_json::Error| DomainError::validation(format!("invalid {key} content: {err}"));

        Ok(match key {
            PageKey::Homepage => {
                let content: HomepageContent = serde_json::from_value(value).map_err(invalid)?;
                content.check_identifiers()?;
                PageContent::Homepage(content)
            }
            PageKey::About => PageContent::About(serde_json::from_value(value).map_err(invalid)?),
            PageKey::Contact => {
                PageContent::Contact(serde_json::from_value(value).map_err(invalid)?)
            }
            PageKey::Footer => PageContent::Footer(serde_json::from_value(value).map_err(invalid)?),
        })
    }

    pub fn to_value(&self) -> Result<Value, DomainError> {
        let encoded = match self {
            PageContent::Homepage(content) => serde_json::to_value(content),
            PageContent::About(content) => serde_json::to_value(content),
            PageContent::Contact(content) => serde_json::to_value(content),
            PageContent::Footer(content) => serde_json::to_value(content),
        };
        encoded.map_err(|err| DomainError::invariant(format!("failed to encode content: {err}")))
    }

    /// Encoded document as a JSON object map.
    pub fn to_map(&self) -> Result<Map<String, Value>, DomainError> {
        match self.to_value()? {
            Value::Object(map) => Ok(map),
            _ => Err(DomainError::invariant("page content did not encode to an object")),
        }
    }

    /// Built-in content served until an operator saves the page for the first time.
    pub fn default_for(key: PageKey) -> Self {
        match key {
            PageKey::Homepage => PageContent::Homepage(HomepageContent {
                logo: None,
                hero: HeroSection {
                    title: "Welcome to our kitchen".to_string(),
                    subtitle: "Seasonal dishes, cooked fresh every day".to_string(),
                    main_image: None,
                },
                features: vec![
                    Feature {
                        id: "halal".to_string(),
                        title: "Halal certified".to_string(),
                        description: "All meat is sourced from certified suppliers.".to_string(),
                        image: None,
                    },
                    Feature {
                        id: "fresh".to_string(),
                        title: "Fresh ingredients".to_string(),
                        description: "Produce is delivered every morning.".to_string(),
                        image: None,
                    },
                    Feature {
                        id: "delivery".to_string(),
                        title: "Delivery".to_string(),
                        description: "Order online and we bring it to you.".to_string(),
                        image: None,
                    },
                ],
                carousel: CarouselSection::default(),
                customers: CustomersSection {
                    title: "Trusted by".to_string(),
                    logos: Vec::new(),
                },
            }),
            PageKey::About => PageContent::About(AboutContent {
                title: "About us".to_string(),
                body: String::new(),
                image: None,
                highlights: Vec::new(),
            }),
            PageKey::Contact => PageContent::Contact(ContactContent::default()),
            PageKey::Footer => PageContent::Footer(FooterContent::default()),
        }
    }
}

impl HomepageContent {
    /// Feature ids and image collection entries must each be unique.
    fn check_identifiers(&self) -> Result<(), DomainError> {
        let mut seen = std::collections::HashSet::new();
        for feature in &self.features {
            if feature.id.trim().is_empty() {
                return Err(DomainError::validation("feature id must not be empty"));
            }
            if !seen.insert(feature.id.as_str()) {
                return Err(DomainError::validation(format!(
                    "feature id `{}` is used more than once",
                    feature.id
                )));
            }
        }
        ensure_unique(&self.carousel.images)
            .map_err(|err| DomainError::validation(format!("carousel.images: {err}")))?;
        ensure_unique(&self.customers.logos)
            .map_err(|err| DomainError::validation(format!("customers.logos: {err}")))?;
        Ok(())
    }
}
