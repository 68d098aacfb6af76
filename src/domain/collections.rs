//! Ordered collections stored inside page documents.

use std::{collections::HashSet, fmt, hash::Hash, str::FromStr};

use super::{error::DomainError, pages::PageKey};

/// Image lists on the homepage that the admin reorders and prunes by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageCollection {
    Carousel,
    Customers,
}

impl ImageCollection {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageCollection::Carousel => "carousel",
            ImageCollection::Customers => "customers",
        }
    }

    pub fn page(self) -> PageKey {
        PageKey::Homepage
    }

    /// Top-level section holding the list.
    pub fn section(self) -> &'static str {
        self.as_str()
    }

    /// Array field inside the section; also the key of the reorder request body.
    pub fn field(self) -> &'static str {
        match self {
            ImageCollection::Carousel => "images",
            ImageCollection::Customers => "logos",
        }
    }

    /// Resolve a collection name as it appears under a page's URL.
    pub fn for_page(page: PageKey, name: &str) -> Result<Self, DomainError> {
        let collection: ImageCollection = name.parse()?;
        if collection.page() != page {
            return Err(DomainError::not_found("collection"));
        }
        Ok(collection)
    }
}

impl fmt::Display for ImageCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageCollection {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "carousel" => Ok(ImageCollection::Carousel),
            "customers" => Ok(ImageCollection::Customers),
            _ => Err(DomainError::not_found("collection")),
        }
    }
}

/// Reject an ordering that names the same identifier twice.
pub fn ensure_unique<T>(items: &[T]) -> Result<(), DomainError>
where
    T: Eq + Hash + fmt::Debug,
{
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if !seen.insert(item) {
            return Err(DomainError::validation(format!(
                "identifier {item:?} appears more than once"
            )));
        }
    }
    Ok(())
}

/// Remove the element at `index`, leaving `items` untouched when out of range.
pub fn remove_at<T>(items: &mut Vec<T>, index: usize) -> Result<T, DomainError> {
    if index >= items.len() {
        return Err(DomainError::not_found("collection item"));
    }
    Ok(items.remove(index))
}
