//! Slug helpers shared by blog posts and uploaded asset names.

use std::future::Future;

use slug::slugify;
use thiserror::Error;

const MAX_SUFFIX_ATTEMPTS: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("`{input}` does not contain any slug-safe characters")]
    Unrepresentable { input: String },
    #[error("no free slug left for `{base}`")]
    Exhausted { base: String },
}

#[derive(Debug, Error)]
pub enum SlugLookupError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error(transparent)]
    Lookup(E),
}

pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let candidate = slugify(input);
    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Find a slug for `input` that `is_free` accepts, suffixing `-2`, `-3`, ... on collision.
pub async fn unique_slug<F, Fut, E>(input: &str, mut is_free: F) -> Result<String, SlugLookupError<E>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let base = derive_slug(input)?;

    if is_free(base.clone()).await.map_err(SlugLookupError::Lookup)? {
        return Ok(base);
    }

    for attempt in 2..=MAX_SUFFIX_ATTEMPTS + 1 {
        let candidate = format!("{base}-{attempt}");
        if is_free(candidate.clone())
            .await
            .map_err(SlugLookupError::Lookup)?
        {
            return Ok(candidate);
        }
    }

    Err(SlugError::Exhausted { base }.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[test]
    fn derive_slug_lowercases_and_dashes() {
        assert_eq!(derive_slug("Grilled Sea Bass!").expect("slug"), "grilled-sea-bass");
        assert_eq!(derive_slug("   "), Err(SlugError::EmptyInput));
        assert!(matches!(
            derive_slug("!!!"),
            Err(SlugError::Unrepresentable { .. })
        ));
    }

    #[tokio::test]
    async fn unique_slug_appends_counter() {
        let taken = ["spring-menu".to_string(), "spring-menu-2".to_string()];
        let slug = unique_slug("Spring Menu", |candidate| {
            let free = !taken.contains(&candidate);
            async move { Ok::<_, Infallible>(free) }
        })
        .await
        .expect("unique slug");

        assert_eq!(slug, "spring-menu-3");
    }
}
