//! Binding uploaded files to content paths and naming their destinations.

use std::collections::BTreeMap;

use super::{
    content_path::{AssignedPath, ContentPath},
    error::DomainError,
    pages::PageKey,
};

/// Directory (relative to the upload root) that holds page assets.
pub const CONTENT_ASSET_DIR: &str = "content";

const FALLBACK_EXTENSION: &str = "bin";
const MAX_EXTENSION_LEN: usize = 8;
const FEATURE_IMAGE_PREFIX: &str = "featureImage_";
/// Separator between path parts in a file stem; never valid inside a part.
const STEM_SEPARATOR: &str = ".";
/// Hex digits of the content checksum that name an appended asset.
const APPENDED_DIGEST_LEN: usize = 16;

/// Path a file field populates when the request does not say otherwise.
pub fn conventional_path(page: PageKey, field: &str) -> Option<ContentPath> {
    let raw = match (page, field) {
        (PageKey::Homepage, "logo") => "logo".to_string(),
        (PageKey::Homepage, "mainImage") => "hero.mainImage".to_string(),
        (PageKey::Homepage, "customerLogos[]") => "customers.logos[]".to_string(),
        (PageKey::Homepage, "carouselImages[]") => "carousel.images[]".to_string(),
        (PageKey::Homepage, field) if field.starts_with(FEATURE_IMAGE_PREFIX) => {
            let id = &field[FEATURE_IMAGE_PREFIX.len()..];
            format!("features[{id}].image")
        }
        (PageKey::About, "image") => "image".to_string(),
        _ => return None,
    };
    raw.parse().ok()
}

/// Pick the content path for a file field, preferring explicit bindings.
pub fn resolve_binding(
    page: PageKey,
    field: &str,
    explicit: &BTreeMap<String, ContentPath>,
) -> Result<ContentPath, DomainError> {
    if let Some(path) = explicit.get(field) {
        return Ok(path.clone());
    }
    conventional_path(page, field).ok_or_else(|| {
        DomainError::validation(format!(
            "file field `{field}` is not bound to a content path on page `{page}`"
        ))
    })
}

/// Choose a file extension from the client's file name, then its content type.
pub fn file_extension(original_name: Option<&str>, content_type: Option<&str>) -> String {
    let from_name = original_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|ch| ch.is_ascii_alphanumeric())
        });
    if let Some(ext) = from_name {
        return ext;
    }

    content_type
        .and_then(mime_guess::get_mime_extensions_str)
        .and_then(|extensions| extensions.first())
        .map(|ext| ext.to_string())
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}

/// Relative destination for a file assigned at `assigned` on `page`.
///
/// Field and element slots are named by their path alone, so repeated uploads
/// to the same slot overwrite the same file. Appended elements have no stable
/// position and are named by `checksum` instead.
pub fn asset_destination(
    page: PageKey,
    assigned: &AssignedPath,
    checksum: &str,
    extension: &str,
) -> Result<String, DomainError> {
    let parts = assigned.parts();
    let stem = if assigned.is_append() {
        let digest = checksum.get(..APPENDED_DIGEST_LEN).unwrap_or(checksum);
        if digest.is_empty() || !digest.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(DomainError::invariant(format!(
                "cannot name appended asset for `{assigned}` without a checksum"
            )));
        }
        let array = &parts[..parts.len().saturating_sub(1)];
        format!("{}{STEM_SEPARATOR}{digest}", array.join(STEM_SEPARATOR))
    } else {
        parts.join(STEM_SEPARATOR)
    };

    if stem.is_empty() || parts.iter().any(|part| part.contains(STEM_SEPARATOR)) {
        return Err(DomainError::validation(format!(
            "cannot name asset for `{assigned}`"
        )));
    }
    Ok(format!("{CONTENT_ASSET_DIR}/{page}/{stem}.{extension}"))
}

/// Public URL for a stored asset, with a version query so browsers refetch it.
pub fn versioned_url(public_prefix: &str, destination: &str, version: i128) -> String {
    let prefix = public_prefix.trim_end_matches('/');
    format!("{prefix}/{destination}?v={version}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conventional_table_covers_homepage_slots() {
        let cases = [
            ("logo", "logo"),
            ("mainImage", "hero.mainImage"),
            ("featureImage_halal", "features[halal].image"),
            ("customerLogos[]", "customers.logos[]"),
            ("carouselImages[]", "carousel.images[]"),
        ];
        for (field, expected) in cases {
            let path = conventional_path(PageKey::Homepage, field).expect(field);
            assert_eq!(path.to_string(), expected);
        }
        assert_eq!(
            conventional_path(PageKey::About, "image")
                .expect("about image")
                .to_string(),
            "image"
        );
        assert!(conventional_path(PageKey::Footer, "logo").is_none());
        assert!(conventional_path(PageKey::Homepage, "featureImage_").is_none());
        assert!(conventional_path(PageKey::Homepage, "featureImage_../x").is_none());
    }

    #[test]
    fn explicit_bindings_win() {
        let mut explicit = BTreeMap::new();
        explicit.insert(
            "logo".to_string(),
            "hero.mainImage".parse::<ContentPath>().expect("path"),
        );
        let path = resolve_binding(PageKey::Homepage, "logo", &explicit).expect("bound");
        assert_eq!(path.to_string(), "hero.mainImage");

        let err = resolve_binding(PageKey::Homepage, "banner", &explicit).expect_err("unbound");
        assert!(err.to_string().contains("banner"));
    }

    #[test]
    fn extension_prefers_file_name_then_mime() {
        assert_eq!(file_extension(Some("Logo.PNG"), Some("image/jpeg")), "png");
        assert_eq!(file_extension(Some("logo.p$g"), Some("image/png")), "png");
        assert_eq!(file_extension(Some("no-extension"), None), "bin");
        assert_eq!(file_extension(None, Some("application/x-unknown-thing")), "bin");
    }

    const SUM_A: &str = "aaaaaaaaaaaaaaaa0000000000000000aaaaaaaaaaaaaaaa0000000000000000";
    const SUM_B: &str = "bbbbbbbbbbbbbbbb1111111111111111bbbbbbbbbbbbbbbb1111111111111111";

    fn assign(doc: serde_json::Value, raw: &str) -> AssignedPath {
        let serde_json::Value::Object(mut doc) = doc else {
            panic!("expected object");
        };
        let path: ContentPath = raw.parse().expect("path");
        path.assign(&mut doc, serde_json::Value::Null).expect("assign")
    }

    #[test]
    fn destination_ignores_client_file_name() {
        let assigned = assign(
            serde_json::json!({ "features": [{ "id": "halal" }] }),
            "features[halal].image",
        );
        let destination =
            asset_destination(PageKey::Homepage, &assigned, SUM_A, "png").expect("dest");
        assert_eq!(destination, "content/homepage/features.halal.image.png");
    }

    #[test]
    fn distinct_feature_ids_get_distinct_files() {
        let doc = serde_json::json!({
            "features": [{ "id": "Halal_Meat" }, { "id": "halal-meat" }, { "id": "halal_meat" }]
        });
        let names: Vec<String> = ["Halal_Meat", "halal-meat", "halal_meat"]
            .iter()
            .map(|id| {
                let assigned = assign(doc.clone(), &format!("features[{id}].image"));
                asset_destination(PageKey::Homepage, &assigned, SUM_A, "png").expect("dest")
            })
            .collect();

        assert_eq!(names[0], "content/homepage/features.Halal_Meat.image.png");
        assert_ne!(names[0], names[1]);
        assert_ne!(names[1], names[2]);
        assert_ne!(names[0], names[2]);
    }

    #[test]
    fn appended_assets_are_named_by_content() {
        let doc = serde_json::json!({ "customers": { "logos": ["/a.png", "/b.png"] } });
        let assigned = assign(doc.clone(), "customers.logos[]");

        let first = asset_destination(PageKey::Homepage, &assigned, SUM_A, "png").expect("dest");
        let second = asset_destination(PageKey::Homepage, &assigned, SUM_B, "png").expect("dest");
        assert_eq!(first, "content/homepage/customers.logos.aaaaaaaaaaaaaaaa.png");
        assert_ne!(first, second);

        let shorter = assign(serde_json::json!({ "customers": { "logos": [] } }), "customers.logos[]");
        let again = asset_destination(PageKey::Homepage, &shorter, SUM_A, "png").expect("dest");
        assert_eq!(again, first);

        assert!(asset_destination(PageKey::Homepage, &assigned, "", "png").is_err());
    }

    #[test]
    fn versioned_url_joins_prefix() {
        assert_eq!(
            versioned_url("/uploads/", "content/about/image.jpg", 42),
            "/uploads/content/about/image.jpg?v=42"
        );
    }
}
