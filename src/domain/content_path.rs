//! Addresses of values inside a page document.
//!
//! A path is a dot-separated list of segments:
//!
//! * `name` selects an object field,
//! * `name[id]` selects the element of array `name` whose `id` field equals `id`,
//! * `name[]` appends to array `name` and may only appear last.
//!
//! `features[halal].image`, `hero.mainImage` and `customers.logos[]` are all valid.

use std::{fmt, str::FromStr};

use serde_json::{Map, Value};

use super::error::DomainError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    Element { field: String, id: String },
    Append(String),
}

impl Segment {
    pub fn field(&self) -> &str {
        match self {
            Segment::Field(field) | Segment::Append(field) => field,
            Segment::Element { field, .. } => field,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPath {
    segments: Vec<Segment>,
}

/// Where an assignment landed, with append positions made concrete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedPath {
    parts: Vec<String>,
    appended: bool,
}

impl AssignedPath {
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Whether the value was pushed onto an array, in which case the last part
    /// is the index it landed at.
    pub fn is_append(&self) -> bool {
        self.appended
    }
}

impl fmt::Display for AssignedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.parts.join("."))
    }
}

impl ContentPath {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Top-level document field the path starts from.
    pub fn root_field(&self) -> &str {
        self.segments
            .first()
            .map(Segment::field)
            .unwrap_or_default()
    }

    /// Write `value` at this path inside `document`.
    ///
    /// Missing intermediate objects are created. Array elements addressed by id
    /// must already exist.
    pub fn assign(
        &self,
        document: &mut Map<String, Value>,
        value: Value,
    ) -> Result<AssignedPath, DomainError> {
        self.assign_with(document, |_| Ok(value))
    }

    /// Like [`ContentPath::assign`], but builds the value once the concrete
    /// position (including any append index) is known.
    pub fn assign_with<F>(
        &self,
        document: &mut Map<String, Value>,
        make_value: F,
    ) -> Result<AssignedPath, DomainError>
    where
        F: FnOnce(&AssignedPath) -> Result<Value, DomainError>,
    {
        let mut parts = Vec::with_capacity(self.segments.len() + 1);
        let mut current = document;
        let last = self.segments.len() - 1;

        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Field(field) if index == last => {
                    parts.push(field.clone());
                    let assigned = AssignedPath {
                        parts,
                        appended: false,
                    };
                    let value = make_value(&assigned)?;
                    current.insert(field.clone(), value);
                    return Ok(assigned);
                }
                Segment::Field(field) => {
                    parts.push(field.clone());
                    let slot = current
                        .entry(field.clone())
                        .or_insert_with(|| Value::Object(Map::new()));
                    current = slot
                        .as_object_mut()
                        .ok_or_else(|| self.unresolvable(field, "is not an object"))?;
                }
                Segment::Element { field, id } => {
                    parts.push(field.clone());
                    parts.push(id.clone());
                    let elements = current
                        .get_mut(field)
                        .and_then(Value::as_array_mut)
                        .ok_or_else(|| self.unresolvable(field, "is not an array"))?;
                    let element = elements
                        .iter_mut()
                        .filter_map(Value::as_object_mut)
                        .find(|element| element_id_matches(element, id))
                        .ok_or_else(|| {
                            self.unresolvable(field, &format!("has no element `{id}`"))
                        })?;
                    current = element;
                }
                Segment::Append(field) => {
                    let slot = current
                        .entry(field.clone())
                        .or_insert_with(|| Value::Array(Vec::new()));
                    let elements = slot
                        .as_array_mut()
                        .ok_or_else(|| self.unresolvable(field, "is not an array"))?;
                    parts.push(field.clone());
                    parts.push(elements.len().to_string());
                    let assigned = AssignedPath {
                        parts,
                        appended: true,
                    };
                    elements.push(make_value(&assigned)?);
                    return Ok(assigned);
                }
            }
        }

        Err(DomainError::invariant(format!(
            "content path `{self}` does not end in a field"
        )))
    }

    fn unresolvable(&self, field: &str, reason: &str) -> DomainError {
        DomainError::validation(format!(
            "content path `{self}` cannot be resolved: `{field}` {reason}"
        ))
    }
}

fn element_id_matches(element: &Map<String, Value>, id: &str) -> bool {
    match element.get("id") {
        Some(Value::String(value)) => value == id,
        Some(Value::Number(value)) => value.to_string() == id,
        _ => false,
    }
}

fn is_name(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
}

fn parse_segment(raw: &str, path: &str) -> Result<Segment, DomainError> {
    let invalid = || DomainError::validation(format!("invalid content path `{path}`"));

    let Some(open) = raw.find('[') else {
        return if is_name(raw) {
            Ok(Segment::Field(raw.to_string()))
        } else {
            Err(invalid())
        };
    };

    let field = &raw[..open];
    let selector = raw[open + 1..].strip_suffix(']').ok_or_else(invalid)?;
    if !is_name(field) || selector.contains(['[', ']']) {
        return Err(invalid());
    }

    if selector.is_empty() {
        Ok(Segment::Append(field.to_string()))
    } else if is_name(selector) {
        Ok(Segment::Element {
            field: field.to_string(),
            id: selector.to_string(),
        })
    } else {
        Err(invalid())
    }
}

impl FromStr for ContentPath {
    type Err = DomainError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("content path must not be empty"));
        }

        let segments = trimmed
            .split('.')
            .map(|segment| parse_segment(segment, trimmed))
            .collect::<Result<Vec<_>, _>>()?;

        let last = segments.len() - 1;
        for (index, segment) in segments.iter().enumerate() {
            match segment {
                Segment::Append(_) if index != last => {
                    return Err(DomainError::validation(format!(
                        "content path `{trimmed}` may only append in its last segment"
                    )));
                }
                Segment::Element { .. } if index == last => {
                    return Err(DomainError::validation(format!(
                        "content path `{trimmed}` must end in a field, not an element"
                    )));
                }
                _ => {}
            }
        }

        Ok(Self { segments })
    }
}

impl fmt::Display for ContentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, segment) in self.segments.iter().enumerate() {
            if index > 0 {
                f.write_str(".")?;
            }
            match segment {
                Segment::Field(field) => write!(f, "{field}")?,
                Segment::Element { field, id } => write!(f, "{field}[{id}]")?,
                Segment::Append(field) => write!(f, "{field}[]")?,
            }
        }
        Ok(())
    }
}
