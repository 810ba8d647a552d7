use serde::{
    Deserialize, Deserializer, Serialize,
    de::{MapAccess, SeqAccess, Visitor},
};
use serde_json::{Map, Value};
use std::{fmt, marker::PhantomData};

/// Per-request credentials, passed through to Pocket and dropped afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub consumer_key: String,
    pub access_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &"<redacted>")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Values of a JSON object keyed by opaque ids. Pocket sends `[]` instead of `{}`
/// for an empty collection, so sequences are accepted too.
///
/// Values keep the order a JavaScript consumer would see: array-index keys
/// ascending, then the remaining keys in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyed<T>(Vec<T>);

impl<T> Keyed<T> {
    pub fn into_values(self) -> Vec<T> {
        self.0
    }
}

impl<T> Default for Keyed<T> {
    fn default() -> Self {
        Keyed(Vec::new())
    }
}

impl<T> From<Vec<T>> for Keyed<T> {
    fn from(values: Vec<T>) -> Self {
        Keyed(values)
    }
}

fn index_order(key: &str) -> (bool, u32) {
    match key.parse::<u32>() {
        Ok(n) if n < u32::MAX && n.to_string() == key => (false, n),
        _ => (true, 0),
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Keyed<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyedVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for KeyedVisitor<T> {
            type Value = Keyed<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map or a sequence")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries: Vec<(String, T)> = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, T>()? {
                    entries.push(entry);
                }
                // stable, so non-index keys keep document order
                entries.sort_by_key(|(key, _)| index_order(key));
                Ok(Keyed(entries.into_iter().map(|(_, value)| value).collect()))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut values = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(value) = seq.next_element()? {
                    values.push(value);
                }
                Ok(Keyed(values))
            }
        }

        deserializer.deserialize_any(KeyedVisitor(PhantomData))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorRecord {
    #[serde(default)]
    pub name: Option<String>,
}

/// A bookmark as Pocket returns it with `detailType=complete`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBookmark {
    pub given_title: Option<String>,
    pub resolved_title: Option<String>,
    pub given_url: Option<String>,
    pub resolved_url: Option<String>,
    pub excerpt: Option<String>,
    pub authors: Option<Keyed<AuthorRecord>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct PocketList {
    pub list: Keyed<RawBookmark>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bookmark {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    pub authors: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

const COMPUTED_FIELDS: [&str; 4] = ["title", "url", "excerpt", "authors"];

impl From<RawBookmark> for Bookmark {
    fn from(raw: RawBookmark) -> Self {
        let RawBookmark {
            given_title,
            resolved_title,
            given_url,
            resolved_url,
            excerpt,
            authors,
            mut extra,
        } = raw;

        for field in COMPUTED_FIELDS {
            extra.remove(field);
        }

        Bookmark {
            title: prefer_given(given_title, resolved_title),
            url: prefer_given(given_url, resolved_url),
            excerpt,
            authors: authors.map(join_authors).unwrap_or_default(),
            extra,
        }
    }
}

fn prefer_given(given: Option<String>, resolved: Option<String>) -> Option<String> {
    given.filter(|value| !value.is_empty()).or(resolved)
}

fn join_authors(authors: Keyed<AuthorRecord>) -> String {
    authors
        .into_values()
        .into_iter()
        .filter_map(|author| author.name)
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

pub fn flatten_all(entries: Vec<RawBookmark>) -> Vec<Bookmark> {
    entries.into_iter().map(Bookmark::from).collect()
}
