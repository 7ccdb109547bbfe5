// crates/rdap-core/src/object.rs
//
// Registration objects: an ordered list of `name: value` attributes with a
// derived type, primary key and source.
//
// Attribute order is significant and preserved end to end. Names may repeat
// (several `tech-c:` or `nserver:` lines on one object).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RdapError;
use crate::range::ResourceRange;

/// Named registry partition (e.g. "TEST", a country registry mirror).
///
/// Source names are case-insensitive and stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Source(String);

impl Source {
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Source {
    fn from(name: String) -> Self {
        Self::new(&name)
    }
}

impl From<&str> for Source {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<Source> for String {
    fn from(source: Source) -> Self {
        source.0
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Object classes the engine knows how to key and index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectType {
    Inetnum,
    Inet6num,
    AutNum,
    AsBlock,
    Domain,
    Person,
    Role,
    Organisation,
    Mntner,
    Irt,
    Route,
    Route6,
}

impl ObjectType {
    /// The RPSL attribute name that introduces an object of this type.
    pub fn name(&self) -> &'static str {
        match self {
            ObjectType::Inetnum => "inetnum",
            ObjectType::Inet6num => "inet6num",
            ObjectType::AutNum => "aut-num",
            ObjectType::AsBlock => "as-block",
            ObjectType::Domain => "domain",
            ObjectType::Person => "person",
            ObjectType::Role => "role",
            ObjectType::Organisation => "organisation",
            ObjectType::Mntner => "mntner",
            ObjectType::Irt => "irt",
            ObjectType::Route => "route",
            ObjectType::Route6 => "route6",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let t = match name.trim().to_ascii_lowercase().as_str() {
            "inetnum" => ObjectType::Inetnum,
            "inet6num" => ObjectType::Inet6num,
            "aut-num" => ObjectType::AutNum,
            "as-block" => ObjectType::AsBlock,
            "domain" => ObjectType::Domain,
            "person" => ObjectType::Person,
            "role" => ObjectType::Role,
            "organisation" => ObjectType::Organisation,
            "mntner" => ObjectType::Mntner,
            "irt" => ObjectType::Irt,
            "route" => ObjectType::Route,
            "route6" => ObjectType::Route6,
            _ => return None,
        };
        Some(t)
    }

    /// Address and AS blocks, the types held in the range index.
    pub fn is_range(&self) -> bool {
        matches!(
            self,
            ObjectType::Inetnum | ObjectType::Inet6num | ObjectType::AutNum | ObjectType::AsBlock
        )
    }

    /// Types that can be looked up by entity handle.
    pub fn is_entity(&self) -> bool {
        matches!(
            self,
            ObjectType::Person | ObjectType::Role | ObjectType::Organisation | ObjectType::Mntner
        )
    }

    /// Normalise a primary key so that store lookups and index entries agree.
    ///
    /// Handles are upper-case, domains lower-case without a trailing dot, and
    /// range keys are rewritten in canonical range notation when they parse.
    pub fn normalize_key(&self, key: &str) -> String {
        let trimmed = key.trim();
        match self {
            ObjectType::Domain => trimmed.trim_end_matches('.').to_ascii_lowercase(),
            t if t.is_range() => match ResourceRange::parse_key(*t, trimmed) {
                Ok(range) => range.to_string(),
                Err(_) => collapse_whitespace(trimmed),
            },
            _ => trimmed.to_ascii_uppercase(),
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A single `name: value` line of an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Lower-case attribute name.
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.trim().to_ascii_lowercase(),
            value: value.trim().to_string(),
        }
    }

    /// The value with any trailing `# comment` removed.
    pub fn clean_value(&self) -> &str {
        match self.value.find('#') {
            Some(pos) => self.value[..pos].trim(),
            None => self.value.trim(),
        }
    }

    /// Handles referenced by this attribute, upper-cased.
    ///
    /// Reference attributes may list several handles separated by commas.
    pub fn references(&self) -> Vec<String> {
        self.clean_value()
            .split(',')
            .map(|v| v.trim().to_ascii_uppercase())
            .filter(|v| !v.is_empty())
            .collect()
    }
}

/// A registration object: type, primary key, source and ordered attributes.
///
/// Serialized as its bare attribute list; type, key and source are derived
/// again on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Attribute>", into = "Vec<Attribute>")]
pub struct RpslObject {
    object_type: ObjectType,
    key: String,
    source: Source,
    attributes: Vec<Attribute>,
}

impl RpslObject {
    /// Build an object from its attribute lines.
    ///
    /// The first attribute names the type. The primary key is the first
    /// attribute's value, except for `person` and `role` objects which are
    /// keyed by `nic-hdl`. A `source:` attribute is required.
    pub fn from_attributes(attributes: Vec<Attribute>) -> Result<Self, RdapError> {
        let first = attributes
            .first()
            .ok_or_else(|| RdapError::InvalidObject("object has no attributes".to_string()))?;

        let object_type = ObjectType::from_name(&first.name).ok_or_else(|| {
            RdapError::InvalidObject(format!("unknown object type '{}'", first.name))
        })?;

        let raw_key = match object_type {
            ObjectType::Person | ObjectType::Role => attributes
                .iter()
                .find(|a| a.name == "nic-hdl")
                .map(|a| a.clean_value().to_string())
                .ok_or_else(|| {
                    RdapError::InvalidObject(format!(
                        "{} '{}' has no nic-hdl",
                        object_type,
                        first.clean_value()
                    ))
                })?,
            _ => first.clean_value().to_string(),
        };

        let source = attributes
            .iter()
            .find(|a| a.name == "source")
            .map(|a| Source::new(a.clean_value()))
            .ok_or_else(|| {
                RdapError::InvalidObject(format!("{} '{}' has no source", object_type, raw_key))
            })?;

        Ok(Self {
            object_type,
            key: object_type.normalize_key(&raw_key),
            source,
            attributes,
        })
    }

    /// Convenience constructor from `(name, value)` pairs.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Result<Self, RdapError> {
        Self::from_attributes(pairs.iter().map(|(n, v)| Attribute::new(n, v)).collect())
    }

    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    /// Normalised primary key.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// All values of the named attribute, in object order.
    pub fn values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.attributes
            .iter()
            .filter(move |a| a.name == name)
            .map(|a| a.clean_value())
    }

    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.clean_value())
    }

    /// All handles referenced by the named attribute, in object order.
    pub fn references(&self, name: &str) -> Vec<String> {
        self.attributes
            .iter()
            .filter(|a| a.name == name)
            .flat_map(|a| a.references())
            .collect()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == name)
    }

    /// Keep only the attributes for which `keep` returns true.
    ///
    /// Type, key and source are preserved even if their attributes are
    /// filtered out.
    pub fn retain_attributes<F>(mut self, keep: F) -> Self
    where
        F: FnMut(&Attribute) -> bool,
    {
        self.attributes.retain(keep);
        self
    }
}

impl TryFrom<Vec<Attribute>> for RpslObject {
    type Error = RdapError;

    fn try_from(attributes: Vec<Attribute>) -> Result<Self, Self::Error> {
        Self::from_attributes(attributes)
    }
}

impl From<RpslObject> for Vec<Attribute> {
    fn from(object: RpslObject) -> Self {
        object.attributes
    }
}

impl fmt::Display for RpslObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for attribute in &self.attributes {
            writeln!(f, "{:<16}{}", format!("{}:", attribute.name), attribute.value)?;
        }
        Ok(())
    }
}
