// crates/rdap-resolver/src/roles.rs
//
// Related entities of a resolved object, tagged with the capacity in which
// each is associated.
//
// Reference attributes are read in a fixed precedence:
//
//   mnt-by  -> REGISTRANT
//   admin-c -> ADMINISTRATIVE
//   tech-c  -> TECHNICAL
//   zone-c  -> ZONE
//   abuse-c -> ABUSE
//
// A handle referenced several times is reported once with every role it
// holds. Objects without their own abuse-c inherit one from their
// organisation, and address/AS blocks additionally from their parent blocks.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use rdap_core::error::RdapError;
use rdap_core::object::{ObjectType, RpslObject, Source};
use rdap_core::range::ResourceRange;
use rdap_core::traits::ObjectStore;
use rdap_index::RangeIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Registrant,
    Administrative,
    Technical,
    Zone,
    Abuse,
}

impl Role {
    /// All roles in reference precedence order.
    pub const PRECEDENCE: [Role; 5] = [
        Role::Registrant,
        Role::Administrative,
        Role::Technical,
        Role::Zone,
        Role::Abuse,
    ];

    /// The reference attribute carrying this role.
    pub fn attribute(&self) -> &'static str {
        match self {
            Role::Registrant => "mnt-by",
            Role::Administrative => "admin-c",
            Role::Technical => "tech-c",
            Role::Zone => "zone-c",
            Role::Abuse => "abuse-c",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Registrant => "REGISTRANT",
            Role::Administrative => "ADMINISTRATIVE",
            Role::Technical => "TECHNICAL",
            Role::Zone => "ZONE",
            Role::Abuse => "ABUSE",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A referenced handle and the roles it holds, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleEntity {
    pub handle: String,
    pub roles: Vec<Role>,
}

impl RoleEntity {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    fn add(&mut self, role: Role) {
        if !self.has_role(role) {
            self.roles.push(role);
        }
    }
}

fn merge(entities: &mut Vec<RoleEntity>, handle: String, role: Role) {
    match entities.iter_mut().find(|e| e.handle == handle) {
        Some(entity) => entity.add(role),
        None => entities.push(RoleEntity {
            handle,
            roles: vec![role],
        }),
    }
}

/// Entities referenced directly by `object`. No handle appears twice.
pub fn expand(object: &RpslObject) -> Vec<RoleEntity> {
    let mut entities = Vec::new();
    for role in Role::PRECEDENCE {
        for handle in object.references(role.attribute()) {
            merge(&mut entities, handle, role);
        }
    }
    entities
}

/// Expands related entities, following organisation and parent-block
/// references for the abuse contact.
#[derive(Clone)]
pub struct RoleAggregator {
    store: Arc<dyn ObjectStore>,
}

impl RoleAggregator {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Direct entities of `object`, plus an inherited abuse contact when
    /// the object has none of its own.
    ///
    /// `index` is the snapshot the object was resolved against; it supplies
    /// the parent blocks of address and AS objects.
    pub async fn aggregate(
        &self,
        object: &RpslObject,
        index: &RangeIndex,
    ) -> Result<Vec<RoleEntity>, RdapError> {
        let mut entities = expand(object);
        if entities.iter().any(|e| e.has_role(Role::Abuse)) {
            return Ok(entities);
        }

        if let Some(handle) = self.inherited_abuse(object, index).await? {
            tracing::debug!(
                "{} '{}' inherits abuse contact {}",
                object.object_type(),
                object.key(),
                handle
            );
            merge(&mut entities, handle, Role::Abuse);
        }
        Ok(entities)
    }

    async fn inherited_abuse(
        &self,
        object: &RpslObject,
        index: &RangeIndex,
    ) -> Result<Option<String>, RdapError> {
        if let Some(handle) = self.organisation_abuse(object).await? {
            return Ok(Some(handle));
        }
        if !object.object_type().is_range() {
            return Ok(None);
        }

        let range = match ResourceRange::parse_key(object.object_type(), object.key()) {
            Ok(range) => range,
            Err(_) => return Ok(None),
        };

        for entry in index.ancestors(&range) {
            if entry.range == range {
                continue;
            }
            let parent = match self
                .store
                .get_object(&entry.source, entry.object_type, &entry.key)
                .await?
            {
                Some(parent) => parent,
                None => continue,
            };
            if let Some(handle) = parent.references(Role::Abuse.attribute()).into_iter().next() {
                return Ok(Some(handle));
            }
            if let Some(handle) = self.organisation_abuse(&parent).await? {
                return Ok(Some(handle));
            }
        }
        Ok(None)
    }

    /// The abuse-c of the organisation referenced by `object`, if any.
    async fn organisation_abuse(&self, object: &RpslObject) -> Result<Option<String>, RdapError> {
        let source: &Source = object.source();
        for org in object.references("org") {
            let organisation = self
                .store
                .get_object(source, ObjectType::Organisation, &org)
                .await?;
            if let Some(handle) = organisation
                .and_then(|o| o.references(Role::Abuse.attribute()).into_iter().next())
            {
                return Ok(Some(handle));
            }
        }
        Ok(None)
    }
}
