// crates/rdap-resolver/src/handle.rs
//
// Entity handle syntax. Matching is case-insensitive; callers upper-case
// handles before lookup.

use once_cell::sync::Lazy;
use regex::Regex;

use rdap_core::object::ObjectType;

/// Person and role handles, e.g. `TP1-TEST`, `AA1`, `JD-RIPE`.
static NIC_HDL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[A-Z]{2,4}([1-9][0-9]{0,5})?(-[A-Z0-9_]{1,10})?$")
        .expect("Invalid nic-hdl regex")
});

/// Maintainer names, e.g. `OWNER-MNT`.
static MNTNER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[A-Z][A-Z0-9_-]*[A-Z0-9]$").expect("Invalid mntner regex")
});

/// Organisation identifiers, e.g. `ORG-TO1-TEST`.
static ORG_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^ORG-[A-Z]{2,4}([1-9][0-9]{0,5})?-[A-Z0-9_]{1,10}$")
        .expect("Invalid organisation id regex")
});

/// What an entity handle can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    NicHdl,
    Mntner,
    Organisation,
}

impl HandleKind {
    /// Object types to try, in order, when looking the handle up.
    pub fn candidate_types(&self) -> &'static [ObjectType] {
        match self {
            HandleKind::Organisation => &[ObjectType::Organisation],
            HandleKind::NicHdl | HandleKind::Mntner => {
                &[ObjectType::Person, ObjectType::Role, ObjectType::Mntner]
            }
        }
    }
}

/// Classify a handle, or `None` if it is not valid entity syntax.
///
/// Anything starting with `ORG-` must be a well-formed organisation id.
pub fn classify(handle: &str) -> Option<HandleKind> {
    let handle = handle.trim();
    let is_org_prefixed = handle
        .get(..4)
        .map(|p| p.eq_ignore_ascii_case("ORG-"))
        .unwrap_or(false);

    if is_org_prefixed {
        return ORG_ID.is_match(handle).then_some(HandleKind::Organisation);
    }
    if NIC_HDL.is_match(handle) {
        Some(HandleKind::NicHdl)
    } else if MNTNER.is_match(handle) {
        Some(HandleKind::Mntner)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nic_hdl_forms() {
        assert_eq!(classify("TP1-TEST"), Some(HandleKind::NicHdl));
        assert_eq!(classify("aa1"), Some(HandleKind::NicHdl));
        assert_eq!(classify("JD-RIPE"), Some(HandleKind::NicHdl));
    }

    #[test]
    fn test_mntner_names() {
        assert_eq!(classify("OWNER-MNT"), Some(HandleKind::Mntner));
        assert_eq!(classify("RIPE-NCC-HM-MNT"), Some(HandleKind::Mntner));
    }

    #[test]
    fn test_organisation_ids() {
        assert_eq!(classify("ORG-TO1-TEST"), Some(HandleKind::Organisation));
        assert_eq!(classify("org-to1-test"), Some(HandleKind::Organisation));
        // ORG- prefix without a valid organisation id is not a maintainer.
        assert_eq!(classify("ORG-NOT-A-VALID-ORGANISATION-ID"), None);
        assert_eq!(classify("ORG-"), None);
    }

    #[test]
    fn test_rejected_handles() {
        assert_eq!(classify("12345"), None);
        assert_eq!(classify("A"), None);
        assert_eq!(classify("bad handle"), None);
        assert_eq!(classify("TRAILING-"), None);
    }

    #[test]
    fn test_candidate_types() {
        assert_eq!(
            HandleKind::Organisation.candidate_types(),
            &[ObjectType::Organisation]
        );
        assert_eq!(HandleKind::NicHdl.candidate_types().len(), 3);
    }
}
