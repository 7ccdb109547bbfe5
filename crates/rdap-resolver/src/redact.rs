// crates/rdap-resolver/src/redact.rs
//
// Redaction applied to every object before it leaves the engine.

use rdap_core::object::RpslObject;

const AUTH_ATTRIBUTES: &[&str] = &["auth"];

const EMAIL_ATTRIBUTES: &[&str] = &[
    "e-mail", "notify", "changed", "ref-nfy", "mnt-nfy", "upd-to", "irt-nfy",
];

/// Remove authentication secrets.
pub fn filter_auth(object: RpslObject) -> RpslObject {
    object.retain_attributes(|a| !AUTH_ATTRIBUTES.contains(&a.name.as_str()))
}

/// Remove e-mail addresses and notification targets.
pub fn filter_email(object: RpslObject) -> RpslObject {
    object.retain_attributes(|a| !EMAIL_ATTRIBUTES.contains(&a.name.as_str()))
}

/// Both filters. Applying it twice gives the same object as applying it once.
pub fn sanitize(object: RpslObject) -> RpslObject {
    filter_email(filter_auth(object))
}
