use crate::domain::Service;

/// First service, in registry order, whose hostname contains `marker`.
///
/// `None` is the common case and not an error. Port eligibility is left to
/// the caller.
pub fn find_eligible_service<'a>(services: &'a [Service], marker: &str) -> Option<&'a Service> {
    services.iter().find(|svc| svc.hostname.contains(marker))
}
