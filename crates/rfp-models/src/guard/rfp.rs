//! RFP lifecycle guard: `draft -> published -> {closed, awarded}`.

use super::{require_actor, require_role, GuardError, GuardResult};
use crate::rfp::{Rfp, RfpStatus};
use crate::role::{Actor, Role};

/// Only buyers create RFPs.
pub fn check_create(actor: Option<&Actor>) -> GuardResult<()> {
    let actor = require_actor(actor)?;
    require_role(actor, Role::Buyer)
}

/// Only buyers list their own RFPs.
pub fn check_list_own(actor: Option<&Actor>) -> GuardResult<()> {
    check_create(actor)
}

/// Owner-only content edit, draft only.
pub fn check_update(actor: Option<&Actor>, rfp: &Rfp) -> GuardResult<()> {
    check_owner(actor, rfp)?;
    if !rfp.status.is_editable() {
        return Err(GuardError::rfp_state("update", rfp.status));
    }
    Ok(())
}

/// Owner-only, draft only.
pub fn check_publish(actor: Option<&Actor>, rfp: &Rfp) -> GuardResult<()> {
    check_owner(actor, rfp)?;
    if !rfp.status.can_transition_to(RfpStatus::Published) {
        return Err(GuardError::rfp_state("publish", rfp.status));
    }
    Ok(())
}

/// Owner detail view: any status, owner only.
pub fn check_owner_view(actor: Option<&Actor>, rfp: &Rfp) -> GuardResult<()> {
    check_owner(actor, rfp)
}

/// Public detail view. Published RFPs are visible to everyone, the owner
/// always sees their own, everything else reads as missing.
pub fn check_public_view(actor: Option<&Actor>, rfp: &Rfp) -> GuardResult<()> {
    if rfp.status == RfpStatus::Published {
        return Ok(());
    }
    match actor {
        Some(a) if a.is_buyer() && rfp.is_owned_by(&a.user_id) => Ok(()),
        _ => Err(GuardError::NotFound("RFP")),
    }
}

fn check_owner(actor: Option<&Actor>, rfp: &Rfp) -> GuardResult<()> {
    let actor = require_actor(actor)?;
    require_role(actor, Role::Buyer)?;
    if !rfp.is_owned_by(&actor.user_id) {
        return Err(GuardError::NotOwner);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requests::CreateRfpRequest;
    use chrono::{Duration, Utc};

    fn rfp_with_status(owner: &str, status: RfpStatus) -> Rfp {
        let now = Utc::now();
        let mut rfp = Rfp::draft(
            owner,
            CreateRfpRequest {
                title: "Catering".to_string(),
                description: "Annual event catering".to_string(),
                company: "Acme".to_string(),
                budget_min: 10.0,
                budget_max: 20.0,
                currency: None,
                deadline: now + Duration::days(2),
                category: "events".to_string(),
                requirements: None,
                priority: None,
                tags: vec![],
                attachments: vec![],
            },
            now,
        );
        rfp.status = status;
        rfp
    }

    const ALL: [RfpStatus; 4] = [
        RfpStatus::Draft,
        RfpStatus::Published,
        RfpStatus::Closed,
        RfpStatus::Awarded,
    ];

    #[test]
    fn test_create_requires_buyer() {
        assert_eq!(check_create(None), Err(GuardError::Unauthenticated));
        assert_eq!(
            check_create(Some(&Actor::supplier("s1"))),
            Err(GuardError::WrongRole { required: Role::Buyer })
        );
        assert!(check_create(Some(&Actor::buyer("b1"))).is_ok());
    }

    #[test]
    fn test_update_iff_owner_and_draft() {
        let owner = Actor::buyer("b1");
        let other = Actor::buyer("b2");
        let supplier = Actor::supplier("b1");

        for status in ALL {
            let rfp = rfp_with_status("b1", status);
            let expected_ok = status == RfpStatus::Draft;
            assert_eq!(check_update(Some(&owner), &rfp).is_ok(), expected_ok, "{status}");
            assert!(check_update(Some(&other), &rfp).is_err());
            assert!(check_update(Some(&supplier), &rfp).is_err());
            assert!(check_update(None, &rfp).is_err());
        }
    }

    #[test]
    fn test_publish_only_from_draft() {
        let owner = Actor::buyer("b1");
        for status in [RfpStatus::Published, RfpStatus::Closed, RfpStatus::Awarded] {
            let rfp = rfp_with_status("b1", status);
            assert!(matches!(
                check_publish(Some(&owner), &rfp),
                Err(GuardError::InvalidState { operation: "publish", .. })
            ));
        }
        assert!(check_publish(Some(&owner), &rfp_with_status("b1", RfpStatus::Draft)).is_ok());
    }

    #[test]
    fn test_publish_not_owner() {
        let rfp = rfp_with_status("b1", RfpStatus::Draft);
        assert_eq!(
            check_publish(Some(&Actor::buyer("b2")), &rfp),
            Err(GuardError::NotOwner)
        );
    }

    #[test]
    fn test_owner_view_any_status() {
        for status in ALL {
            let rfp = rfp_with_status("b1", status);
            assert!(check_owner_view(Some(&Actor::buyer("b1")), &rfp).is_ok());
            assert_eq!(
                check_owner_view(Some(&Actor::buyer("b2")), &rfp),
                Err(GuardError::NotOwner)
            );
        }
    }

    #[test]
    fn test_public_view() {
        let published = rfp_with_status("b1", RfpStatus::Published);
        assert!(check_public_view(None, &published).is_ok());
        assert!(check_public_view(Some(&Actor::supplier("s1")), &published).is_ok());

        let draft = rfp_with_status("b1", RfpStatus::Draft);
        assert_eq!(check_public_view(None, &draft), Err(GuardError::NotFound("RFP")));
        assert_eq!(
            check_public_view(Some(&Actor::supplier("s1")), &draft),
            Err(GuardError::NotFound("RFP"))
        );
        assert!(check_public_view(Some(&Actor::buyer("b1")), &draft).is_ok());
    }
}
