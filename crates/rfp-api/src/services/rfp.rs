//! RFP service: create, edit and publish RFPs, owner and public reads, browse.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use validator::Validate;

use rfp_firestore::{Store, Versioned, BROWSE_SCAN_LIMIT};
use rfp_models::guard::{self, GuardError, GuardResult};
use rfp_models::{Actor, BrowseQuery, CreateRfpRequest, Page, Rfp, RfpId, UpdateRfpRequest};

use super::MAX_WRITE_ATTEMPTS;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::security::{check_attachments, sanitize_create, sanitize_search, sanitize_update};

#[derive(Clone)]
pub struct RfpService {
    store: Arc<dyn Store>,
}

impl RfpService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// New draft owned by the calling buyer.
    pub async fn create(&self, actor: &Actor, mut request: CreateRfpRequest) -> ApiResult<Rfp> {
        guard::rfp::check_create(Some(actor))?;
        sanitize_create(&mut request);
        request.validate()?;
        check_attachments(&request.attachments)?;

        let rfp = Rfp::draft(actor.user_id.clone(), request, Utc::now());
        self.store.insert_rfp(&rfp).await?;

        metrics::record_rfp_created();
        info!(rfp_id = %rfp.id, actor = %actor.user_id, "Created RFP");
        Ok(rfp)
    }

    pub async fn list_own(&self, actor: &Actor) -> ApiResult<Vec<Rfp>> {
        guard::rfp::check_list_own(Some(actor))?;
        Ok(self.store.list_rfps_by_buyer(&actor.user_id).await?)
    }

    /// Owner read, any status.
    pub async fn get_owned(&self, actor: &Actor, id: &RfpId) -> ApiResult<Rfp> {
        let rfp = self.load(id).await?.value;
        guard::rfp::check_owner_view(Some(actor), &rfp)?;
        Ok(rfp)
    }

    /// Public read: published RFPs for anyone, plus the owner's own drafts.
    pub async fn get_public(&self, actor: Option<&Actor>, id: &RfpId) -> ApiResult<Rfp> {
        let rfp = self.load(id).await?.value;
        guard::rfp::check_public_view(actor, &rfp)?;
        Ok(rfp)
    }

    /// Published RFPs matching the query, newest first.
    ///
    /// Category narrows the store query; search, ordering and paging run in
    /// memory over at most `BROWSE_SCAN_LIMIT` documents.
    pub async fn browse(&self, mut query: BrowseQuery) -> ApiResult<Page<Rfp>> {
        query.search = query.search.as_deref().map(sanitize_search);

        let candidates = self
            .store
            .list_published(query.category_filter(), BROWSE_SCAN_LIMIT)
            .await?;
        if candidates.len() >= BROWSE_SCAN_LIMIT as usize {
            warn!(limit = BROWSE_SCAN_LIMIT, "Browse scan hit its limit, results are truncated");
        }

        Ok(query.apply(candidates))
    }

    /// Partial edit by the owner while the RFP is a draft.
    pub async fn update(&self, actor: &Actor, id: &RfpId, mut request: UpdateRfpRequest) -> ApiResult<Rfp> {
        // Permission and state come before body validation
        guard::rfp::check_create(Some(actor))?;
        let current = self.load(id).await?.value;
        guard::rfp::check_update(Some(actor), &current)?;

        sanitize_update(&mut request);
        request.validate()?;
        if request.is_empty() {
            return Err(ApiError::validation("no fields to update"));
        }
        if let Some(attachments) = &request.attachments {
            check_attachments(attachments)?;
        }

        let rfp = self
            .transition(id, |rfp, now| {
                guard::rfp::check_update(Some(actor), rfp)?;
                rfp.apply_update(request.clone(), now);
                if !rfp.budget.is_consistent() {
                    return Err(GuardError::Validation(
                        "budget_min must not exceed budget_max".to_string(),
                    ));
                }
                Ok(())
            })
            .await?;

        info!(rfp_id = %rfp.id, actor = %actor.user_id, "Updated RFP");
        Ok(rfp)
    }

    /// draft -> published, owner only.
    pub async fn publish(&self, actor: &Actor, id: &RfpId) -> ApiResult<Rfp> {
        let rfp = self
            .transition(id, |rfp, now| {
                guard::rfp::check_publish(Some(actor), rfp)?;
                rfp.publish(now);
                Ok(())
            })
            .await?;

        metrics::record_rfp_published();
        info!(rfp_id = %rfp.id, actor = %actor.user_id, "Published RFP");
        Ok(rfp)
    }

    async fn load(&self, id: &RfpId) -> ApiResult<Versioned<Rfp>> {
        self.store
            .get_rfp(id)
            .await?
            .ok_or_else(|| ApiError::not_found("RFP not found"))
    }

    /// Guarded read-modify-write with a version precondition.
    async fn transition<F>(&self, id: &RfpId, mut step: F) -> ApiResult<Rfp>
    where
        F: FnMut(&mut Rfp, DateTime<Utc>) -> GuardResult<()> + Send,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let Versioned { value: mut rfp, version } = self.load(id).await?;
            step(&mut rfp, Utc::now())?;

            match self.store.replace_rfp(&rfp, &version).await {
                Ok(()) => return Ok(rfp),
                Err(e) if e.is_precondition_failed() => {
                    debug!(rfp_id = %id, attempt, "RFP changed since read, reloading");
                }
                Err(e) => return Err(e.into()),
            }
        }

        warn!(rfp_id = %id, "RFP write kept losing to concurrent writers");
        Err(ApiError::InvalidState(
            "RFP was modified concurrently, please retry".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{create_request, HookedStore};
    use rfp_firestore::MemoryStore;
    use rfp_models::RfpStatus;

    fn service() -> RfpService {
        RfpService::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_create_update_publish() {
        let service = service();
        let buyer = Actor::buyer("b1");

        let rfp = service.create(&buyer, create_request("Roof repair")).await.unwrap();
        assert_eq!(rfp.status, RfpStatus::Draft);
        assert_eq!(rfp.buyer_id, "b1");

        let update = UpdateRfpRequest {
            title: Some("Roof and gutter repair".to_string()),
            ..Default::default()
        };
        let rfp = service.update(&buyer, &rfp.id, update).await.unwrap();
        assert_eq!(rfp.title, "Roof and gutter repair");

        let rfp = service.publish(&buyer, &rfp.id).await.unwrap();
        assert_eq!(rfp.status, RfpStatus::Published);
        assert!(rfp.published_at.is_some());

        let err = service.publish(&buyer, &rfp.id).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidState(_)));

        let update = UpdateRfpRequest {
            title: Some("Too late".to_string()),
            ..Default::default()
        };
        let err = service.update(&buyer, &rfp.id, update).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_supplier_cannot_create() {
        let err = service()
            .create(&Actor::supplier("s1"), create_request("Nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_non_owner_cannot_edit_or_view() {
        let service = service();
        let rfp = service
            .create(&Actor::buyer("b1"), create_request("Catering"))
            .await
            .unwrap();
        let other = Actor::buyer("b2");

        let update = UpdateRfpRequest {
            title: Some("Hijacked".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service.update(&other, &rfp.id, update).await,
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            service.publish(&other, &rfp.id).await,
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            service.get_owned(&other, &rfp.id).await,
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            service.get_public(Some(&other), &rfp.id).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            service.get_public(None, &rfp.id).await,
            Err(ApiError::NotFound(_))
        ));
        assert_eq!(
            service.get_public(Some(&Actor::buyer("b1")), &rfp.id).await.unwrap().title,
            "Catering"
        );
    }

    #[tokio::test]
    async fn test_update_checks_access_before_body() {
        let service = service();
        let rfp = service
            .create(&Actor::buyer("b1"), create_request("Signage"))
            .await
            .unwrap();

        let err = service
            .update(&Actor::supplier("s1"), &rfp.id, UpdateRfpRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)), "got {:?}", err);

        let err = service
            .update(&Actor::buyer("b2"), &rfp.id, UpdateRfpRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)), "got {:?}", err);

        let err = service
            .update(&Actor::buyer("b1"), &RfpId::from("missing"), UpdateRfpRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_update_rejects_inverted_budget_after_merge() {
        let service = service();
        let buyer = Actor::buyer("b1");
        let rfp = service.create(&buyer, create_request("Painting")).await.unwrap();

        let update = UpdateRfpRequest {
            budget_min: Some(rfp.budget.max + 1.0),
            ..Default::default()
        };
        let err = service.update(&buyer, &rfp.id, update).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(service.get_owned(&buyer, &rfp.id).await.unwrap().budget, rfp.budget);

        let err = service
            .update(&buyer, &rfp.id, UpdateRfpRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_internal_attachment_rejected() {
        let mut request = create_request("Audit");
        request.attachments = vec![rfp_models::AttachmentInput {
            name: "brief".to_string(),
            url: "http://192.168.0.10/brief.pdf".to_string(),
        }];
        let err = service().create(&Actor::buyer("b1"), request).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_concurrent_publish_reports_invalid_state() {
        let store = Arc::new(HookedStore::new());
        let service = RfpService::new(store.clone());
        let buyer = Actor::buyer("b1");
        let rfp = service.create(&buyer, create_request("Fleet leasing")).await.unwrap();

        store.race_next_rfp_write();
        let err = service.publish(&buyer, &rfp.id).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidState(_)), "got {:?}", err);

        let stored = service.get_owned(&buyer, &rfp.id).await.unwrap();
        assert_eq!(stored.status, RfpStatus::Published);
    }

    #[tokio::test]
    async fn test_browse_filters_and_pages() {
        let service = service();
        let buyer = Actor::buyer("b1");

        for i in 0..5 {
            let mut request = create_request(&format!("Cleaning lot {}", i));
            request.category = if i % 2 == 0 { "facilities" } else { "it" }.to_string();
            let rfp = service.create(&buyer, request).await.unwrap();
            service.publish(&buyer, &rfp.id).await.unwrap();
        }
        service.create(&buyer, create_request("Cleaning draft")).await.unwrap();

        let page = service
            .browse(BrowseQuery {
                search: Some("  CLEANING\u{0000} ".to_string()),
                category: Some("facilities".to_string()),
                page: Some(1),
                per_page: Some(2),
            })
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 2);
        assert!(page.items.iter().all(|r| r.category == "facilities"));

        let all = service.browse(BrowseQuery::default()).await.unwrap();
        assert_eq!(all.total, 5);
    }

    #[tokio::test]
    async fn test_list_own_newest_first() {
        let service = service();
        let buyer = Actor::buyer("b1");
        let first = service.create(&buyer, create_request("First")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = service.create(&buyer, create_request("Second")).await.unwrap();
        service.create(&Actor::buyer("b2"), create_request("Other")).await.unwrap();

        let own = service.list_own(&buyer).await.unwrap();
        let ids: Vec<_> = own.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }
}
