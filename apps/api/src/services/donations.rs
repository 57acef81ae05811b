//! Donation service: the moderated listing lifecycle.
//!
//! ```text
//! create (pending) ──admin──► approved ──request──► reserved ──► completed
//!                 └─────────► rejected             (via transaction)
//! ```

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::services::notify;
use crate::AppState;
use givehub_core::{
    authorize, lifecycle, validation, CoreError, Donation, DonationDetails, DonationStatus,
    Identity, ListingImage, ListingKind, NotificationKind, NotificationPriority, Transaction,
    TransactionKind, TransactionStatus,
};
use givehub_db::repository::donation::DonationFilter;
use givehub_db::repository::{generate_id, Page, Paginated, SortOrder};
use givehub_db::DbError;

// =============================================================================
// Inputs
// =============================================================================

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct CreateDonationInput {
    pub title: String,
    pub description: String,
    /// Kind-specific details; the variant determines the donation kind.
    pub details: DonationDetails,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    pub location: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<ListingImage>,
    #[serde(default)]
    pub scheduled_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDonationInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub details: Option<DonationDetails>,
    pub quantity: Option<i64>,
    pub location: Option<String>,
    pub tags: Option<Vec<String>>,
    pub images: Option<Vec<ListingImage>>,
    pub scheduled_date: Option<DateTime<Utc>>,
}

/// List parameters accepted by the public donations listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListDonationsInput {
    pub kind: Option<givehub_core::DonationKind>,
    pub status: Option<DonationStatus>,
    pub location: Option<String>,
    pub min_quantity: Option<i64>,
    pub max_quantity: Option<i64>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Statuses a non-admin caller may see in lists.
fn public_statuses() -> Vec<DonationStatus> {
    use DonationStatus::*;
    [Pending, Approved, Rejected, Reserved, Completed, Cancelled]
        .into_iter()
        .filter(DonationStatus::is_publicly_listed)
        .collect()
}

pub(crate) fn page_from(page: Option<u32>, limit: Option<u32>) -> Page {
    Page::new(
        page.unwrap_or(1),
        limit.unwrap_or(givehub_db::repository::DEFAULT_PAGE_LIMIT),
    )
}

pub(crate) fn order_from(order: Option<&str>) -> SortOrder {
    match order {
        Some("asc") => SortOrder::Asc,
        _ => SortOrder::Desc,
    }
}

// =============================================================================
// Operations
// =============================================================================

/// Creates a donation. Status starts `pending`: donations go through admin
/// moderation before they are visible, unlike marketplace items.
pub async fn create(
    state: &AppState,
    identity: &Identity,
    input: CreateDonationInput,
) -> ApiResult<Donation> {
    validation::validate_title(&input.title)?;
    validation::validate_description(&input.description)?;
    validation::validate_location(&input.location)?;
    validation::validate_quantity(input.quantity)?;
    input.details.validate()?;

    let now = Utc::now();
    let donation = Donation {
        id: generate_id(),
        donor_id: identity.account_id.clone(),
        kind: input.details.kind(),
        title: input.title.trim().to_string(),
        description: input.description,
        details: input.details,
        quantity: input.quantity,
        location: input.location,
        tags: input.tags,
        images: input.images,
        status: DonationStatus::Pending,
        recipient_id: None,
        scheduled_date: input.scheduled_date,
        completed_date: None,
        views: 0,
        created_at: now,
        updated_at: now,
    };

    state.db.donations().insert(&donation).await?;
    info!(donation_id = %donation.id, kind = %donation.kind.as_str(), "Donation created");

    notify::dispatch(
        state,
        notify::notification(
            &identity.account_id,
            NotificationKind::System,
            "New Donation Created",
            format!(
                "You created a {} donation: {}",
                donation.kind.as_str(),
                donation.title
            ),
            Some(json!({ "donation_id": donation.id.clone() })),
            NotificationPriority::Medium,
        ),
    )
    .await;

    Ok(donation)
}

/// Lists donations. Non-admin callers only see the publicly listed statuses.
pub async fn list(
    state: &AppState,
    identity: Option<&Identity>,
    input: ListDonationsInput,
) -> ApiResult<Paginated<Donation>> {
    let search = input
        .search
        .as_deref()
        .map(validation::validate_search_query)
        .transpose()?
        .filter(|q| !q.is_empty());

    let is_admin = identity.map(Identity::is_admin).unwrap_or(false);

    let filter = DonationFilter {
        kind: input.kind,
        status: input.status,
        visible_statuses: (!is_admin).then(public_statuses),
        donor_id: None,
        location: input.location,
        min_quantity: input.min_quantity,
        max_quantity: input.max_quantity,
        search,
        sort_by: input.sort_by,
        order: order_from(input.order.as_deref()),
    };

    let page = page_from(input.page, input.limit);
    Ok(state.db.donations().list(&filter, page).await?)
}

/// Lists the calling account's own donations, any status.
pub async fn mine(state: &AppState, identity: &Identity, page: Page) -> ApiResult<Paginated<Donation>> {
    let filter = DonationFilter {
        donor_id: Some(identity.account_id.clone()),
        ..Default::default()
    };
    Ok(state.db.donations().list(&filter, page).await?)
}

/// Loads a single donation, enforcing visibility, and bumps the view counter.
pub async fn get(state: &AppState, identity: Option<&Identity>, id: &str) -> ApiResult<Donation> {
    let donation = state
        .db
        .donations()
        .get_by_id(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Donation", id))?;

    authorize::can_view_donation(identity, &donation)?;

    // Analytics only; a failed bump never fails the read
    let _ = state.db.donations().increment_views(id).await;

    Ok(donation)
}

/// Applies a patch to a donation. Owner or admin; completed donations are
/// frozen for non-admins. The donation kind is immutable.
pub async fn update(
    state: &AppState,
    identity: &Identity,
    id: &str,
    input: UpdateDonationInput,
) -> ApiResult<Donation> {
    let mut donation = state
        .db
        .donations()
        .get_by_id(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Donation", id))?;

    authorize::can_mutate_listing(identity, &donation.donor_id)?;
    lifecycle::donation_editable(donation.status, identity.is_admin())?;

    if let Some(title) = input.title {
        validation::validate_title(&title)?;
        donation.title = title.trim().to_string();
    }
    if let Some(description) = input.description {
        validation::validate_description(&description)?;
        donation.description = description;
    }
    if let Some(details) = input.details {
        if details.kind() != donation.kind {
            return Err(ApiError::Validation(format!(
                "details kind '{}' does not match donation kind '{}'",
                details.kind().as_str(),
                donation.kind.as_str()
            )));
        }
        details.validate()?;
        donation.details = details;
    }
    if let Some(quantity) = input.quantity {
        validation::validate_quantity(quantity)?;
        donation.quantity = quantity;
    }
    if let Some(location) = input.location {
        validation::validate_location(&location)?;
        donation.location = location;
    }
    if let Some(tags) = input.tags {
        donation.tags = tags;
    }
    if let Some(images) = input.images {
        donation.images = images;
    }
    if input.scheduled_date.is_some() {
        donation.scheduled_date = input.scheduled_date;
    }

    state.db.donations().update(&donation).await?;

    state
        .db
        .donations()
        .get_by_id(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Donation", id).into())
}

/// Deletes a donation. Owner or admin.
pub async fn delete(state: &AppState, identity: &Identity, id: &str) -> ApiResult<()> {
    let donation = state
        .db
        .donations()
        .get_by_id(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Donation", id))?;

    authorize::can_mutate_listing(identity, &donation.donor_id)?;
    state.db.donations().delete(id).await?;

    info!(donation_id = %id, "Donation deleted");
    Ok(())
}

/// Requests an approved donation.
///
/// Atomically binds the caller as recipient (compare-and-swap on
/// `approved` + no recipient) and creates the matching `donation`
/// transaction in the same database transaction. The donor is notified.
pub async fn request(state: &AppState, identity: &Identity, id: &str) -> ApiResult<Transaction> {
    let donation = state
        .db
        .donations()
        .get_by_id(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Donation", id))?;

    authorize::can_request_donation(identity, &donation)?;
    lifecycle::donation_transition(donation.status, DonationStatus::Reserved)?;

    let now = Utc::now();
    let tx = Transaction {
        id: generate_id(),
        donor_id: donation.donor_id.clone(),
        recipient_id: identity.account_id.clone(),
        kind: TransactionKind::Donation,
        donation_id: Some(donation.id.clone()),
        item_id: None,
        amount_cents: donation.details.cash_amount_cents().unwrap_or(0),
        status: TransactionStatus::Pending,
        donor_rating: None,
        donor_review: None,
        recipient_rating: None,
        recipient_review: None,
        completed_date: None,
        cancelled_date: None,
        created_at: now,
        updated_at: now,
    };

    let mut dbtx = state.db.pool().begin().await.map_err(DbError::from)?;

    let won = state
        .db
        .donations()
        .reserve(&mut *dbtx, id, &identity.account_id)
        .await?;

    if !won {
        dbtx.rollback().await.map_err(DbError::from)?;
        return Err(classify_lost_reservation(state, id).await?);
    }

    state.db.transactions().insert(&mut *dbtx, &tx).await?;
    dbtx.commit().await.map_err(DbError::from)?;

    info!(
        donation_id = %id,
        recipient_id = %identity.account_id,
        transaction_id = %tx.id,
        "Donation reserved"
    );

    notify::dispatch(
        state,
        notify::notification(
            &donation.donor_id,
            NotificationKind::DonationRequest,
            "Donation Requested",
            format!("Your donation \"{}\" has been requested", donation.title),
            Some(json!({ "donation_id": donation.id.clone(), "transaction_id": tx.id.clone() })),
            NotificationPriority::High,
        ),
    )
    .await;

    Ok(tx)
}

/// Explains a lost reservation race.
async fn classify_lost_reservation(state: &AppState, id: &str) -> ApiResult<ApiError> {
    let current = state.db.donations().get_by_id(id).await?;

    Ok(match current {
        None => CoreError::not_found("Donation", id).into(),
        Some(d) if d.status == DonationStatus::Reserved => {
            ApiError::Conflict("donation was reserved by another account".to_string())
        }
        Some(d) => CoreError::invalid_state("Donation", d.status.as_str(), "request").into(),
    })
}

/// Idempotent favorite toggle. Returns whether the donation is favorited
/// after the call, plus the listing's favorite count.
pub async fn toggle_favorite(
    state: &AppState,
    identity: &Identity,
    id: &str,
) -> ApiResult<(bool, i64)> {
    if state.db.donations().get_by_id(id).await?.is_none() {
        return Err(CoreError::not_found("Donation", id).into());
    }

    let favorites = state.db.favorites();
    let favorited = favorites
        .toggle(ListingKind::Donation, id, &identity.account_id)
        .await?;
    let count = favorites.count_for_listing(ListingKind::Donation, id).await?;

    Ok((favorited, count))
}
