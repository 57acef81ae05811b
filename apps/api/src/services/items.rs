//! Item service: the marketplace listing lifecycle.
//!
//! Items go live immediately on creation, unlike donations which wait for
//! admin approval. Purchase claims a unit and creates the purchase
//! transaction in one database transaction.

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::services::donations::{order_from, page_from};
use crate::services::notify;
use crate::AppState;
use givehub_core::{
    authorize, lifecycle, validation, CoreError, Identity, Item, ItemCategory, ItemCondition,
    ItemStatus, ListingImage, ListingKind, NotificationKind, NotificationPriority, Transaction,
    TransactionKind, TransactionStatus,
};
use givehub_db::repository::item::ItemFilter;
use givehub_db::repository::{generate_id, Page, Paginated};
use givehub_db::DbError;

// =============================================================================
// Inputs
// =============================================================================

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct CreateItemInput {
    pub title: String,
    pub description: String,
    pub category: ItemCategory,
    pub price_cents: i64,
    #[serde(default)]
    pub original_price_cents: Option<i64>,
    #[serde(default)]
    pub is_free: bool,
    #[serde(default)]
    pub condition: Option<ItemCondition>,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    pub location: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<ListingImage>,
    /// Start as an unpublished draft instead of going live immediately.
    #[serde(default)]
    pub draft: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<ItemCategory>,
    pub price_cents: Option<i64>,
    pub original_price_cents: Option<i64>,
    pub is_free: Option<bool>,
    pub condition: Option<ItemCondition>,
    pub quantity: Option<i64>,
    pub location: Option<String>,
    pub tags: Option<Vec<String>>,
    pub images: Option<Vec<ListingImage>>,
}

/// List parameters accepted by the public items listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListItemsInput {
    pub category: Option<ItemCategory>,
    pub condition: Option<ItemCondition>,
    pub status: Option<ItemStatus>,
    pub location: Option<String>,
    pub is_free: Option<bool>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

// =============================================================================
// Operations
// =============================================================================

/// Creates an item. Live (`active`) immediately unless saved as a draft.
pub async fn create(
    state: &AppState,
    identity: &Identity,
    input: CreateItemInput,
) -> ApiResult<Item> {
    validation::validate_title(&input.title)?;
    validation::validate_description(&input.description)?;
    validation::validate_location(&input.location)?;
    validation::validate_quantity(input.quantity)?;
    validation::validate_price_cents(input.price_cents)?;

    let is_free = input.is_free || input.price_cents == 0;

    let now = Utc::now();
    let item = Item {
        id: generate_id(),
        seller_id: identity.account_id.clone(),
        title: input.title.trim().to_string(),
        description: input.description,
        category: input.category,
        price_cents: if is_free { 0 } else { input.price_cents },
        original_price_cents: input.original_price_cents,
        is_free,
        condition: input.condition.unwrap_or_default(),
        quantity: input.quantity,
        location: input.location,
        tags: input.tags,
        images: input.images,
        status: if input.draft {
            ItemStatus::Draft
        } else {
            ItemStatus::Active
        },
        buyer_id: None,
        sold_date: None,
        views: 0,
        created_at: now,
        updated_at: now,
    };

    state.db.items().insert(&item).await?;
    info!(item_id = %item.id, "Item listed");

    Ok(item)
}

/// Lists items. Non-admin callers only see active listings.
pub async fn list(
    state: &AppState,
    identity: Option<&Identity>,
    input: ListItemsInput,
) -> ApiResult<Paginated<Item>> {
    let search = input
        .search
        .as_deref()
        .map(validation::validate_search_query)
        .transpose()?
        .filter(|q| !q.is_empty());

    let is_admin = identity.map(Identity::is_admin).unwrap_or(false);

    let filter = ItemFilter {
        category: input.category,
        condition: input.condition,
        status: input.status,
        visible_statuses: (!is_admin).then(|| vec![ItemStatus::Active]),
        seller_id: None,
        location: input.location,
        is_free: input.is_free,
        min_price_cents: input.min_price_cents,
        max_price_cents: input.max_price_cents,
        search,
        sort_by: input.sort_by,
        order: order_from(input.order.as_deref()),
    };

    let page = page_from(input.page, input.limit);
    Ok(state.db.items().list(&filter, page).await?)
}

/// Lists the calling account's own items, any status.
pub async fn mine(state: &AppState, identity: &Identity, page: Page) -> ApiResult<Paginated<Item>> {
    let filter = ItemFilter {
        seller_id: Some(identity.account_id.clone()),
        ..Default::default()
    };
    Ok(state.db.items().list(&filter, page).await?)
}

/// Loads a single item, enforcing visibility, and bumps the view counter.
pub async fn get(state: &AppState, identity: Option<&Identity>, id: &str) -> ApiResult<Item> {
    let item = state
        .db
        .items()
        .get_by_id(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Item", id))?;

    authorize::can_view_item(identity, &item)?;

    let _ = state.db.items().increment_views(id).await;

    Ok(item)
}

/// Applies a patch to an item. Owner or admin; sold items are frozen for
/// non-admins.
pub async fn update(
    state: &AppState,
    identity: &Identity,
    id: &str,
    input: UpdateItemInput,
) -> ApiResult<Item> {
    let mut item = state
        .db
        .items()
        .get_by_id(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Item", id))?;

    authorize::can_mutate_listing(identity, &item.seller_id)?;
    lifecycle::item_editable(item.status, identity.is_admin())?;

    if let Some(title) = input.title {
        validation::validate_title(&title)?;
        item.title = title.trim().to_string();
    }
    if let Some(description) = input.description {
        validation::validate_description(&description)?;
        item.description = description;
    }
    if let Some(category) = input.category {
        item.category = category;
    }
    if let Some(price_cents) = input.price_cents {
        validation::validate_price_cents(price_cents)?;
        item.price_cents = price_cents;
        item.is_free = price_cents == 0;
    }
    if input.original_price_cents.is_some() {
        item.original_price_cents = input.original_price_cents;
    }
    if let Some(is_free) = input.is_free {
        item.is_free = is_free;
        if is_free {
            item.price_cents = 0;
        }
    }
    if let Some(condition) = input.condition {
        item.condition = condition;
    }
    if let Some(quantity) = input.quantity {
        validation::validate_quantity(quantity)?;
        item.quantity = quantity;
    }
    if let Some(location) = input.location {
        validation::validate_location(&location)?;
        item.location = location;
    }
    if let Some(tags) = input.tags {
        item.tags = tags;
    }
    if let Some(images) = input.images {
        item.images = images;
    }

    state.db.items().update(&item).await?;

    state
        .db
        .items()
        .get_by_id(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Item", id).into())
}

/// Publishes a draft item.
pub async fn publish(state: &AppState, identity: &Identity, id: &str) -> ApiResult<Item> {
    let item = state
        .db
        .items()
        .get_by_id(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Item", id))?;

    authorize::can_mutate_listing(identity, &item.seller_id)?;
    lifecycle::item_transition(item.status, ItemStatus::Active, identity.is_admin())?;

    let moved = state
        .db
        .items()
        .set_status(id, item.status, ItemStatus::Active)
        .await?;
    if !moved {
        return Err(ApiError::Conflict(
            "item was updated concurrently".to_string(),
        ));
    }

    state
        .db
        .items()
        .get_by_id(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Item", id).into())
}

/// Deletes an item. Owner or admin; sold items are undeletable for
/// non-admins.
pub async fn delete(state: &AppState, identity: &Identity, id: &str) -> ApiResult<()> {
    let item = state
        .db
        .items()
        .get_by_id(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Item", id))?;

    authorize::can_mutate_listing(identity, &item.seller_id)?;
    lifecycle::item_editable(item.status, identity.is_admin())?;

    state.db.items().delete(id).await?;

    info!(item_id = %id, "Item deleted");
    Ok(())
}

/// Purchases one unit of an active item.
///
/// In one database transaction: claim a unit (conditional decrement that
/// moves the item to `pending` when the last unit goes) and insert the
/// purchase transaction. The seller is notified afterwards.
pub async fn purchase(state: &AppState, identity: &Identity, id: &str) -> ApiResult<Transaction> {
    let item = state
        .db
        .items()
        .get_by_id(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Item", id))?;

    authorize::can_purchase_item(identity, &item)?;

    if item.status != ItemStatus::Active {
        return Err(
            CoreError::invalid_state("Item", item.status.as_str(), "purchase").into(),
        );
    }
    if item.quantity < 1 {
        return Err(ApiError::Conflict("item is out of stock".to_string()));
    }

    let now = Utc::now();
    let tx = Transaction {
        id: generate_id(),
        donor_id: identity.account_id.clone(),
        recipient_id: item.seller_id.clone(),
        kind: TransactionKind::Purchase,
        donation_id: None,
        item_id: Some(item.id.clone()),
        amount_cents: item.price_cents,
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

    let claimed = state
        .db
        .items()
        .claim_unit(&mut *dbtx, id, &identity.account_id)
        .await?;

    if !claimed {
        dbtx.rollback().await.map_err(DbError::from)?;
        return Err(classify_lost_claim(state, id).await?);
    }

    state.db.transactions().insert(&mut *dbtx, &tx).await?;
    dbtx.commit().await.map_err(DbError::from)?;

    info!(
        item_id = %id,
        buyer_id = %identity.account_id,
        transaction_id = %tx.id,
        "Item purchased"
    );

    // Purchase is committed; the notification text is best-effort from here
    let buyer_name = match state.db.accounts().get_by_id(&identity.account_id).await {
        Ok(Some(account)) => account.full_name(),
        _ => "Someone".to_string(),
    };

    let offer = if item.is_free {
        "for free".to_string()
    } else {
        format!("for {}", item.price())
    };

    notify::dispatch(
        state,
        notify::notification(
            &item.seller_id,
            NotificationKind::ItemSold,
            "Item Purchase Request",
            format!(
                "{} wants to purchase your item: {} {}",
                buyer_name, item.title, offer
            ),
            Some(json!({
                "item_id": item.id.clone(),
                "transaction_id": tx.id.clone(),
                "buyer_id": identity.account_id.clone(),
            })),
            NotificationPriority::High,
        ),
    )
    .await;

    Ok(tx)
}

/// Explains a lost purchase race.
async fn classify_lost_claim(state: &AppState, id: &str) -> ApiResult<ApiError> {
    let current = state.db.items().get_by_id(id).await?;

    Ok(match current {
        None => CoreError::not_found("Item", id).into(),
        Some(item) if item.status != ItemStatus::Active => {
            CoreError::invalid_state("Item", item.status.as_str(), "purchase").into()
        }
        Some(_) => ApiError::Conflict("item is out of stock".to_string()),
    })
}

/// Idempotent favorite toggle. Returns whether the item is favorited after
/// the call, plus the listing's favorite count.
pub async fn toggle_favorite(
    state: &AppState,
    identity: &Identity,
    id: &str,
) -> ApiResult<(bool, i64)> {
    if state.db.items().get_by_id(id).await?.is_none() {
        return Err(CoreError::not_found("Item", id).into());
    }

    let favorites = state.db.favorites();
    let favorited = favorites
        .toggle(ListingKind::Item, id, &identity.account_id)
        .await?;
    let count = favorites.count_for_listing(ListingKind::Item, id).await?;

    Ok((favorited, count))
}
