//! Hero Repository
//!
//! Create, list, retrieve, soft-delete and update heroes in the `heroes`
//! collection. Every function takes the executor it runs against.

use heroes_core::domain::hero::{Hero, Metadata, dedup_superpowers, timestamp};
use heroes_core::dto::hero::{CreateHero, Filters, UpdateHero};
use heroes_core::dto::paging::{ListResults, Paging};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{HeroError, Result, StoreError};
use crate::executor::DatabaseExecutor;
use crate::query::{
    Document, Filter, FindOptions, REMOVED_FIELD, SortKey, Update, from_document, to_document,
};

pub const HERO_COLLECTION: &str = "heroes";

/// Sort applied when the caller asks for none
const DEFAULT_SORT: &str = "created";

/// Create a new hero
pub async fn create<E: DatabaseExecutor>(db: &E, req: CreateHero) -> Result<Hero> {
    let now = timestamp::now();

    let hero = Hero {
        id: Uuid::new_v4(),
        name: req.name,
        superpowers: dedup_superpowers(req.superpowers),
        gender: req.gender,
        metadata: Metadata::created_at(now),
        is_removed: false,
    };

    let doc = to_document(&hero)
        .map_err(|e| HeroError::persistence(format!("encoding hero {}", hero.id), e))?;
    let context = format!("db.{HERO_COLLECTION}.insert({})", Value::Object(doc.clone()));

    db.execute(HERO_COLLECTION, move |coll| {
        Box::pin(async move { coll.insert_one(doc).await })
    })
    .await
    .map_err(|e| HeroError::persistence(context, e))?;

    tracing::info!("Hero created: {} ({})", hero.name, hero.id);

    Ok(hero)
}

/// List heroes matching `filters`, one page at a time
pub async fn list<E: DatabaseExecutor>(
    db: &E,
    filters: Filters,
    paging: Paging,
) -> Result<ListResults> {
    if paging.size == 0 {
        return Err(HeroError::InvalidArgument(
            "page size must be greater than zero".to_string(),
        ));
    }

    let sort = sort_keys(&paging.sort)?;
    let query = list_query(&filters);

    tracing::debug!("Listing heroes: query={} index={} size={}", query, paging.index, paging.size);

    let count_query = query.clone();
    let total = db
        .execute(HERO_COLLECTION, move |coll| {
            Box::pin(async move { coll.count(&count_query).await })
        })
        .await
        .map_err(|e| HeroError::persistence(format!("db.{HERO_COLLECTION}.count({query})"), e))?;

    let mut heroes = Vec::new();
    if total > 0 {
        let options = FindOptions {
            sort,
            skip: paging.skip(),
            limit: Some(paging.size),
        };
        let find_query = query.clone();

        let docs = db
            .execute(HERO_COLLECTION, move |coll| {
                Box::pin(async move { coll.find(&find_query, &options).await })
            })
            .await
            .map_err(|e| HeroError::persistence(format!("db.{HERO_COLLECTION}.find({query})"), e))?;

        heroes = docs
            .into_iter()
            .map(from_document::<Hero>)
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| HeroError::persistence(format!("decoding {HERO_COLLECTION}"), e))?;
    }

    Ok(ListResults::from_page(heroes, total, &paging))
}

/// Find an active hero by ID
pub async fn retrieve<E: DatabaseExecutor>(db: &E, id: &str) -> Result<Hero> {
    let id = parse_id(id)?;
    let query = Filter::id(id).and(Filter::active());

    tracing::debug!("Retrieving hero: {}", id);

    let lookup = query.clone();
    let doc = db
        .execute(HERO_COLLECTION, move |coll| {
            Box::pin(async move { coll.find_one(&lookup).await })
        })
        .await
        .map_err(|e| match e {
            StoreError::NotFound => HeroError::NotFound(id),
            e => HeroError::persistence(format!("db.{HERO_COLLECTION}.find({query})"), e),
        })?
        .ok_or(HeroError::NotFound(id))?;

    from_document(doc).map_err(|e| HeroError::persistence(format!("decoding hero {id}"), e))
}

/// Soft-delete a hero
///
/// The document stays in the collection with `isRemoved` set. Deleting an
/// already removed hero succeeds.
pub async fn delete<E: DatabaseExecutor>(db: &E, id: &str) -> Result<()> {
    let id = parse_id(id)?;

    let mut fields = Document::new();
    fields.insert(REMOVED_FIELD.to_string(), Value::Bool(true));
    fields.insert(
        "lastModified".to_string(),
        Value::String(timestamp::format(&timestamp::now())),
    );
    let update = Update::set(fields);

    let rendered = update.to_string();
    db.execute(HERO_COLLECTION, move |coll| {
        Box::pin(async move { coll.update_by_id(id, &update).await })
    })
    .await
    .map_err(|e| match e {
        StoreError::NotFound => HeroError::NotFound(id),
        e => HeroError::persistence(format!("db.{HERO_COLLECTION}.update({rendered})"), e),
    })?;

    tracing::info!("Hero deleted: {}", id);

    Ok(())
}

/// Apply a partial update to a hero
///
/// A missing hero is reported as a persistence failure, not as `NotFound`.
pub async fn update<E: DatabaseExecutor>(db: &E, mut req: UpdateHero, id: &str) -> Result<()> {
    let id = parse_id(id)?;

    req.last_modified = Some(timestamp::now());
    req.superpowers = req.superpowers.map(dedup_superpowers);

    let context = format!("updating hero {id}");
    let update = to_document(&req)
        .map(Update::set)
        .map_err(|e| HeroError::persistence(context.clone(), e))?;

    db.execute(HERO_COLLECTION, move |coll| {
        Box::pin(async move { coll.update_by_id(id, &update).await })
    })
    .await
    .map_err(|e| HeroError::persistence(context, e))?;

    tracing::info!("Hero updated: {}", id);

    Ok(())
}

// =============================================================================
// Query Building
// =============================================================================

/// List matches on the caller's filters only; removed heroes still count
fn list_query(filters: &Filters) -> Filter {
    if filters.superpowers.is_empty() {
        return Filter::All;
    }

    Filter::any_of("superpowers", filters.superpowers.clone())
}

fn sort_keys(sort: &[String]) -> Result<Vec<SortKey>> {
    if sort.is_empty() {
        return Ok(vec![SortKey::ascending(DEFAULT_SORT)]);
    }

    sort.iter()
        .map(|key| {
            key.parse::<SortKey>()
                .map_err(|e| HeroError::InvalidArgument(e.to_string()))
        })
        .collect()
}

fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id)
        .map_err(|_| HeroError::InvalidArgument(format!("ID is not in its proper form: {id:?}")))
}
