use mongodb::{Database, IndexModel, options::IndexOptions};
use tracing::info;

use crate::models::{
    Credential, Group, GroupMember, Integration, Member, Organization, Resource,
    ResourcePermission, User,
};

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    create_indexes(
        db,
        Organization::COLLECTION,
        vec![index_unique(bson::doc! { "slug": 1 })],
    )
    .await?;

    create_indexes(
        db,
        User::COLLECTION,
        vec![index_unique(bson::doc! { "email": 1 })],
    )
    .await?;

    // One membership row per (organization, user)
    create_indexes(
        db,
        Member::COLLECTION,
        vec![
            index_unique(bson::doc! { "organization_id": 1, "user_id": 1 }),
            index(bson::doc! { "user_id": 1 }),
        ],
    )
    .await?;

    create_indexes(
        db,
        Group::COLLECTION,
        vec![index_unique(bson::doc! { "organization_id": 1, "name": 1 })],
    )
    .await?;

    create_indexes(
        db,
        GroupMember::COLLECTION,
        vec![
            index_unique(bson::doc! { "group_id": 1, "user_id": 1 }),
            index(bson::doc! { "organization_id": 1, "user_id": 1 }),
        ],
    )
    .await?;

    create_indexes(
        db,
        ResourcePermission::COLLECTION,
        vec![index_unique(bson::doc! { "group_id": 1, "resource_id": 1 })],
    )
    .await?;

    create_indexes(
        db,
        Resource::COLLECTION,
        vec![
            index(bson::doc! { "organization_id": 1, "resource_id": 1, "status": 1 }),
            index(bson::doc! { "integration_id": 1, "kind": 1, "sync_generation": 1 }),
        ],
    )
    .await?;

    create_indexes(
        db,
        Integration::COLLECTION,
        vec![index(bson::doc! { "organization_id": 1, "name": 1 })],
    )
    .await?;

    // Upsert key for token material
    create_indexes(
        db,
        Credential::COLLECTION,
        vec![
            index_unique(bson::doc! { "user_id": 1, "integration_id": 1 }),
            index(bson::doc! { "integration_id": 1 }),
        ],
    )
    .await?;

    info!("All indexes ensured");
    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    db.collection::<bson::Document>(collection)
        .create_indexes(indexes)
        .await?;
    info!(collection, "Indexes created");
    Ok(())
}
