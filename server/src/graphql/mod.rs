mod roster;

use std::sync::Arc;

use async_graphql::{EmptySubscription, Object, Schema, SimpleObject};
use platform_api::ApiResult;
use platform_db::DynStore;
use products_hr::Roster;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::instrument;

pub use self::roster::{RosterMutation, RosterQuery};

/// The single roster session every intent is serialized through.
pub type SharedRoster = Arc<Mutex<Roster<DynStore>>>;

pub type SchemaType = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(roster: SharedRoster) -> SchemaType {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(roster)
        .finish()
}

pub fn schema_sdl() -> String {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .finish()
        .sdl()
}

#[derive(Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    #[instrument(name = "graphql.health", skip_all)]
    async fn health(&self) -> ApiResult<HealthPayload> {
        Ok(HealthPayload { ok: true })
    }

    #[instrument(name = "graphql.version", skip_all)]
    async fn version(&self) -> ApiResult<String> {
        Ok(env!("CARGO_PKG_VERSION").to_string())
    }

    async fn roster(&self) -> RosterQuery {
        RosterQuery
    }
}

#[derive(Default)]
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn roster(&self) -> RosterMutation {
        RosterMutation
    }
}

#[derive(Clone, Debug, SimpleObject, Serialize)]
pub struct HealthPayload {
    pub ok: bool,
}
