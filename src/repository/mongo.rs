use bson::{doc, Bson};
use mongodb::options::{ClientOptions, Credential, IndexOptions, ResolverConfig};
use mongodb::{Client, Database, IndexModel};
use tracing::{info, instrument};

use crate::config::mongo_conf::MongoConfig;

pub const USERS_COLLECTION: &str = "users";
pub const PARCELS_COLLECTION: &str = "parcels";
pub const REVIEWS_COLLECTION: &str = "reviews";

/// Process-wide store handle: created once at startup and shared by every repository.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    database: Database,
}

impl MongoStore {
    #[instrument(skip(config), fields(database = %config.database))]
    pub async fn connect(config: &MongoConfig) -> Result<Self, mongodb::error::Error> {
        let mut client_options =
            ClientOptions::parse_with_resolver_config(&config.uri, ResolverConfig::cloudflare())
                .await?;
        client_options.app_name = Some("ParcelBackend".to_string());
        client_options.max_pool_size = Some(config.pool_size);
        client_options.connect_timeout =
            Some(std::time::Duration::from_secs(config.connection_timeout_secs));
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            client_options.credential = Some(
                Credential::builder()
                    .username(username.clone())
                    .password(password.clone())
                    .build(),
            );
        }

        let client = Client::with_options(client_options)?;
        let database = client.database(&config.database);
        database.run_command(doc! { "ping": 1 }, None).await?;
        info!("Connected to MongoDB");

        Ok(MongoStore { client, database })
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Creates the indexes every query path relies on. Safe to run on each start.
    pub async fn ensure_indexes(&self) -> Result<(), mongodb::error::Error> {
        let unique = IndexOptions::builder().unique(true).build();
        self.database
            .collection::<bson::Document>(USERS_COLLECTION)
            .create_index(
                IndexModel::builder().keys(doc! { "email": 1 }).options(unique).build(),
                None,
            )
            .await?;

        let parcels = self.database.collection::<bson::Document>(PARCELS_COLLECTION);
        parcels
            .create_index(IndexModel::builder().keys(doc! { "email": 1 }).build(), None)
            .await?;
        parcels
            .create_index(IndexModel::builder().keys(doc! { "assigned": 1 }).build(), None)
            .await?;

        self.database
            .collection::<bson::Document>(REVIEWS_COLLECTION)
            .create_index(IndexModel::builder().keys(doc! { "deliverMail": 1 }).build(), None)
            .await?;

        info!("MongoDB indexes ensured");
        Ok(())
    }

    /// Closes pooled connections; call once the HTTP server has drained.
    pub async fn shutdown(self) {
        info!("Shutting down MongoDB client");
        self.client.shutdown().await;
    }
}

/// Numeric aggregation outputs come back as Int32, Int64 or Double depending on size.
pub(crate) fn as_i64(value: Option<&Bson>) -> Option<i64> {
    match value? {
        Bson::Int32(v) => Some(i64::from(*v)),
        Bson::Int64(v) => Some(*v),
        Bson::Double(v) => Some(*v as i64),
        _ => None,
    }
}
