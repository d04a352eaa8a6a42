//! Well-known configuration keys and names shared by clients and nodes.

/// Flag: the node runs on a platform-managed host (Azure App Service).
pub const RUN_ON_AZURE_APP_SERVICE: &str = "RUN_ON_AZURE_APP_SERVICE";
/// Flag: the node runs under container orchestration (AWS ECS, awsvpc mode).
pub const RUN_ON_AWS_ECS: &str = "RUN_ON_AWS_ECS";
/// Private IP assigned by the managed host.
pub const WEBSITE_PRIVATE_IP: &str = "WEBSITE_PRIVATE_IP";
/// Comma-separated private ports assigned by the managed host.
pub const WEBSITE_PRIVATE_PORTS: &str = "WEBSITE_PRIVATE_PORTS";
/// Managed table store connection string.
pub const AZURE_STORAGE_CONNECTION_STRING: &str = "AZURE_STORAGE_CONNECTION_STRING";
/// Document store connection string.
pub const MONGO_CONNECTION_STRING: &str = "MONGO_CONNECTION_STRING";

/// Cluster id shared by every node and client of the demo cluster.
pub const CLUSTER_ID: &str = "hello-orleans-cluster";
/// Service id shared by every node and client of the demo cluster.
pub const SERVICE_ID: &str = "hello-orleans-service";
/// Name nodes register under.
pub const NODE_NAME: &str = "hello-orleans-silo";
/// Name of the grain storage provider.
pub const STORAGE_NAME: &str = "HelloOrleansGrainStore";

/// Document store database holding the membership document.
pub const MONGO_CLUSTERING_DATABASE: &str = "HelloOrleansSiloClusteringDb";
/// Document store database holding grain state.
pub const MONGO_GRAIN_STORAGE_DATABASE: &str = "HelloOrleansSiloGrainStorageDb";

/// Table holding membership rows in the managed table store.
pub const TABLE_CLUSTERING_TABLE: &str = "OrleansSiloInstances";
/// Table holding grain state in the managed table store.
pub const TABLE_GRAIN_STATE_TABLE: &str = "OrleansGrainState";

/// Default node-to-node port.
pub const DEFAULT_PEER_PORT: u16 = 11111;
/// Default client-to-node gateway port.
pub const DEFAULT_GATEWAY_PORT: u16 = 30000;
