use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use url::Url;

#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct RpcConfig {
    pub url: Option<Url>,
    #[serde_as(as = "Option<DurationSeconds<u64>>")]
    pub timeout: Option<Duration>,
}
impl RpcConfig {
    fn example() -> RpcConfig {
        RpcConfig {
            url: Url::parse("http://127.0.0.1:8545").ok(),
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ElasticsearchConfig {
    pub url: Option<Url>,
    pub user: Option<String>,
    pub password: Option<String>,
    #[serde_as(as = "Option<DurationSeconds<u64>>")]
    pub timeout: Option<Duration>,
    pub block_index: Option<String>,
    pub tx_index: Option<String>,
    pub address_index: Option<String>,
}
impl ElasticsearchConfig {
    fn example() -> ElasticsearchConfig {
        ElasticsearchConfig {
            url: Url::parse("http://127.0.0.1:9200").ok(),
            user: Some("elastic".into()),
            password: Some("elastic password".into()),
            timeout: Some(Duration::from_secs(30)),
            block_index: Some("block".into()),
            tx_index: Some("tx".into()),
            address_index: Some("address".into()),
        }
    }
}

#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct SyncConfig {
    /// Idle time between two catch-up passes.
    #[serde_as(as = "Option<DurationSeconds<u64>>")]
    pub delay: Option<Duration>,
}
impl SyncConfig {
    fn example() -> SyncConfig {
        SyncConfig {
            delay: Some(Duration::from_secs(5)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ConfigFile {
    pub rpc: RpcConfig,
    pub elasticsearch: ElasticsearchConfig,
    pub sync: SyncConfig,
}

impl ConfigFile {
    pub fn example() -> ConfigFile {
        ConfigFile {
            rpc: RpcConfig::example(),
            elasticsearch: ElasticsearchConfig::example(),
            sync: SyncConfig::example(),
        }
    }
}
